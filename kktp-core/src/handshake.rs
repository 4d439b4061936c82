//! Handshake verification and session key derivation (§4.5).
//!
//! Three checks gate acceptance of a response anchor: the echoed
//! initiator keys must match the discovery anchor byte-for-byte, the
//! responder's signature must verify, and — if either party attached VRF
//! output — the VRF proof must verify against that party's own `pub_sig`
//! (reused as the VRF public key, since no anchor carries a dedicated VRF
//! key field) and that anchor's own input binding. Once a response is
//! accepted, both sides derive the same shared session key from an ECDH
//! shared secret.

use crate::anchors::{Discovery, Response};
use crate::error::KktpError;

/// Keying material for one session: the shared AEAD key plus the mailbox
/// ID both parties compute independently.
pub struct SessionKeys {
    pub mailbox_id: [u8; 32],
    pub session_key: crypto_aead::Key,
}

/// The VRF input a discovery anchor's own proof is checked against: binds
/// the proof to the prover's signing key, DH key, and the session, so it
/// cannot be replayed under a different identity or session.
#[must_use]
pub fn vrf_input_discovery(
    pub_sig: &crypto_sig::VerificationKey,
    pub_dh: &crypto_dh::DhPublicKey,
    sid: &[u8; 32],
) -> [u8; 32] {
    crypto_hash::hash_concat(&[pub_sig.as_bytes(), pub_dh.as_bytes(), sid])
}

/// The VRF input a response anchor's own proof is checked against: binds
/// the proof to both parties' keys from the discovery/response pair, so a
/// response proof cannot be replayed against a different discovery.
#[must_use]
pub fn vrf_input_response(
    discovery_pub_sig: &crypto_sig::VerificationKey,
    discovery_pub_dh: &crypto_dh::DhPublicKey,
    responder_pub_sig: &crypto_sig::VerificationKey,
    responder_pub_dh: &crypto_dh::DhPublicKey,
    sid: &[u8; 32],
) -> [u8; 32] {
    crypto_hash::hash_concat(&[
        discovery_pub_sig.as_bytes(),
        discovery_pub_dh.as_bytes(),
        responder_pub_sig.as_bytes(),
        responder_pub_dh.as_bytes(),
        sid,
    ])
}

fn decode_pub_sig(hex: &str) -> Result<crypto_sig::VerificationKey, KktpError> {
    let bytes: [u8; crypto_sig::VERIFICATION_KEY_SIZE] = hexutil::decode_array(hex)?;
    crypto_sig::VerificationKey::from_bytes(bytes).map_err(|_| KktpError::SchemaInvalid(
        "pub_sig is not a valid secp256k1 point".into(),
    ))
}

fn decode_pub_dh(hex: &str) -> Result<crypto_dh::DhPublicKey, KktpError> {
    let bytes: [u8; crypto_dh::PUBLIC_KEY_SIZE] = hexutil::decode_array(hex)?;
    crypto_dh::DhPublicKey::from_bytes(bytes).map_err(|_| KktpError::SchemaInvalid(
        "pub_dh is not a valid secp256k1 point".into(),
    ))
}

fn decode_sig(hex: &str) -> Result<crypto_sig::Signature, KktpError> {
    let bytes: [u8; crypto_sig::SIGNATURE_SIZE] = hexutil::decode_array(hex)?;
    crypto_sig::Signature::from_bytes(bytes)
        .map_err(|_| KktpError::SchemaInvalid("sig is not well-formed".into()))
}

fn verify_optional_vrf(
    pub_sig: &crypto_sig::VerificationKey,
    input: &[u8; 32],
    vrf_value: &Option<String>,
    vrf_proof: &Option<String>,
) -> Result<(), KktpError> {
    let (value_hex, proof_hex) = match (vrf_value, vrf_proof) {
        (Some(v), Some(p)) => (v, p),
        (None, None) => return Ok(()),
        _ => return Err(KktpError::VrfPairInconsistent),
    };
    let value: [u8; crypto_vrf::VALUE_SIZE] = hexutil::decode_array(value_hex)?;
    let proof: [u8; crypto_vrf::PROOF_SIZE] = hexutil::decode_array(proof_hex)?;
    if crypto_vrf::verify(pub_sig, &value, &proof, input) {
        Ok(())
    } else {
        Err(KktpError::VrfMismatch)
    }
}

/// Verifies a discovery anchor's signature and, if present, its VRF proof.
/// Does not check `validate()` — callers are expected to have already run
/// schema validation on anchors parsed from the carrier.
pub fn verify_discovery(discovery: &Discovery) -> Result<(), KktpError> {
    let pub_sig = decode_pub_sig(&discovery.pub_sig)?;
    let pub_dh = decode_pub_dh(&discovery.pub_dh)?;
    let sig = decode_sig(&discovery.sig)?;
    let preimage = discovery.signing_preimage()?;
    if !crypto_sig::verify(&pub_sig, &preimage, &sig) {
        return Err(KktpError::SignatureInvalid);
    }
    let sid: [u8; 32] = hexutil::decode_array(&discovery.sid)?;
    let input = vrf_input_discovery(&pub_sig, &pub_dh, &sid);
    verify_optional_vrf(&pub_sig, &input, &discovery.vrf_value, &discovery.vrf_proof)
}

/// Verifies a response anchor against the discovery it answers: key echo,
/// signature, and optional VRF proof.
pub fn verify_response(response: &Response, discovery: &Discovery) -> Result<(), KktpError> {
    if response.initiator_pub_sig != discovery.pub_sig
        || response.initiator_pub_dh != discovery.pub_dh
    {
        return Err(KktpError::KeyEchoMismatch);
    }
    if response.sid != discovery.sid {
        return Err(KktpError::SchemaInvalid(
            "response sid does not match discovery sid".into(),
        ));
    }

    let pub_sig_resp = decode_pub_sig(&response.pub_sig_resp)?;
    let pub_dh_resp = decode_pub_dh(&response.pub_dh_resp)?;
    let sig_resp = decode_sig(&response.sig_resp)?;
    let preimage = response.signing_preimage()?;
    if !crypto_sig::verify(&pub_sig_resp, &preimage, &sig_resp) {
        return Err(KktpError::SignatureInvalid);
    }

    let discovery_pub_sig = decode_pub_sig(&discovery.pub_sig)?;
    let discovery_pub_dh = decode_pub_dh(&discovery.pub_dh)?;
    let sid: [u8; 32] = hexutil::decode_array(&response.sid)?;
    let input = vrf_input_response(
        &discovery_pub_sig,
        &discovery_pub_dh,
        &pub_sig_resp,
        &pub_dh_resp,
        &sid,
    );
    verify_optional_vrf(&pub_sig_resp, &input, &response.vrf_value, &response.vrf_proof)
}

/// Derives the mailbox ID both parties agree on: a hash of both parties'
/// signing keys and the SID, in a fixed (initiator, responder, sid) order
/// so both sides compute the same value regardless of which side they
/// played.
#[must_use]
pub fn derive_mailbox_id(
    sid: &[u8; 32],
    initiator_pub_sig: &crypto_sig::VerificationKey,
    responder_pub_sig: &crypto_sig::VerificationKey,
) -> [u8; 32] {
    crypto_hash::hash_concat(&[initiator_pub_sig.as_bytes(), responder_pub_sig.as_bytes(), sid])
}

/// Derives the single shared AEAD session key from an ECDH shared secret:
/// `HKDF(salt=sid, ikm=Z, info=pub_sig_A || pub_sig_B)`. Both the initiator
/// and the responder call this with their own DH secret and the other
/// party's DH public key; the shared secret, and hence the derived key,
/// comes out identical on both sides.
#[must_use]
pub fn derive_session_keys(
    my_dh_secret: &crypto_dh::DhSecretKey,
    peer_dh_public: &crypto_dh::DhPublicKey,
    sid: &[u8; 32],
    initiator_pub_sig: &crypto_sig::VerificationKey,
    responder_pub_sig: &crypto_sig::VerificationKey,
) -> SessionKeys {
    let shared_secret = crypto_dh::diffie_hellman(my_dh_secret, peer_dh_public);
    let info = [initiator_pub_sig.as_bytes().as_slice(), responder_pub_sig.as_bytes().as_slice()].concat();

    let mut key_bytes = [0u8; crypto_aead::KEY_SIZE];
    crypto_kdf::derive(sid, shared_secret.as_ref(), &info, &mut key_bytes);

    SessionKeys {
        mailbox_id: derive_mailbox_id(sid, initiator_pub_sig, responder_pub_sig),
        session_key: crypto_aead::Key::from(key_bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::{Discovery, PROTOCOL_VERSION};

    fn make_discovery(sign_sk: &crypto_sig::SigningKey, pub_sig: &crypto_sig::VerificationKey, pub_dh: &crypto_dh::DhPublicKey, sid: &[u8; 32]) -> Discovery {
        let mut d = Discovery {
            kind: "discovery".into(),
            version: PROTOCOL_VERSION,
            sid: hexutil::encode(sid),
            pub_sig: hexutil::encode(pub_sig.as_bytes()),
            pub_dh: hexutil::encode(pub_dh.as_bytes()),
            vrf_value: None,
            vrf_proof: None,
            meta: None,
            sig: hexutil::encode(&[0u8; 64]),
        };
        let preimage = d.signing_preimage().unwrap();
        let sig = crypto_sig::sign(sign_sk, &preimage);
        d.sig = hexutil::encode(sig.as_bytes());
        d
    }

    #[test]
    fn test_verify_discovery_accepts_valid_signature() {
        let (sign_sk, pub_sig) = crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let (_, pub_dh) = crypto_dh::generate_key_pair([2u8; 32]).unwrap();
        let sid = [3u8; 32];
        let d = make_discovery(&sign_sk, &pub_sig, &pub_dh, &sid);
        assert!(verify_discovery(&d).is_ok());
    }

    #[test]
    fn test_verify_discovery_rejects_tampered_signature() {
        let (sign_sk, pub_sig) = crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let (_, pub_dh) = crypto_dh::generate_key_pair([2u8; 32]).unwrap();
        let sid = [3u8; 32];
        let mut d = make_discovery(&sign_sk, &pub_sig, &pub_dh, &sid);
        d.version = PROTOCOL_VERSION + 1;
        assert!(matches!(
            verify_discovery(&d),
            Err(KktpError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_derive_session_keys_symmetric() {
        let (dh_sk_a, dh_pub_a) = crypto_dh::generate_key_pair([10u8; 32]).unwrap();
        let (dh_sk_b, dh_pub_b) = crypto_dh::generate_key_pair([20u8; 32]).unwrap();
        let (_, pub_sig_a) = crypto_sig::generate_key_pair([11u8; 32]).unwrap();
        let (_, pub_sig_b) = crypto_sig::generate_key_pair([21u8; 32]).unwrap();
        let sid = [5u8; 32];

        let keys_a = derive_session_keys(&dh_sk_a, &dh_pub_b, &sid, &pub_sig_a, &pub_sig_b);
        let keys_b = derive_session_keys(&dh_sk_b, &dh_pub_a, &sid, &pub_sig_a, &pub_sig_b);

        assert_eq!(keys_a.mailbox_id, keys_b.mailbox_id);
        assert_eq!(keys_a.session_key.as_bytes(), keys_b.session_key.as_bytes());
    }

    #[test]
    fn test_derive_mailbox_id_order_matches_spec() {
        let (_, pub_sig_a) = crypto_sig::generate_key_pair([11u8; 32]).unwrap();
        let (_, pub_sig_b) = crypto_sig::generate_key_pair([21u8; 32]).unwrap();
        let sid = [5u8; 32];
        let expected = crypto_hash::hash_concat(&[pub_sig_a.as_bytes(), pub_sig_b.as_bytes(), &sid]);
        assert_eq!(derive_mailbox_id(&sid, &pub_sig_a, &pub_sig_b), expected);
    }

    #[test]
    fn test_verify_response_key_echo_mismatch() {
        use crate::anchors::Response;
        let (sign_sk, pub_sig) = crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let (_, pub_dh) = crypto_dh::generate_key_pair([2u8; 32]).unwrap();
        let sid = [3u8; 32];
        let discovery = make_discovery(&sign_sk, &pub_sig, &pub_dh, &sid);

        let (resp_sk, resp_pub_sig) = crypto_sig::generate_key_pair([30u8; 32]).unwrap();
        let (_, resp_pub_dh) = crypto_dh::generate_key_pair([31u8; 32]).unwrap();
        let mut wrong_initiator_sig = [0u8; 33];
        wrong_initiator_sig[0] = 0x02;
        let mut response = Response {
            kind: "response".into(),
            version: PROTOCOL_VERSION,
            sid: hexutil::encode(&sid),
            initiator_pub_sig: hexutil::encode(&wrong_initiator_sig),
            initiator_pub_dh: discovery.pub_dh.clone(),
            pub_sig_resp: hexutil::encode(resp_pub_sig.as_bytes()),
            pub_dh_resp: hexutil::encode(resp_pub_dh.as_bytes()),
            vrf_value: None,
            vrf_proof: None,
            sig_resp: hexutil::encode(&[0u8; 64]),
        };
        let preimage = response.signing_preimage().unwrap();
        let sig = crypto_sig::sign(&resp_sk, &preimage);
        response.sig_resp = hexutil::encode(sig.as_bytes());

        assert!(matches!(
            verify_response(&response, &discovery),
            Err(KktpError::KeyEchoMismatch)
        ));
    }

    #[test]
    fn test_discovery_vrf_proof_verifies_against_own_binding() {
        let (sign_sk, pub_sig) = crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let (_, pub_dh) = crypto_dh::generate_key_pair([2u8; 32]).unwrap();
        let sid = [3u8; 32];

        let input = vrf_input_discovery(&pub_sig, &pub_dh, &sid);
        let output = crypto_vrf::prove(&sign_sk, &input);

        let mut d = make_discovery(&sign_sk, &pub_sig, &pub_dh, &sid);
        d.vrf_value = Some(hexutil::encode(&output.value));
        d.vrf_proof = Some(hexutil::encode(&output.proof));
        let preimage = d.signing_preimage().unwrap();
        d.sig = hexutil::encode(crypto_sig::sign(&sign_sk, &preimage).as_bytes());

        assert!(verify_discovery(&d).is_ok());
    }

    #[test]
    fn test_discovery_vrf_proof_rejected_under_response_binding() {
        let (sign_sk, pub_sig) = crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let (_, pub_dh) = crypto_dh::generate_key_pair([2u8; 32]).unwrap();
        let sid = [3u8; 32];

        // Proves against the 5-part response binding instead of the 3-part
        // discovery binding; a discovery carrying this proof must not verify.
        let wrong_input = vrf_input_response(&pub_sig, &pub_dh, &pub_sig, &pub_dh, &sid);
        let output = crypto_vrf::prove(&sign_sk, &wrong_input);

        let mut d = make_discovery(&sign_sk, &pub_sig, &pub_dh, &sid);
        d.vrf_value = Some(hexutil::encode(&output.value));
        d.vrf_proof = Some(hexutil::encode(&output.proof));
        let preimage = d.signing_preimage().unwrap();
        d.sig = hexutil::encode(crypto_sig::sign(&sign_sk, &preimage).as_bytes());

        assert!(matches!(verify_discovery(&d), Err(KktpError::VrfMismatch)));
    }
}
