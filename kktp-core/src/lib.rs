//! # kktp-core
//!
//! The anchor types, schema validation, handshake verification, message
//! codec, session state machine, and encrypted persistence that make up
//! the pairwise half of KKTP. Group overlays build on top of this crate
//! in `kktp-lobby`; sovereign resume builds on top of it in
//! `kktp-handover`.

pub mod aad;
pub mod anchors;
pub mod codec;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod handshake;
pub mod persistence;
pub mod session;
pub mod vault;
pub mod wire;

pub use error::KktpError;

#[cfg(test)]
mod end_to_end {
    use crate::anchors::{Discovery, PROTOCOL_VERSION, Response};
    use crate::codec;
    use crate::error::UnpackOutcome;
    use crate::handshake;
    use crate::session::{Role, SessionContext, SessionKeyMaterial};

    /// Exercises a full discovery/response handshake plus one message
    /// exchange in each direction between two independently-keyed
    /// parties, the way a real carrier-DAG round trip would look.
    #[test]
    fn test_full_handshake_and_message_exchange() {
        let (initiator_sig_sk, initiator_pub_sig) =
            crypto_sig::generate_key_pair([1u8; 32]).unwrap();
        let (initiator_dh_sk, initiator_pub_dh) = crypto_dh::generate_key_pair([2u8; 32]).unwrap();
        let (responder_sig_sk, responder_pub_sig) =
            crypto_sig::generate_key_pair([3u8; 32]).unwrap();
        let (responder_dh_sk, responder_pub_dh) = crypto_dh::generate_key_pair([4u8; 32]).unwrap();

        let sid = crate::anchors::generate_sid(None);

        let mut discovery = Discovery {
            kind: "discovery".into(),
            version: PROTOCOL_VERSION,
            sid: hexutil::encode(&sid),
            pub_sig: hexutil::encode(initiator_pub_sig.as_bytes()),
            pub_dh: hexutil::encode(initiator_pub_dh.as_bytes()),
            vrf_value: None,
            vrf_proof: None,
            meta: None,
            sig: hexutil::encode(&[0u8; 64]),
        };
        let preimage = discovery.signing_preimage().unwrap();
        let sig = crypto_sig::sign(&initiator_sig_sk, &preimage);
        discovery.sig = hexutil::encode(sig.as_bytes());

        discovery.validate().unwrap();
        handshake::verify_discovery(&discovery).unwrap();

        let mut response = Response {
            kind: "response".into(),
            version: PROTOCOL_VERSION,
            sid: discovery.sid.clone(),
            initiator_pub_sig: discovery.pub_sig.clone(),
            initiator_pub_dh: discovery.pub_dh.clone(),
            pub_sig_resp: hexutil::encode(responder_pub_sig.as_bytes()),
            pub_dh_resp: hexutil::encode(responder_pub_dh.as_bytes()),
            vrf_value: None,
            vrf_proof: None,
            sig_resp: hexutil::encode(&[0u8; 64]),
        };
        let preimage = response.signing_preimage().unwrap();
        let sig = crypto_sig::sign(&responder_sig_sk, &preimage);
        response.sig_resp = hexutil::encode(sig.as_bytes());

        response.validate().unwrap();
        handshake::verify_response(&response, &discovery).unwrap();

        let initiator_keys = handshake::derive_session_keys(
            &initiator_dh_sk,
            &responder_pub_dh,
            &sid,
            &initiator_pub_sig,
            &responder_pub_sig,
        );
        let responder_keys = handshake::derive_session_keys(
            &responder_dh_sk,
            &initiator_pub_dh,
            &sid,
            &initiator_pub_sig,
            &responder_pub_sig,
        );
        assert_eq!(initiator_keys.mailbox_id, responder_keys.mailbox_id);

        let mut initiator_ctx = SessionContext::new(
            sid,
            Role::Initiator,
            initiator_keys.mailbox_id,
            responder_pub_sig.clone(),
            responder_pub_dh.clone(),
            0,
            0,
            SessionKeyMaterial {
                session_key_bytes: *initiator_keys.session_key.as_bytes(),
            },
            0,
        );
        let mut responder_ctx = SessionContext::new(
            sid,
            Role::Responder,
            responder_keys.mailbox_id,
            initiator_pub_sig.clone(),
            initiator_pub_dh.clone(),
            0,
            0,
            SessionKeyMaterial {
                session_key_bytes: *responder_keys.session_key.as_bytes(),
            },
            0,
        );
        initiator_ctx.activate();
        responder_ctx.activate();

        let seq = initiator_ctx.next_outgoing_seq();
        let msg = codec::pack(
            &sid,
            &initiator_ctx.mailbox_id,
            &initiator_ctx.send_key(),
            initiator_ctx.send_direction(),
            seq,
            b"hello from initiator",
        );

        match responder_ctx.receive(&msg).unwrap() {
            UnpackOutcome::Delivered(p) => assert_eq!(p, b"hello from initiator"),
            other => panic!("expected Delivered, got {other:?}"),
        }

        let reply_seq = responder_ctx.next_outgoing_seq();
        let reply = codec::pack(
            &sid,
            &responder_ctx.mailbox_id,
            &responder_ctx.send_key(),
            responder_ctx.send_direction(),
            reply_seq,
            b"hello back",
        );

        match initiator_ctx.receive(&reply).unwrap() {
            UnpackOutcome::Delivered(p) => assert_eq!(p, b"hello back"),
            other => panic!("expected Delivered, got {other:?}"),
        }
    }
}
