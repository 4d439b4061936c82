//! Anchor types: the canonical-JSON protocol objects posted to the carrier
//! DAG (§3 of the spec). Each variant is a tagged struct validated at parse
//! time, per the REDESIGN FLAGS guidance, rather than a single dynamically
//! validated document: reaching for the wrong field on the wrong anchor
//! type is a compile error here, not a runtime schema failure.

use crate::error::KktpError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current protocol version carried on every anchor and message.
pub const PROTOCOL_VERSION: u32 = 1;

const SID_SIZE: usize = 32;
const PUBKEY_SIZE: usize = 33;
const SIG_SIZE: usize = crypto_sig::SIGNATURE_SIZE;
const VRF_VALUE_SIZE: usize = crypto_vrf::VALUE_SIZE;
const VRF_PROOF_SIZE: usize = crypto_vrf::PROOF_SIZE;
const MAILBOX_SIZE: usize = 32;
const NONCE_SIZE: usize = 24;

/// Direction of a message within one session: the initiator always sends
/// `AtoB` and receives `BtoA`; the responder is the mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    AtoB,
    BtoA,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::AtoB => Self::BtoA,
            Self::BtoA => Self::AtoB,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtoB => write!(f, "AtoB"),
            Self::BtoA => write!(f, "BtoA"),
        }
    }
}

fn check_hex(field: &str, value: &str, byte_len: usize) -> Result<(), KktpError> {
    if !hexutil::is_lowercase_hex_of_len(value, byte_len) {
        return Err(KktpError::SchemaInvalid(format!(
            "field `{field}` must be {byte_len}-byte lowercase hex (got `{value}`)"
        )));
    }
    Ok(())
}

fn check_vrf_pair(value: &Option<String>, proof: &Option<String>) -> Result<(), KktpError> {
    match (value, proof) {
        (Some(v), Some(p)) => {
            check_hex("vrf_value", v, VRF_VALUE_SIZE)?;
            check_hex("vrf_proof", p, VRF_PROOF_SIZE)?;
            Ok(())
        }
        (None, None) => Ok(()),
        _ => Err(KktpError::VrfPairInconsistent),
    }
}

/// Discovery anchor: published first by the initiator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Discovery {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub sid: String,
    pub pub_sig: String,
    pub pub_dh: String,
    pub vrf_value: Option<String>,
    pub vrf_proof: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    pub sig: String,
}

impl Discovery {
    pub fn validate(&self) -> Result<(), KktpError> {
        if self.kind != "discovery" {
            return Err(KktpError::SchemaInvalid("type must be \"discovery\"".into()));
        }
        check_hex("sid", &self.sid, SID_SIZE)?;
        check_hex("pub_sig", &self.pub_sig, PUBKEY_SIZE)?;
        check_hex("pub_dh", &self.pub_dh, PUBKEY_SIZE)?;
        check_hex("sig", &self.sig, SIG_SIZE)?;
        check_vrf_pair(&self.vrf_value, &self.vrf_proof)?;
        if let Some(meta) = &self.meta {
            if !meta.is_object() {
                return Err(KktpError::SchemaInvalid("meta must be an object".into()));
            }
        }
        Ok(())
    }

    /// Canonical pre-image this anchor's `sig` is computed over: every field
    /// except `sig` itself, and excluding `meta` (discovery's one
    /// application-opaque field, excluded from the signature pre-image).
    pub fn signing_preimage(&self) -> Result<Vec<u8>, KktpError> {
        canonical_preimage(self, &["sig"], true)
    }
}

/// Response anchor: published by the responder once a valid discovery is
/// observed. Echoes the initiator's keys verbatim for the handshake
/// engine's key-echo check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Response {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub sid: String,
    pub initiator_pub_sig: String,
    pub initiator_pub_dh: String,
    pub pub_sig_resp: String,
    pub pub_dh_resp: String,
    pub vrf_value: Option<String>,
    pub vrf_proof: Option<String>,
    pub sig_resp: String,
}

impl Response {
    pub fn validate(&self) -> Result<(), KktpError> {
        if self.kind != "response" {
            return Err(KktpError::SchemaInvalid("type must be \"response\"".into()));
        }
        check_hex("sid", &self.sid, SID_SIZE)?;
        check_hex("initiator_pub_sig", &self.initiator_pub_sig, PUBKEY_SIZE)?;
        check_hex("initiator_pub_dh", &self.initiator_pub_dh, PUBKEY_SIZE)?;
        check_hex("pub_sig_resp", &self.pub_sig_resp, PUBKEY_SIZE)?;
        check_hex("pub_dh_resp", &self.pub_dh_resp, PUBKEY_SIZE)?;
        check_hex("sig_resp", &self.sig_resp, SIG_SIZE)?;
        check_vrf_pair(&self.vrf_value, &self.vrf_proof)?;
        Ok(())
    }

    /// Canonical pre-image `sig_resp` is computed over: every field except
    /// `sig_resp`. Response carries no `meta`, so nothing else is excluded.
    pub fn signing_preimage(&self) -> Result<Vec<u8>, KktpError> {
        canonical_preimage(self, &["sig_resp"], false)
    }
}

/// Session-end anchor: published by either party to gracefully close a
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionEnd {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub sid: String,
    pub pub_sig: String,
    pub reason: String,
    pub sig: String,
}

impl SessionEnd {
    pub fn validate(&self) -> Result<(), KktpError> {
        if self.kind != "session_end" {
            return Err(KktpError::SchemaInvalid(
                "type must be \"session_end\"".into(),
            ));
        }
        check_hex("sid", &self.sid, SID_SIZE)?;
        check_hex("pub_sig", &self.pub_sig, PUBKEY_SIZE)?;
        check_hex("sig", &self.sig, SIG_SIZE)?;
        Ok(())
    }

    pub fn signing_preimage(&self) -> Result<Vec<u8>, KktpError> {
        canonical_preimage(self, &["sig"], false)
    }
}

/// Message anchor carrying an AEAD-encrypted frame. Not itself signed: its
/// integrity comes from the AEAD tag verified by the message codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Msg {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub sid: String,
    pub mailbox_id: String,
    pub direction: Direction,
    pub seq: u64,
    pub nonce: String,
    pub ciphertext: String,
}

impl Msg {
    pub fn validate(&self) -> Result<(), KktpError> {
        if self.kind != "msg" {
            return Err(KktpError::SchemaInvalid("type must be \"msg\"".into()));
        }
        check_hex("sid", &self.sid, SID_SIZE)?;
        check_hex("mailbox_id", &self.mailbox_id, MAILBOX_SIZE)?;
        check_hex("nonce", &self.nonce, NONCE_SIZE)?;
        if !hexutil::is_lowercase_hex_of_len(&self.ciphertext, self.ciphertext.len() / 2)
            || self.ciphertext.len() % 2 != 0
        {
            return Err(KktpError::SchemaInvalid(
                "ciphertext must be lowercase hex".into(),
            ));
        }
        Ok(())
    }
}

/// Builds the canonical-JSON pre-image for signing/verification: serialize
/// to a generic JSON value, drop `omit_keys` (and `meta` if requested), then
/// canonicalize.
fn canonical_preimage<T: Serialize>(
    value: &T,
    omit_keys: &[&str],
    exclude_meta: bool,
) -> Result<Vec<u8>, KktpError> {
    let json = serde_json::to_value(value).expect("anchor types always serialize to JSON");
    let prepared = canon::prepare_for_signing(&json, omit_keys, exclude_meta);
    Ok(canon::canonicalize(&prepared)?.into_bytes())
}

/// Generates a fresh 32-byte SID.
///
/// Priority order per the anchor factory's design: a full VRF-derived
/// randomness source, a partial VRF source (just the pseudorandom value,
/// no proof — e.g. when proof generation failed but the caller still wants
/// VRF-flavored entropy), or, absent both, a hash of a fresh random UUID.
#[must_use]
pub fn generate_sid(vrf_randomness: Option<&[u8]>) -> [u8; SID_SIZE] {
    match vrf_randomness {
        Some(bytes) => crypto_hash::hash(bytes),
        None => {
            let uuid = uuid::Uuid::new_v4();
            crypto_hash::hash(uuid.as_bytes())
        }
    }
}
