//! Carrier DAG wire framing (§6).
//!
//! Every KKTP payload is a UTF-8 string with one of three prefixes,
//! hex-encoded before being handed to the carrier's opaque payload field:
//! `KKTP:ANCHOR:<canonical-json>` for discovery/response/session-end,
//! `KKTP:<mailbox_id_hex>:<canonical-json>` for authenticated messages,
//! and `KKTP:GROUP:<canonical-json>` for group-encrypted lobby messages.

use crate::error::KktpError;

const ANCHOR_PREFIX: &str = "KKTP:ANCHOR:";
const GROUP_PREFIX: &str = "KKTP:GROUP:";

/// A parsed carrier payload, identified by which of the three prefixes it
/// carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePayload {
    Anchor(String),
    Message { mailbox_id_hex: String, json: String },
    Group(String),
}

fn encode(body: &str) -> Vec<u8> {
    hexutil::encode(body.as_bytes()).into_bytes()
}

#[must_use]
pub fn encode_anchor(canonical_json: &str) -> Vec<u8> {
    encode(&format!("{ANCHOR_PREFIX}{canonical_json}"))
}

#[must_use]
pub fn encode_message(mailbox_id: &[u8; 32], canonical_json: &str) -> Vec<u8> {
    encode(&format!(
        "KKTP:{}:{canonical_json}",
        hexutil::encode(mailbox_id)
    ))
}

#[must_use]
pub fn encode_group(canonical_json: &str) -> Vec<u8> {
    encode(&format!("{GROUP_PREFIX}{canonical_json}"))
}

/// Reverses [`encode_anchor`]/[`encode_message`]/[`encode_group`]: decodes
/// the outer hex layer, then matches one of the three known prefixes.
pub fn decode(payload: &[u8]) -> Result<WirePayload, KktpError> {
    let hex_str = std::str::from_utf8(payload).map_err(|_| {
        KktpError::SchemaInvalid("carrier payload is not valid UTF-8 hex".into())
    })?;
    let body_bytes = hexutil::decode(hex_str)?;
    let body = String::from_utf8(body_bytes)
        .map_err(|_| KktpError::SchemaInvalid("decoded payload is not valid UTF-8".into()))?;

    if let Some(json) = body.strip_prefix(ANCHOR_PREFIX) {
        return Ok(WirePayload::Anchor(json.to_string()));
    }
    if let Some(json) = body.strip_prefix(GROUP_PREFIX) {
        return Ok(WirePayload::Group(json.to_string()));
    }
    if let Some(rest) = body.strip_prefix("KKTP:") {
        if let Some((mailbox_id_hex, json)) = rest.split_once(':') {
            if hexutil::is_lowercase_hex_of_len(mailbox_id_hex, 32) {
                return Ok(WirePayload::Message {
                    mailbox_id_hex: mailbox_id_hex.to_string(),
                    json: json.to_string(),
                });
            }
        }
    }
    Err(KktpError::SchemaInvalid(
        "carrier payload did not match any known KKTP prefix".into(),
    ))
}

/// Whether a raw carrier payload is addressed to `mailbox_id`'s message
/// prefix, without fully decoding it. Used by scan loops that only want
/// to filter by prefix before doing the heavier canonical-JSON parse.
#[must_use]
pub fn is_message_for_mailbox(payload: &[u8], mailbox_id: &[u8; 32]) -> bool {
    matches!(decode(payload), Ok(WirePayload::Message { mailbox_id_hex, .. }) if mailbox_id_hex == hexutil::encode(mailbox_id))
}
