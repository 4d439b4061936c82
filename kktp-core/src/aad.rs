//! Additional authenticated data for the per-message AEAD frame (§4.6).
//!
//! The AAD is exactly 44 bytes: the 32-byte mailbox ID, a 4-byte ASCII
//! direction tag (`"AtoB"` or `"BtoA"`), and an 8-byte big-endian sequence
//! number. Binding all three into the AEAD tag is what makes the codec's
//! mailbox/direction/sequence checks tamper-evident rather than merely
//! advisory: a ciphertext replayed under a different mailbox, direction, or
//! sequence fails to decrypt at all.

use crate::anchors::Direction;
use crate::error::KktpError;

pub const AAD_SIZE: usize = 44;
const MAILBOX_SIZE: usize = 32;

#[must_use]
pub fn build(mailbox_id: &[u8; MAILBOX_SIZE], direction: Direction, seq: u64) -> [u8; AAD_SIZE] {
    let mut out = [0u8; AAD_SIZE];
    out[0..32].copy_from_slice(mailbox_id);
    out[32..36].copy_from_slice(direction.to_string().as_bytes());
    out[36..44].copy_from_slice(&seq.to_be_bytes());
    out
}

/// Splits a 44-byte AAD back into its three fields, for diagnostics and
/// tests. The message codec itself only ever builds AAD, never parses it
/// back out (the mailbox/direction/seq it checks against come from the
/// anchor, not the AAD bytes), so this is not on the hot decode path.
pub fn parse(aad: &[u8]) -> Result<([u8; MAILBOX_SIZE], Direction, u64), KktpError> {
    if aad.len() != AAD_SIZE {
        return Err(KktpError::SchemaInvalid(format!(
            "AAD must be {AAD_SIZE} bytes (got {})",
            aad.len()
        )));
    }
    let mut mailbox_id = [0u8; MAILBOX_SIZE];
    mailbox_id.copy_from_slice(&aad[0..32]);
    let direction = match &aad[32..36] {
        b"AtoB" => Direction::AtoB,
        b"BtoA" => Direction::BtoA,
        _ => return Err(KktpError::SchemaInvalid("unrecognized direction tag".into())),
    };
    let mut seq_bytes = [0u8; 8];
    seq_bytes.copy_from_slice(&aad[36..44]);
    Ok((mailbox_id, direction, u64::from_be_bytes(seq_bytes)))
}
