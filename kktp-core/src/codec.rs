//! Message packing and unpacking (§4.6).
//!
//! Packing turns a plaintext payload into a `Msg` anchor: draw a fresh
//! nonce, build the 44-byte AAD, encrypt, hex-encode. Unpacking is the
//! mirror image plus the filtering the reorder buffer depends on: a
//! message whose mailbox, SID, or direction does not match the session it
//! claims to belong to is silently dropped rather than handed to AEAD
//! decryption at all, since decryption failure and "not for this session"
//! are different conditions the caller needs to tell apart.

use crate::aad;
use crate::anchors::{Direction, Msg, PROTOCOL_VERSION};
use crate::error::{DropReason, KktpError};

/// The result of a filter-then-decrypt pass over one incoming `Msg`
/// anchor, before the reorder buffer gets involved.
pub enum DecodeResult {
    Plaintext(Vec<u8>),
    Dropped(DropReason),
}

/// Encrypts `plaintext` into a `Msg` anchor addressed to `mailbox_id`,
/// under `key`, at `direction`/`seq`.
pub fn pack(
    sid: &[u8; 32],
    mailbox_id: &[u8; 32],
    key: &crypto_aead::Key,
    direction: Direction,
    seq: u64,
    plaintext: &[u8],
) -> Msg {
    let mut nonce_bytes = [0u8; crypto_aead::NONCE_SIZE];
    crypto_rng::fill_buffer(&mut nonce_bytes);
    let nonce = crypto_aead::Nonce::from(nonce_bytes);
    let aad_bytes = aad::build(mailbox_id, direction, seq);
    let ciphertext = crypto_aead::encrypt(key, &nonce, plaintext, &aad_bytes);

    Msg {
        kind: "msg".into(),
        version: PROTOCOL_VERSION,
        sid: hexutil::encode(sid),
        mailbox_id: hexutil::encode(mailbox_id),
        direction,
        seq,
        nonce: hexutil::encode(&nonce_bytes),
        ciphertext: hexutil::encode(&ciphertext),
    }
}

/// Decrypts an incoming `Msg` anchor, first checking that it actually
/// belongs to the session calling this (`expected_sid`/`expected_mailbox`)
/// and arrived in the direction the caller is listening for
/// (`expected_direction`, i.e. the reflection of the direction this side
/// sends on).
pub fn unpack(
    msg: &Msg,
    expected_sid: &[u8; 32],
    expected_mailbox: &[u8; 32],
    expected_direction: Direction,
    key: &crypto_aead::Key,
) -> Result<DecodeResult, KktpError> {
    msg.validate()?;

    let msg_sid: [u8; 32] = hexutil::decode_array(&msg.sid)?;
    if &msg_sid != expected_sid {
        return Ok(DecodeResult::Dropped(DropReason::SidMismatch));
    }

    let msg_mailbox: [u8; 32] = hexutil::decode_array(&msg.mailbox_id)?;
    if &msg_mailbox != expected_mailbox {
        return Ok(DecodeResult::Dropped(DropReason::MailboxMismatch));
    }

    if msg.direction != expected_direction {
        return Ok(DecodeResult::Dropped(DropReason::DirectionMismatch));
    }

    let nonce_bytes: [u8; crypto_aead::NONCE_SIZE] = hexutil::decode_array(&msg.nonce)
        .map_err(|_| KktpError::NonceLengthInvalid {
            expected: crypto_aead::NONCE_SIZE,
            actual: msg.nonce.len() / 2,
        })?;
    let nonce = crypto_aead::Nonce::from(nonce_bytes);
    let ciphertext = hexutil::decode(&msg.ciphertext)?;
    let aad_bytes = aad::build(&msg_mailbox, msg.direction, msg.seq);

    match crypto_aead::decrypt(key, &nonce, &ciphertext, &aad_bytes) {
        Some(plaintext) => Ok(DecodeResult::Plaintext(plaintext)),
        None => Err(KktpError::DecryptionFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_roundtrip() {
        let sid = [1u8; 32];
        let mailbox = [2u8; 32];
        let key = crypto_aead::Key::from([3u8; 32]);
        let msg = pack(&sid, &mailbox, &key, Direction::AtoB, 0, b"hello");

        match unpack(&msg, &sid, &mailbox, Direction::AtoB, &key).unwrap() {
            DecodeResult::Plaintext(p) => assert_eq!(p, b"hello"),
            DecodeResult::Dropped(r) => panic!("unexpected drop: {r:?}"),
        }
    }

    #[test]
    fn test_unpack_drops_on_sid_mismatch() {
        let sid = [1u8; 32];
        let mailbox = [2u8; 32];
        let key = crypto_aead::Key::from([3u8; 32]);
        let msg = pack(&sid, &mailbox, &key, Direction::AtoB, 0, b"hello");

        let other_sid = [9u8; 32];
        match unpack(&msg, &other_sid, &mailbox, Direction::AtoB, &key).unwrap() {
            DecodeResult::Dropped(DropReason::SidMismatch) => {}
            _ => panic!("expected SidMismatch"),
        }
    }

    #[test]
    fn test_unpack_drops_on_mailbox_mismatch() {
        let sid = [1u8; 32];
        let mailbox = [2u8; 32];
        let key = crypto_aead::Key::from([3u8; 32]);
        let msg = pack(&sid, &mailbox, &key, Direction::AtoB, 0, b"hello");

        let other_mailbox = [8u8; 32];
        match unpack(&msg, &sid, &other_mailbox, Direction::AtoB, &key).unwrap() {
            DecodeResult::Dropped(DropReason::MailboxMismatch) => {}
            _ => panic!("expected MailboxMismatch"),
        }
    }

    #[test]
    fn test_unpack_drops_on_direction_reflection() {
        let sid = [1u8; 32];
        let mailbox = [2u8; 32];
        let key = crypto_aead::Key::from([3u8; 32]);
        let msg = pack(&sid, &mailbox, &key, Direction::AtoB, 0, b"hello");

        match unpack(&msg, &sid, &mailbox, Direction::BtoA, &key).unwrap() {
            DecodeResult::Dropped(DropReason::DirectionMismatch) => {}
            _ => panic!("expected DirectionMismatch"),
        }
    }

    #[test]
    fn test_unpack_fails_decryption_with_wrong_key() {
        let sid = [1u8; 32];
        let mailbox = [2u8; 32];
        let key = crypto_aead::Key::from([3u8; 32]);
        let wrong_key = crypto_aead::Key::from([4u8; 32]);
        let msg = pack(&sid, &mailbox, &key, Direction::AtoB, 0, b"hello");

        let result = unpack(&msg, &sid, &mailbox, Direction::AtoB, &wrong_key);
        assert!(matches!(result, Err(KktpError::DecryptionFailed)));
    }
}
