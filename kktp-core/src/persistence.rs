//! Encrypted resume-record persistence (§4.8, §6).
//!
//! A vault serializes to a single opaque blob: a fresh random nonce
//! followed by the AEAD ciphertext of the bincode-encoded session table.
//! The wallet is responsible for storing and retrieving this blob under
//! `<prefix><sid>` (default prefix `kktp_resume_`); this module only knows
//! how to produce and consume the bytes, not where they live.

use crate::error::KktpError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Default key-prefix the wallet's persistence store uses for resume
/// blobs, namespaced by SID.
pub const DEFAULT_RESUME_KEY_PREFIX: &str = "kktp_resume_";

#[must_use]
pub fn resume_key(prefix: &str, sid: &[u8; 32]) -> String {
    format!("{prefix}{}", hexutil::encode(sid))
}

/// Encrypts `value` into a self-describing blob: `nonce || ciphertext`.
pub fn to_encrypted_blob<T: Serialize>(
    value: &T,
    key: &crypto_aead::Key,
) -> Result<Vec<u8>, KktpError> {
    let mut nonce_bytes = [0u8; crypto_aead::NONCE_SIZE];
    crypto_rng::fill_buffer(&mut nonce_bytes);
    let nonce = crypto_aead::Nonce::from(nonce_bytes);

    let plaintext = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| KktpError::SchemaInvalid(format!("failed to encode vault state: {e}")))?;
    let ciphertext = crypto_aead::encrypt(key, &nonce, &plaintext, b"kktp.vault.v1");

    let mut blob = Vec::with_capacity(nonce_bytes.len() + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypts a blob produced by [`to_encrypted_blob`].
pub fn from_encrypted_blob<T: DeserializeOwned>(
    blob: &[u8],
    key: &crypto_aead::Key,
) -> Result<T, KktpError> {
    if blob.len() < crypto_aead::NONCE_SIZE {
        return Err(KktpError::NonceLengthInvalid {
            expected: crypto_aead::NONCE_SIZE,
            actual: blob.len(),
        });
    }
    let (nonce_bytes, ciphertext) = blob.split_at(crypto_aead::NONCE_SIZE);
    let mut nonce_arr = [0u8; crypto_aead::NONCE_SIZE];
    nonce_arr.copy_from_slice(nonce_bytes);
    let nonce = crypto_aead::Nonce::from(nonce_arr);

    let plaintext = crypto_aead::decrypt(key, &nonce, ciphertext, b"kktp.vault.v1")
        .ok_or(KktpError::DecryptionFailed)?;

    let (value, _) = bincode::serde::decode_from_slice(&plaintext, bincode::config::standard())
        .map_err(|e| KktpError::SchemaInvalid(format!("failed to decode vault state: {e}")))?;
    Ok(value)
}
