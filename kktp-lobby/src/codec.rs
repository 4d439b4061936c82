//! Group message AEAD framing (§4.10): XChaCha20-Poly1305 under the
//! current group key, with the ciphertext bound to the group mailbox and
//! key version via AAD so it can never be replayed into another lobby or
//! under the wrong rotation.

use crate::error::LobbyError;
use crate::key_vault::{GroupKey, KeyVault};
use crate::messages::GroupMessage;
use kktp_core::anchors::PROTOCOL_VERSION;

const AAD_SIZE: usize = 36;

fn build_aad(group_mailbox_id: &[u8; 32], key_version: u32) -> [u8; AAD_SIZE] {
    let mut aad = [0u8; AAD_SIZE];
    aad[..32].copy_from_slice(group_mailbox_id);
    aad[32..].copy_from_slice(&key_version.to_be_bytes());
    aad
}

/// Encrypts one group message under the current key.
pub fn encrypt(
    group_mailbox_id: &[u8; 32],
    key_version: u32,
    key: &GroupKey,
    sender_pub_sig: &crypto_sig::VerificationKey,
    plaintext: &[u8],
    now_millis: u64,
) -> GroupMessage {
    let mut nonce_bytes = [0u8; crypto_aead::NONCE_SIZE];
    crypto_rng::fill_buffer(&mut nonce_bytes);
    let nonce = crypto_aead::Nonce::from(nonce_bytes);
    let aad = build_aad(group_mailbox_id, key_version);
    let ciphertext = crypto_aead::encrypt(&key.aead_key(), &nonce, plaintext, &aad);

    GroupMessage {
        kind: "group_message".into(),
        version: PROTOCOL_VERSION,
        sender_pub_sig: hexutil::encode(sender_pub_sig.as_bytes()),
        key_version,
        nonce: hexutil::encode(&nonce_bytes),
        ciphertext: hexutil::encode(&ciphertext),
        timestamp: now_millis,
    }
}

/// Decrypts a group message against whichever key in `vault` matches its
/// `key_version`. Returns [`LobbyError::UnknownKeyVersion`] if the member
/// has never held (or has already retired) that version's key — the only
/// way a kicked member's stale vault is denied a post-kick rotation.
pub fn decrypt(
    group_mailbox_id: &[u8; 32],
    msg: &GroupMessage,
    vault: &KeyVault,
) -> Result<Vec<u8>, LobbyError> {
    let key = vault
        .get(msg.key_version)
        .ok_or(LobbyError::UnknownKeyVersion(msg.key_version))?;
    let nonce_bytes: [u8; crypto_aead::NONCE_SIZE] = hexutil::decode_array(&msg.nonce)?;
    let nonce = crypto_aead::Nonce::from(nonce_bytes);
    let ciphertext = hexutil::decode(&msg.ciphertext)?;
    let aad = build_aad(group_mailbox_id, msg.key_version);
    crypto_aead::decrypt(&key.aead_key(), &nonce, &ciphertext, &aad).ok_or(LobbyError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mailbox = [1u8; 32];
        let key = GroupKey([2u8; 32]);
        let (_, pub_sig) = crypto_sig::generate_key_pair([3u8; 32]).unwrap();
        let mut vault = KeyVault::new();
        vault.insert(1, GroupKey([2u8; 32]));

        let msg = encrypt(&mailbox, 1, &key, &pub_sig, b"hello lobby", 1000);
        let plaintext = decrypt(&mailbox, &msg, &vault).unwrap();
        assert_eq!(plaintext, b"hello lobby");
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mailbox = [1u8; 32];
        let key = GroupKey([2u8; 32]);
        let (_, pub_sig) = crypto_sig::generate_key_pair([3u8; 32]).unwrap();
        let vault = KeyVault::new();

        let msg = encrypt(&mailbox, 5, &key, &pub_sig, b"hello", 1000);
        assert!(matches!(
            decrypt(&mailbox, &msg, &vault),
            Err(LobbyError::UnknownKeyVersion(5))
        ));
    }

    #[test]
    fn test_wrong_mailbox_fails_decryption() {
        let mailbox = [1u8; 32];
        let other_mailbox = [9u8; 32];
        let key = GroupKey([2u8; 32]);
        let (_, pub_sig) = crypto_sig::generate_key_pair([3u8; 32]).unwrap();
        let mut vault = KeyVault::new();
        vault.insert(1, GroupKey([2u8; 32]));

        let msg = encrypt(&mailbox, 1, &key, &pub_sig, b"hello", 1000);
        assert!(matches!(
            decrypt(&other_mailbox, &msg, &vault),
            Err(LobbyError::DecryptionFailed)
        ));
    }
}
