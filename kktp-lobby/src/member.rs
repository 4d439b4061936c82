//! Member-side lobby state (§4.10): tracking the host's identity, the
//! group mailbox, and a vault of key versions, updated as join responses
//! and rotations arrive over the member's pairwise session with the host.

use crate::codec;
use crate::error::LobbyError;
use crate::key_vault::{GroupKey, KeyVault};
use crate::messages::{GroupMessage, KeyRotation, LobbyJoinResponse};

pub struct LobbyMember {
    pub group_mailbox_id: [u8; 32],
    pub host_pub_sig: crypto_sig::VerificationKey,
    vault: KeyVault,
}

impl LobbyMember {
    #[must_use]
    pub fn new(group_mailbox_id: [u8; 32], host_pub_sig: crypto_sig::VerificationKey) -> Self {
        Self {
            group_mailbox_id,
            host_pub_sig,
            vault: KeyVault::new(),
        }
    }

    /// Installs the group key carried by an accepted join response.
    pub fn accept_join_response(&mut self, response: &LobbyJoinResponse) -> Result<(), LobbyError> {
        if !response.accepted {
            return Err(LobbyError::JoinRejected(
                response.reason.clone().unwrap_or_else(|| "no reason given".into()),
            ));
        }
        let version = response
            .key_version
            .ok_or_else(|| LobbyError::JoinRejected("accepted response missing key_version".into()))?;
        let key_hex = response
            .group_key
            .as_deref()
            .ok_or_else(|| LobbyError::JoinRejected("accepted response missing group_key".into()))?;
        let key_bytes: [u8; crypto_aead::KEY_SIZE] = hexutil::decode_array(key_hex)?;
        self.vault.insert(version, GroupKey(key_bytes));
        Ok(())
    }

    /// Installs a new key version distributed by the host.
    pub fn apply_key_rotation(&mut self, rotation: &KeyRotation) -> Result<(), LobbyError> {
        let key_bytes: [u8; crypto_aead::KEY_SIZE] = hexutil::decode_array(&rotation.key)?;
        self.vault.insert(rotation.version, GroupKey(key_bytes));
        tracing::info!(version = rotation.version, "lobby: installed rotated group key");
        Ok(())
    }

    pub fn decrypt_group_message(&self, msg: &GroupMessage) -> Result<Vec<u8>, LobbyError> {
        codec::decrypt(&self.group_mailbox_id, msg, &self.vault)
    }

    /// Retires every key version at or below `version`, once the member is
    /// confident no peer still has in-flight traffic under them.
    pub fn retire_versions_up_to(&mut self, version: u32) {
        self.vault.retire_up_to(version);
    }

    #[must_use]
    pub fn highest_known_version(&self) -> u32 {
        self.vault.highest_known_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_identity() -> crypto_sig::VerificationKey {
        crypto_sig::generate_key_pair([7u8; 32]).unwrap().1
    }

    #[test]
    fn test_accept_join_response_installs_key() {
        let mut member = LobbyMember::new([1u8; 32], host_identity());
        let response = LobbyJoinResponse {
            kind: "lobby_join_response".into(),
            accepted: true,
            group_mailbox_id: Some(hexutil::encode(&[1u8; 32])),
            key_version: Some(1),
            group_key: Some(hexutil::encode(&[9u8; 32])),
            reason: None,
        };
        member.accept_join_response(&response).unwrap();
        assert_eq!(member.highest_known_version(), 1);
    }

    #[test]
    fn test_rejected_join_response_is_an_error() {
        let mut member = LobbyMember::new([1u8; 32], host_identity());
        let response = LobbyJoinResponse {
            kind: "lobby_join_response".into(),
            accepted: false,
            group_mailbox_id: None,
            key_version: None,
            group_key: None,
            reason: Some("lobby is full".into()),
        };
        assert!(matches!(
            member.accept_join_response(&response),
            Err(LobbyError::JoinRejected(_))
        ));
    }
}
