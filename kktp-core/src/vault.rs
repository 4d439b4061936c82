//! The session vault: an in-memory table of live [`SessionContext`]s,
//! indexed both by mailbox ID (the steady-state lookup, once a handshake
//! has completed) and by SID (needed while a handshake is still pending
//! and no mailbox ID has been agreed yet), plus encrypted persistence of
//! the whole table (§4.8).

use crate::error::KktpError;
use crate::persistence;
use crate::session::{SessionContext, SessionSnapshot};
use std::collections::HashMap;

/// Holds every session this endpoint currently knows about, keyed
/// primarily by mailbox ID with a SID-based secondary index for sessions
/// still mid-handshake.
#[derive(Default)]
pub struct SessionVault {
    by_mailbox: HashMap<[u8; 32], SessionContext>,
    sid_to_mailbox: HashMap<[u8; 32], [u8; 32]>,
}

impl SessionVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a session, keeping both indices in sync.
    pub fn insert(&mut self, ctx: SessionContext) {
        tracing::debug!(sid = %hexutil::encode(&ctx.sid), "vault: session inserted");
        self.sid_to_mailbox.insert(ctx.sid, ctx.mailbox_id);
        self.by_mailbox.insert(ctx.mailbox_id, ctx);
    }

    #[must_use]
    pub fn get_by_mailbox(&self, mailbox_id: &[u8; 32]) -> Option<&SessionContext> {
        self.by_mailbox.get(mailbox_id)
    }

    pub fn get_by_mailbox_mut(&mut self, mailbox_id: &[u8; 32]) -> Option<&mut SessionContext> {
        self.by_mailbox.get_mut(mailbox_id)
    }

    #[must_use]
    pub fn get_by_sid(&self, sid: &[u8; 32]) -> Option<&SessionContext> {
        let mailbox_id = self.sid_to_mailbox.get(sid)?;
        self.by_mailbox.get(mailbox_id)
    }

    pub fn get_by_sid_mut(&mut self, sid: &[u8; 32]) -> Option<&mut SessionContext> {
        let mailbox_id = *self.sid_to_mailbox.get(sid)?;
        self.by_mailbox.get_mut(&mailbox_id)
    }

    /// Removes a session by SID, dropping it (and its keys) from both
    /// indices. Used on graceful close and on fatal fault.
    pub fn remove_by_sid(&mut self, sid: &[u8; 32]) -> Option<SessionContext> {
        let mailbox_id = self.sid_to_mailbox.remove(sid)?;
        let removed = self.by_mailbox.remove(&mailbox_id);
        if removed.is_some() {
            tracing::debug!(sid = %hexutil::encode(sid), "vault: session removed");
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionContext> {
        self.by_mailbox.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SessionContext> {
        self.by_mailbox.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_mailbox.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_mailbox.is_empty()
    }

    /// Encrypts the whole vault into a resumable blob under `key`.
    pub fn to_encrypted_blob(&self, key: &crypto_aead::Key) -> Result<Vec<u8>, KktpError> {
        let snapshots: Vec<SessionSnapshot> =
            self.by_mailbox.values().map(SessionContext::to_snapshot).collect();
        persistence::to_encrypted_blob(&snapshots, key)
    }

    /// Reconstructs a vault from a blob produced by [`Self::to_encrypted_blob`].
    pub fn from_encrypted_blob(blob: &[u8], key: &crypto_aead::Key) -> Result<Self, KktpError> {
        let snapshots: Vec<SessionSnapshot> = persistence::from_encrypted_blob(blob, key)?;
        let mut vault = Self::new();
        for snapshot in snapshots {
            vault.insert(SessionContext::from_snapshot(snapshot));
        }
        Ok(vault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, SessionKeyMaterial};

    fn make_ctx(sid: [u8; 32], mailbox: [u8; 32]) -> SessionContext {
        let (_, pub_sig) = crypto_sig::generate_key_pair([3u8; 32]).unwrap();
        let (_, pub_dh) = crypto_dh::generate_key_pair([4u8; 32]).unwrap();
        SessionContext::new(
            sid,
            Role::Initiator,
            mailbox,
            pub_sig,
            pub_dh,
            0,
            0,
            SessionKeyMaterial {
                session_key_bytes: [1u8; 32],
            },
            0,
        )
    }

    #[test]
    fn test_insert_and_lookup_both_indices() {
        let mut vault = SessionVault::new();
        vault.insert(make_ctx([1u8; 32], [2u8; 32]));
        assert!(vault.get_by_mailbox(&[2u8; 32]).is_some());
        assert!(vault.get_by_sid(&[1u8; 32]).is_some());
    }

    #[test]
    fn test_remove_by_sid_clears_both_indices() {
        let mut vault = SessionVault::new();
        vault.insert(make_ctx([1u8; 32], [2u8; 32]));
        assert!(vault.remove_by_sid(&[1u8; 32]).is_some());
        assert!(vault.get_by_mailbox(&[2u8; 32]).is_none());
        assert!(vault.get_by_sid(&[1u8; 32]).is_none());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let mut vault = SessionVault::new();
        vault.insert(make_ctx([5u8; 32], [6u8; 32]));
        vault.insert(make_ctx([7u8; 32], [8u8; 32]));

        let key = crypto_aead::Key::from([9u8; 32]);
        let blob = vault.to_encrypted_blob(&key).unwrap();
        let restored = SessionVault::from_encrypted_blob(&blob, &key).unwrap();

        assert_eq!(restored.len(), 2);
        assert!(restored.get_by_sid(&[5u8; 32]).is_some());
        assert!(restored.get_by_sid(&[7u8; 32]).is_some());
    }
}
