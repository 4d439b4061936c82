//! Host-side lobby state (§4.10): roster management, join admission, and
//! the group key lifecycle. A rotation is forced on every kick and offered
//! (subject to `LobbyConfig::min_rotation_interval_millis`) on a timer the
//! embedding application drives by calling [`LobbyHost::maybe_rotate`].

use crate::codec;
use crate::error::LobbyError;
use crate::key_vault::GroupKey;
use crate::messages::{GroupMessage, KeyRotation, LobbyJoinResponse, LobbyMemberEvent};
use crate::roster::{Member, Roster};
use kktp_core::config::LobbyConfig;

fn fresh_group_key() -> GroupKey {
    let mut bytes = [0u8; crypto_aead::KEY_SIZE];
    crypto_rng::fill_buffer(&mut bytes);
    GroupKey(bytes)
}

pub struct LobbyHost {
    pub group_mailbox_id: [u8; 32],
    pub lobby_name: String,
    pub max_members: usize,
    pub roster: Roster,
    pub key_version: u32,
    pub group_key: GroupKey,
    last_rotation_millis: u64,
    config: LobbyConfig,
}

impl LobbyHost {
    #[must_use]
    pub fn new(
        group_mailbox_id: [u8; 32],
        lobby_name: impl Into<String>,
        max_members: usize,
        config: LobbyConfig,
        now_millis: u64,
    ) -> Self {
        Self {
            group_mailbox_id,
            lobby_name: lobby_name.into(),
            max_members,
            roster: Roster::new(),
            key_version: 1,
            group_key: fresh_group_key(),
            last_rotation_millis: now_millis,
            config,
        }
    }

    /// Admits or rejects a join request. On acceptance, the member is
    /// added to the roster and the response carries the current group key
    /// and version; the caller still owes the rest of the roster a
    /// [`Self::member_joined_event`] over their own pairwise sessions.
    pub fn handle_join_request(
        &mut self,
        pub_sig: crypto_sig::VerificationKey,
        display_name: String,
        now_millis: u64,
    ) -> LobbyJoinResponse {
        if self.roster.len() >= self.max_members {
            tracing::info!(max_members = self.max_members, "lobby: rejecting join, at capacity");
            return LobbyJoinResponse {
                kind: "lobby_join_response".into(),
                accepted: false,
                group_mailbox_id: None,
                key_version: None,
                group_key: None,
                reason: Some("lobby is full".into()),
            };
        }

        self.roster.add(Member {
            pub_sig,
            display_name,
            join_time_millis: now_millis,
        });

        LobbyJoinResponse {
            kind: "lobby_join_response".into(),
            accepted: true,
            group_mailbox_id: Some(hexutil::encode(&self.group_mailbox_id)),
            key_version: Some(self.key_version),
            group_key: Some(hexutil::encode(&self.group_key.0)),
            reason: None,
        }
    }

    #[must_use]
    pub fn member_joined_event(&self, member: &Member) -> LobbyMemberEvent {
        LobbyMemberEvent {
            kind: "lobby_member_event".into(),
            event: "joined".into(),
            pub_sig: hexutil::encode(member.pub_sig.as_bytes()),
            display_name: member.display_name.clone(),
        }
    }

    /// Removes a member and forces a key rotation, the mechanism that
    /// gives kicked members forward secrecy: their retained key decrypts
    /// nothing published after this point.
    pub fn kick(
        &mut self,
        pub_sig: &crypto_sig::VerificationKey,
        now_millis: u64,
    ) -> Result<(Member, LobbyMemberEvent, KeyRotation), LobbyError> {
        let member = self.roster.remove(pub_sig).ok_or(LobbyError::NotAMember)?;
        let event = LobbyMemberEvent {
            kind: "lobby_member_event".into(),
            event: "kicked".into(),
            pub_sig: hexutil::encode(member.pub_sig.as_bytes()),
            display_name: member.display_name.clone(),
        };
        let rotation = self.rotate(now_millis);
        tracing::info!(pub_sig = %event.pub_sig, new_version = rotation.version, "lobby: kicked member, rotated key");
        Ok((member, event, rotation))
    }

    /// Rotates the group key unconditionally, bypassing the minimum
    /// interval guard. Used by [`Self::kick`], where forward secrecy
    /// requires an immediate rotation regardless of cadence.
    fn rotate(&mut self, now_millis: u64) -> KeyRotation {
        self.group_key = fresh_group_key();
        self.key_version += 1;
        self.last_rotation_millis = now_millis;
        KeyRotation {
            kind: "key_rotation".into(),
            version: self.key_version,
            key: hexutil::encode(&self.group_key.0),
        }
    }

    /// Rotates the group key on a timer, subject to the configured minimum
    /// interval, guarding against a kick/join storm forcing back-to-back
    /// rotations. Returns `None` if the interval has not yet elapsed.
    pub fn maybe_rotate(&mut self, now_millis: u64) -> Option<KeyRotation> {
        let elapsed = now_millis.saturating_sub(self.last_rotation_millis);
        if u128::from(elapsed) < self.config.min_rotation_interval_millis {
            return None;
        }
        let rotation = self.rotate(now_millis);
        tracing::info!(new_version = rotation.version, "lobby: rotated group key on timer");
        Some(rotation)
    }

    #[must_use]
    pub fn encrypt_group_message(
        &self,
        sender_pub_sig: &crypto_sig::VerificationKey,
        plaintext: &[u8],
        now_millis: u64,
    ) -> GroupMessage {
        codec::encrypt(
            &self.group_mailbox_id,
            self.key_version,
            &self.group_key,
            sender_pub_sig,
            plaintext,
            now_millis,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> LobbyHost {
        LobbyHost::new([1u8; 32], "test-lobby", 2, LobbyConfig::default(), 0)
    }

    #[test]
    fn test_join_request_accepted_until_capacity() {
        let mut host = host();
        let (_, a) = crypto_sig::generate_key_pair([2u8; 32]).unwrap();
        let (_, b) = crypto_sig::generate_key_pair([3u8; 32]).unwrap();
        let (_, c) = crypto_sig::generate_key_pair([4u8; 32]).unwrap();

        assert!(host.handle_join_request(a, "a".into(), 0).accepted);
        assert!(host.handle_join_request(b, "b".into(), 0).accepted);
        assert!(!host.handle_join_request(c, "c".into(), 0).accepted);
    }

    #[test]
    fn test_kick_rotates_key_and_removes_member() {
        let mut host = host();
        let (_, a) = crypto_sig::generate_key_pair([2u8; 32]).unwrap();
        host.handle_join_request(a.clone(), "a".into(), 0);
        let version_before = host.key_version;

        let (member, event, rotation) = host.kick(&a, 0).unwrap();
        assert_eq!(member.display_name, "a");
        assert_eq!(event.event, "kicked");
        assert_eq!(rotation.version, version_before + 1);
        assert!(!host.roster.contains(&a));
    }

    #[test]
    fn test_maybe_rotate_respects_min_interval() {
        let mut host = host();
        assert!(host.maybe_rotate(500).is_none());
        assert!(host.maybe_rotate(2_000).is_some());
    }
}
