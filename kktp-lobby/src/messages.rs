//! Lobby control-plane message types (§4.10): join flow, membership
//! events, and key rotation, exchanged as plaintext payloads over
//! pairwise KKTP sessions, plus the group-encrypted message envelope
//! posted directly to the carrier under the `KKTP:GROUP:` prefix.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyJoinRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub display_name: String,
}

impl LobbyJoinRequest {
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            kind: "lobby_join_request".into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyJoinResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_mailbox_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyMemberEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub event: String,
    pub pub_sig: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRotation {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub key: String,
}

/// The group-encrypted envelope published under `KKTP:GROUP:`. `version`
/// is the protocol version (matching every other anchor), distinct from
/// `key_version`, which names which rotation of the group key encrypted
/// this particular message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    #[serde(rename = "senderPubSig")]
    pub sender_pub_sig: String,
    #[serde(rename = "keyVersion")]
    pub key_version: u32,
    pub nonce: String,
    pub ciphertext: String,
    pub timestamp: u64,
}
