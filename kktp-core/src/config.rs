//! Per-manager configuration (§1 of the ambient stack): timing knobs that
//! govern how stale an incoming anchor may be before it is rejected, how
//! long a session may sit idle before it is considered expired, and how
//! large its reorder buffer is allowed to grow.

use serde::{Deserialize, Serialize};

/// Timing and sizing knobs for one session manager. Constructed by the
/// embedding application; this crate only supplies sane defaults and
/// reads the values back at the relevant checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManagerConfig {
    /// Maximum age of an incoming discovery/response anchor, in
    /// milliseconds, before it is rejected as stale.
    pub max_incoming_announcement_age_millis: u128,
    /// Maximum amount an incoming discovery/response anchor's timestamp
    /// may be ahead of local time, in milliseconds, before it is
    /// rejected as implausibly future-dated.
    pub max_incoming_announcement_future_millis: u128,

    /// Maximum age of an incoming message anchor, in milliseconds.
    pub max_incoming_message_age_millis: u128,
    /// Maximum future skew tolerated on an incoming message anchor, in
    /// milliseconds.
    pub max_incoming_message_future_millis: u128,

    /// Maximum time a session may go without activity before it is
    /// considered expired and eligible for cleanup.
    pub max_session_inactivity_millis: u128,

    /// Interval at which a keep-alive message is sent to an otherwise
    /// idle peer to keep the session from expiring.
    pub keep_alive_interval_millis: u128,

    /// Maximum number of out-of-order messages a session's reorder
    /// buffer may hold before `BufferOverflow` is raised.
    pub max_session_lag_length: u64,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            max_incoming_announcement_age_millis: 60_000,
            max_incoming_announcement_future_millis: 5_000,
            max_incoming_message_age_millis: 300_000,
            max_incoming_message_future_millis: 5_000,
            max_session_inactivity_millis: 3_600_000,
            keep_alive_interval_millis: 60_000,
            max_session_lag_length: 256,
        }
    }
}

/// Lobby-specific configuration: key rotation cadence and the DM
/// reorder-buffer bound applied per pairwise member session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Minimum interval between successive group key rotations, in
    /// milliseconds, guarding against a pathological kick/join storm
    /// forcing a rotation on every single membership change.
    pub min_rotation_interval_millis: u128,

    /// Maximum number of buffered direct messages held per member
    /// mailbox before the oldest is dropped to make room for the newest.
    pub dm_buffer_bound: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            min_rotation_interval_millis: 1_000,
            dm_buffer_bound: 64,
        }
    }
}
