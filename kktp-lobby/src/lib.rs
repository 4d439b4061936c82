//! # kktp-lobby
//!
//! Host-mediated group overlay built over multiple pairwise `kktp-core`
//! sessions: membership roster, join admission, group key rotation with
//! forward secrecy against kicked members, and the group AEAD codec.

pub mod codec;
pub mod dm_buffer;
pub mod error;
pub mod host;
pub mod key_vault;
pub mod member;
pub mod messages;
pub mod roster;

pub use error::LobbyError;
pub use host::LobbyHost;
pub use member::LobbyMember;
