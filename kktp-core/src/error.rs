//! Error kinds surfaced by the KKTP core, per §7 of the protocol spec.
//!
//! Fatal errors (handshake and per-message integrity failures) carry enough
//! structure for the session state machine to transition to `FAULTED` and
//! log a single observable event; recoverable conditions (mailbox/SID
//! mismatch, sequence replay) are not represented as `Err` at all, since the
//! spec treats them as silent drops or warn-level events rather than faults.

use thiserror::Error;

/// A stable string code for structured logging and downstream telemetry,
/// independent of the `Display` message (which may gain detail over time).
pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum KktpError {
    #[error("anchor or message failed schema validation: {0}")]
    SchemaInvalid(String),

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("response did not echo the discovery keys verbatim")]
    KeyEchoMismatch,

    #[error("VRF verification failed")]
    VrfMismatch,

    #[error("VRF value/proof pair is inconsistent: both must be present or both absent")]
    VrfPairInconsistent,

    #[error("AEAD decryption failed")]
    DecryptionFailed,

    #[error("nonce length is not {expected} bytes (got {actual})")]
    NonceLengthInvalid { expected: usize, actual: usize },

    #[error("reorder buffer exceeded its configured bound")]
    BufferOverflow,

    #[error("session is not in a state that allows this operation")]
    InvalidState,

    #[error("canonical JSON error: {0}")]
    Canon(#[from] canon::CanonError),

    #[error("hex decoding error: {0}")]
    Hex(#[from] hexutil::HexError),
}

impl ErrorCode for KktpError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaInvalid(_) => "schema_invalid",
            Self::SignatureInvalid => "signature_invalid",
            Self::KeyEchoMismatch => "key_echo_mismatch",
            Self::VrfMismatch => "vrf_mismatch",
            Self::VrfPairInconsistent => "vrf_pair_inconsistent",
            Self::DecryptionFailed => "decryption_failed",
            Self::NonceLengthInvalid { .. } => "nonce_length_invalid",
            Self::BufferOverflow => "buffer_overflow",
            Self::InvalidState => "invalid_state",
            Self::Canon(_) => "canon_error",
            Self::Hex(_) => "hex_error",
        }
    }
}

/// Outcome of unpacking a message: a clean delivery, a silent drop (mailbox
/// or SID mismatch, or the new direction-reflection check), a buffered
/// out-of-order message, or a fatal error that the caller must fault the
/// session over.
#[derive(Debug)]
pub enum UnpackOutcome {
    /// Plaintext delivered in order.
    Delivered(Vec<u8>),
    /// Several plaintexts delivered in order, released from the reorder
    /// buffer by this message's arrival (the triggering message is first).
    DeliveredBatch(Vec<Vec<u8>>),
    /// Message buffered pending earlier sequence numbers.
    Buffered,
    /// Message silently discarded: wrong mailbox/SID, reflected direction,
    /// or sequence replay. Not an error — no state mutation beyond what the
    /// spec calls for (a replay/drop is merely observed, never faulted).
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MailboxMismatch,
    SidMismatch,
    DirectionMismatch,
    SequenceReplay,
}
