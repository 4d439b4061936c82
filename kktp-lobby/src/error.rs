use thiserror::Error;

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error(transparent)]
    Core(#[from] kktp_core::KktpError),

    #[error("hex decoding error: {0}")]
    Hex(#[from] hexutil::HexError),

    #[error("join request rejected: {0}")]
    JoinRejected(String),

    #[error("unknown key version {0}")]
    UnknownKeyVersion(u32),

    #[error("group message decryption failed")]
    DecryptionFailed,

    #[error("lobby is at capacity ({0} members)")]
    AtCapacity(usize),

    #[error("signing public key is not a member of this lobby")]
    NotAMember,
}
