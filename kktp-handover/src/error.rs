use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandoverError {
    #[error(transparent)]
    Core(#[from] kktp_core::KktpError),

    #[error("no persisted resume record found under this prefix")]
    NoResumeRecord,

    #[error("handover cancelled before completion")]
    Cancelled,
}
