use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown process: {0}")]
    UnknownProcess(String),

    #[error("unknown process field: {0}")]
    UnknownField(String),

    #[error("cannot remove the last process")]
    LastProcess,

    #[error("invalid slug: {0:?}")]
    InvalidSlug(String),

    /// An edit of shared state that never ran.
    #[error("edit was not applied")]
    NotApplied,
}
