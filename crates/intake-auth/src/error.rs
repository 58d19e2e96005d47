use thiserror::Error;

use intake_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no active client for slug: {slug}")]
    NoSuchActiveClient { slug: String },

    #[error("invalid password")]
    InvalidPassword,

    #[error("malformed stored secret: {0}")]
    SecretFormat(String),

    #[error("secret verification failed: {0}")]
    Verification(String),

    #[error("store error: {0}")]
    Storage(#[from] StorageError),
}
