//! Sync error types.

use thiserror::Error;

/// Result type for sync operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors that can occur while syncing.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("S3 operation failed: {0}")]
    S3(String),

    #[error("metadata index operation failed: {0}")]
    Index(String),

    #[error("no index record for {owner}:{path}")]
    RecordNotFound { owner: String, path: String },

    #[error("no encryption key named {0} in the configuration")]
    UnknownKeyAlias(String),

    #[error("refusing object key that escapes the restore root: {0}")]
    UnsafeKey(String),

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    #[error("envelope error: {0}")]
    Crypto(#[from] cumulus_crypto::CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
