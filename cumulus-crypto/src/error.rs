//! Envelope codec error types.

use thiserror::Error;

/// Result type for envelope operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while sealing or opening a container.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("container is {len} bytes, shorter than the 24-byte header")]
    TruncatedContainer { len: usize },

    #[error("ciphertext length {len} is not a multiple of the 16-byte block size")]
    MisalignedCiphertext { len: usize },

    #[error("header declares {declared} plaintext bytes but only {available} ciphertext bytes follow")]
    LengthMismatch { declared: u64, available: u64 },

    #[error("I/O error while sealing: {0}")]
    Io(#[from] std::io::Error),
}
