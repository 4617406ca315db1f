//! Encrypted container format for cumulus.
//!
//! Wraps plaintext in a self-describing container that can be decoded with
//! only the originating passphrase:
//!
//! - SHA-256 of the UTF-8 passphrase becomes the AES-256 key
//! - a fresh random 16-byte IV is generated per encryption
//! - payload is AES-256-CBC, short final blocks padded with ASCII spaces
//! - an 8-byte little-endian length header restores the exact plaintext
//!
//! # Security caveats
//!
//! This format is deliberately compatible with pre-existing containers and
//! inherits their weaknesses. The key is a bare hash of the passphrase with
//! no salt and no work factor, so it is exactly as strong as the passphrase
//! itself. There is no authentication tag: a corrupted or tampered container
//! decrypts silently into garbage instead of failing. Treat the envelope as
//! transport privacy for trusted storage, not tamper evidence.

mod envelope;
mod error;
mod key;

pub use envelope::{open, seal, seal_bytes, BLOCK_SIZE, HEADER_SIZE, IV_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{EnvelopeKey, KEY_SIZE};
