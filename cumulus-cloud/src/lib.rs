//! Sync engine for cumulus.
//!
//! Pushes a local directory tree into an S3 bucket with content-addressed
//! change detection — a DynamoDB index tracks the last-known digest per
//! `(owner, path)`, so unchanged files cost one hash and zero transfers —
//! and pulls it back down, skipping local files whose digest already
//! matches the stored one. Uploads can optionally be wrapped in the
//! `cumulus-crypto` envelope (client-side) or encrypted under a KMS key
//! (server-side).

pub mod config;
pub mod digest;
pub mod dynamo_index;
pub mod error;
pub mod index;
pub mod s3_store;
pub mod store;
pub mod sync_engine;
pub mod types;
pub mod walker;

pub use config::{KeySpec, ResolvedKey, SyncConfig};
pub use cumulus_crypto::EnvelopeKey;
pub use error::{CloudError, CloudResult};
pub use index::MetadataIndex;
pub use store::{CreateOutcome, ObjectStore};
pub use sync_engine::{PullReport, PushReport, SyncEngine};
pub use types::FileRecord;
