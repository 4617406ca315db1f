//! Metadata index boundary.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::CloudResult;
use crate::types::FileRecord;

/// The remote record store tracking what has already been uploaded.
///
/// The index — not the bucket listing — is the single source of truth for
/// upload decisions. The digest stored on the blob itself is only consulted
/// symmetrically on restore.
#[async_trait]
pub trait MetadataIndex: Send + Sync {
    /// Fetches the record for `(owner, path)`, or `None` if none exists.
    async fn get(&self, owner: &str, path: &str) -> CloudResult<Option<FileRecord>>;

    /// Creates (or replaces) a record.
    async fn put(&self, record: &FileRecord) -> CloudResult<()>;

    /// Rewrites an existing record's hash and timestamp. Fails with
    /// [`crate::error::CloudError::RecordNotFound`] if no record exists;
    /// callers distinguish create from update via [`Self::get`] first.
    async fn update(
        &self,
        owner: &str,
        path: &str,
        md5_hash: &str,
        last_updated: &str,
    ) -> CloudResult<()>;
}

#[async_trait]
impl<T: MetadataIndex + ?Sized> MetadataIndex for Arc<T> {
    async fn get(&self, owner: &str, path: &str) -> CloudResult<Option<FileRecord>> {
        (**self).get(owner, path).await
    }

    async fn put(&self, record: &FileRecord) -> CloudResult<()> {
        (**self).put(record).await
    }

    async fn update(
        &self,
        owner: &str,
        path: &str,
        md5_hash: &str,
        last_updated: &str,
    ) -> CloudResult<()> {
        (**self).update(owner, path, md5_hash, last_updated).await
    }
}
