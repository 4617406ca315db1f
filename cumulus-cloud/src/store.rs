//! Object store boundary.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CloudResult;

/// Outcome of an idempotent container-creation attempt.
///
/// Both "exists" outcomes are data rather than errors; callers match on
/// them and decide whether the run continues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
    AlreadyOwned,
}

/// A remote object store keyed by POSIX-style relative paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` at `key`, overwriting unconditionally. The write is
    /// atomic from the caller's perspective.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> CloudResult<()>;

    /// Fetches the metadata map of the object at `key`, or `None` if the
    /// object does not exist.
    async fn object_metadata(&self, key: &str) -> CloudResult<Option<HashMap<String, String>>>;

    /// Fetches the object bytes at `key`, or `None` if the object does not
    /// exist.
    async fn get_object(&self, key: &str) -> CloudResult<Option<Vec<u8>>>;

    /// Lists every key under `prefix`. An empty store is an empty list,
    /// never an error.
    async fn list_keys(&self, prefix: &str) -> CloudResult<Vec<String>>;

    /// Creates the backing container.
    async fn create_container(&self) -> CloudResult<CreateOutcome>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> CloudResult<()> {
        (**self).put_object(key, bytes, metadata).await
    }

    async fn object_metadata(&self, key: &str) -> CloudResult<Option<HashMap<String, String>>> {
        (**self).object_metadata(key).await
    }

    async fn get_object(&self, key: &str) -> CloudResult<Option<Vec<u8>>> {
        (**self).get_object(key).await
    }

    async fn list_keys(&self, prefix: &str) -> CloudResult<Vec<String>> {
        (**self).list_keys(prefix).await
    }

    async fn create_container(&self) -> CloudResult<CreateOutcome> {
        (**self).create_container().await
    }
}
