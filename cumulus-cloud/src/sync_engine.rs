//! Push/pull reconciliation between a local tree and the object store.
//!
//! Push walks the local tree, digests each file, and consults the metadata
//! index to decide create/update/skip, so unchanged content costs one hash
//! and zero transfers. Pull lists the store and downloads only objects
//! whose stored digest differs from the local file, or that do not exist
//! locally. Per-path failures are logged and counted; the run continues
//! with the next path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use cumulus_crypto::EnvelopeKey;

use crate::digest::file_md5;
use crate::error::{CloudError, CloudResult};
use crate::index::MetadataIndex;
use crate::store::{CreateOutcome, ObjectStore};
use crate::types::{
    format_mtime, metadata_value, FileRecord, META_MD5_HASH, META_MODIFICATION_TIME,
};
use crate::walker::{walk, LocalFile};

/// Reconciliation engine over injected store and index implementations.
pub struct SyncEngine<S, I> {
    store: S,
    index: I,
    owner: String,
    envelope_key: Option<EnvelopeKey>,
}

/// Counts from one push run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    pub uploaded: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Counts from one pull run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PullReport {
    pub downloaded: usize,
    pub unchanged: usize,
    pub failed: usize,
}

enum Pushed {
    Uploaded,
    Unchanged,
}

enum Pulled {
    Downloaded,
    Unchanged,
}

impl<S: ObjectStore, I: MetadataIndex> SyncEngine<S, I> {
    /// A configured `envelope_key` switches uploads and downloads to the
    /// encrypted container format; the digest in object metadata stays the
    /// plaintext digest either way.
    pub fn new(store: S, index: I, owner: String, envelope_key: Option<EnvelopeKey>) -> Self {
        Self {
            store,
            index,
            owner,
            envelope_key,
        }
    }

    /// Creates the backing container, reporting "already exists" as an
    /// outcome rather than an error.
    pub async fn initialise(&self) -> CloudResult<CreateOutcome> {
        let outcome = self.store.create_container().await?;
        match outcome {
            CreateOutcome::Created => info!("container created"),
            CreateOutcome::AlreadyExists => info!("container already exists"),
            CreateOutcome::AlreadyOwned => {
                info!("container has already been created by this account")
            }
        }
        Ok(outcome)
    }

    /// Uploads every new or changed file under `root`.
    pub async fn push(&self, root: &Path) -> CloudResult<PushReport> {
        let mut report = PushReport::default();
        for entry in walk(root) {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    warn!("skipping unreadable entry: {e}");
                    report.failed += 1;
                    continue;
                }
            };
            match self.push_one(&file).await {
                Ok(Pushed::Uploaded) => report.uploaded += 1,
                Ok(Pushed::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    warn!("push failed for {}: {e}", file.rel_path);
                    report.failed += 1;
                }
            }
        }
        info!(
            "push complete: {} uploaded, {} unchanged, {} failed",
            report.uploaded, report.unchanged, report.failed
        );
        Ok(report)
    }

    async fn push_one(&self, file: &LocalFile) -> CloudResult<Pushed> {
        let digest = file_md5(&file.abs_path).await?;
        let modified = format_mtime(tokio::fs::metadata(&file.abs_path).await?.modified()?);

        match self.index.get(&self.owner, &file.rel_path).await? {
            Some(record) if record.md5_hash == digest => {
                debug!("{} is unchanged, not uploading", file.rel_path);
                return Ok(Pushed::Unchanged);
            }
            Some(_) => {
                info!("updating {}", file.rel_path);
                self.index
                    .update(&self.owner, &file.rel_path, &digest, &modified)
                    .await?;
            }
            None => {
                info!("creating index record for {}", file.rel_path);
                let file_name = file.rel_path.rsplit('/').next().unwrap_or_default();
                self.index
                    .put(&FileRecord {
                        owner: self.owner.clone(),
                        path: file.rel_path.clone(),
                        last_updated: modified.clone(),
                        md5_hash: digest.clone(),
                        file_name: file_name.to_string(),
                        permissions: String::new(),
                    })
                    .await?;
            }
        }

        let plaintext = tokio::fs::read(&file.abs_path).await?;
        let body = match &self.envelope_key {
            Some(key) => cumulus_crypto::seal_bytes(&plaintext, key)?,
            None => plaintext,
        };
        let metadata = HashMap::from([
            (META_MODIFICATION_TIME.to_string(), modified),
            (META_MD5_HASH.to_string(), digest),
        ]);

        info!("uploading {}", file.rel_path);
        self.store.put_object(&file.rel_path, body, metadata).await?;
        Ok(Pushed::Uploaded)
    }

    /// Downloads every remote object that is missing or changed under
    /// `dest`, creating parent directories as needed.
    ///
    /// The uploader-stored digest is trusted as-is; downloaded bytes are
    /// not re-hashed, so a corrupted remote object whose metadata tag still
    /// matches goes undetected here. Local files without a remote
    /// counterpart are left alone.
    pub async fn pull(&self, dest: &Path) -> CloudResult<PullReport> {
        let mut report = PullReport::default();
        let keys = self.store.list_keys("").await?;
        if keys.is_empty() {
            info!("no files in the object store");
            return Ok(report);
        }
        for key in keys {
            match self.pull_one(dest, &key).await {
                Ok(Pulled::Downloaded) => report.downloaded += 1,
                Ok(Pulled::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    warn!("restore failed for {key}: {e}");
                    report.failed += 1;
                }
            }
        }
        info!(
            "restore complete: {} downloaded, {} unchanged, {} failed",
            report.downloaded, report.unchanged, report.failed
        );
        Ok(report)
    }

    async fn pull_one(&self, dest: &Path, key: &str) -> CloudResult<Pulled> {
        let local_path = resolve_key_path(dest, key)?;

        let metadata = self
            .store
            .object_metadata(key)
            .await?
            .ok_or_else(|| CloudError::S3(format!("object disappeared during restore: {key}")))?;

        // A missing digest tag forces the download.
        if let Some(remote_digest) = metadata_value(&metadata, META_MD5_HASH) {
            if tokio::fs::try_exists(&local_path).await?
                && file_md5(&local_path).await? == remote_digest
            {
                debug!("skipping {key}, local copy is unchanged");
                return Ok(Pulled::Unchanged);
            }
        }

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = self
            .store
            .get_object(key)
            .await?
            .ok_or_else(|| CloudError::S3(format!("object disappeared during restore: {key}")))?;
        let data = match &self.envelope_key {
            Some(envelope_key) => cumulus_crypto::open(&body, envelope_key)?,
            None => body,
        };

        info!("restoring {key}");
        tokio::fs::write(&local_path, data).await?;
        Ok(Pulled::Downloaded)
    }
}

/// Maps an object key onto a path under `dest`, refusing keys that would
/// escape it.
fn resolve_key_path(dest: &Path, key: &str) -> CloudResult<PathBuf> {
    let mut path = dest.to_path_buf();
    for part in key.split('/') {
        match part {
            "" | "." | ".." => return Err(CloudError::UnsafeKey(key.to_string())),
            _ => path.push(part),
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::resolve_key_path;
    use crate::error::CloudError;
    use std::path::Path;

    #[test]
    fn nested_keys_map_under_the_destination() {
        let path = resolve_key_path(Path::new("/restore"), "a/b/c.txt").unwrap();
        assert_eq!(path, Path::new("/restore/a/b/c.txt"));
    }

    #[test]
    fn escaping_keys_are_refused() {
        for key in ["../evil", "a/../../evil", "/abs", "a//b", "", "."] {
            let err = resolve_key_path(Path::new("/restore"), key).unwrap_err();
            assert!(
                matches!(err, CloudError::UnsafeKey(_)),
                "key {key:?} should be refused"
            );
        }
    }
}
