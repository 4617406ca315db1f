//! Shared in-memory test doubles for the service boundaries.
//!
//! `MemoryStore` mimics S3 closely enough to matter: metadata keys are
//! lowercased on retrieval, listing an empty store returns an empty list,
//! and puts overwrite unconditionally. Both doubles count calls so tests
//! can assert on transfer and index-write behavior.

use async_trait::async_trait;
use cumulus_cloud::error::{CloudError, CloudResult};
use cumulus_cloud::index::MetadataIndex;
use cumulus_cloud::store::{CreateOutcome, ObjectStore};
use cumulus_cloud::types::FileRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type StoredObject = (Vec<u8>, HashMap<String, String>);

pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, StoredObject>>,
    pub puts: AtomicUsize,
    pub create_outcome: Mutex<CreateOutcome>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            puts: AtomicUsize::new(0),
            create_outcome: Mutex::new(CreateOutcome::Created),
        }
    }
}

impl MemoryStore {
    pub fn insert_object(&self, key: &str, bytes: &[u8], md5_hash: &str) {
        let metadata = HashMap::from([
            ("ModificationTime".to_string(), "Thu Jan  1 00:00:00 1970".to_string()),
            ("Md5Hash".to_string(), md5_hash.to_string()),
        ]);
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes.to_vec(), metadata));
    }

    pub fn object_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(bytes, _)| bytes.clone())
    }

    pub fn stored_md5(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .and_then(|(_, metadata)| metadata.get("Md5Hash").cloned())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> CloudResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, metadata));
        Ok(())
    }

    async fn object_metadata(&self, key: &str) -> CloudResult<Option<HashMap<String, String>>> {
        Ok(self.objects.lock().unwrap().get(key).map(|(_, metadata)| {
            metadata
                .iter()
                .map(|(name, value)| (name.to_lowercase(), value.clone()))
                .collect()
        }))
    }

    async fn get_object(&self, key: &str) -> CloudResult<Option<Vec<u8>>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(bytes, _)| bytes.clone()))
    }

    async fn list_keys(&self, prefix: &str) -> CloudResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn create_container(&self) -> CloudResult<CreateOutcome> {
        Ok(*self.create_outcome.lock().unwrap())
    }
}

#[derive(Default)]
pub struct MemoryIndex {
    pub records: Mutex<HashMap<(String, String), FileRecord>>,
    pub puts: AtomicUsize,
    pub updates: AtomicUsize,
    /// Path whose `get` fails, for continue-on-error tests.
    pub fail_get_for: Mutex<Option<String>>,
}

#[async_trait]
impl MetadataIndex for MemoryIndex {
    async fn get(&self, owner: &str, path: &str) -> CloudResult<Option<FileRecord>> {
        if self.fail_get_for.lock().unwrap().as_deref() == Some(path) {
            return Err(CloudError::Index(format!("injected failure for {path}")));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(owner.to_string(), path.to_string()))
            .cloned())
    }

    async fn put(&self, record: &FileRecord) -> CloudResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert((record.owner.clone(), record.path.clone()), record.clone());
        Ok(())
    }

    async fn update(
        &self,
        owner: &str,
        path: &str,
        md5_hash: &str,
        last_updated: &str,
    ) -> CloudResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&(owner.to_string(), path.to_string())) {
            Some(record) => {
                record.md5_hash = md5_hash.to_string();
                record.last_updated = last_updated.to_string();
                Ok(())
            }
            None => Err(CloudError::RecordNotFound {
                owner: owner.to_string(),
                path: path.to_string(),
            }),
        }
    }
}
