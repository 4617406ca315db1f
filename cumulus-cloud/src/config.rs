//! Sync configuration.

use cumulus_crypto::EnvelopeKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{CloudError, CloudResult};

/// Configuration for the sync engine and its service clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// S3 bucket holding the synced objects.
    pub bucket: String,

    /// AWS region, also used as the bucket location constraint.
    pub region: String,

    /// Optional S3 endpoint override (MinIO in testing).
    pub s3_endpoint: Option<String>,

    /// DynamoDB table backing the metadata index.
    pub index_table: String,

    /// Optional DynamoDB endpoint override (DynamoDB Local).
    pub index_endpoint: Option<String>,

    /// Owner written into every index record; paths are unique per owner.
    pub owner: String,

    /// Named encryption keys selectable with `--encrypt <alias>`.
    pub keys: HashMap<String, KeySpec>,
}

/// One named encryption key: a passphrase for the client-side envelope, or
/// a KMS key id for server-side encryption.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    Passphrase { passphrase: String },
    Kms { kms_key_id: String },
}

/// A key alias resolved to its concrete mechanism.
#[derive(Debug)]
pub enum ResolvedKey {
    /// Client-side envelope encryption with the derived key.
    Envelope(EnvelopeKey),
    /// Server-side encryption under this KMS key id.
    ServerSide(String),
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bucket: "cumulus-backup".to_string(),
            region: "ap-southeast-2".to_string(),
            s3_endpoint: None,
            index_table: "CloudFiles".to_string(),
            index_endpoint: None,
            owner: "cumulus".to_string(),
            keys: HashMap::new(),
        }
    }
}

impl SyncConfig {
    /// Loads a TOML config file; missing fields fall back to defaults.
    pub fn load(path: &Path) -> CloudResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| CloudError::Config(format!("{}: {e}", path.display())))
    }

    /// Resolves a key alias from the `[keys]` table.
    pub fn resolve_key(&self, alias: &str) -> CloudResult<ResolvedKey> {
        match self.keys.get(alias) {
            Some(KeySpec::Passphrase { passphrase }) => {
                Ok(ResolvedKey::Envelope(EnvelopeKey::derive(passphrase)))
            }
            Some(KeySpec::Kms { kms_key_id }) => Ok(ResolvedKey::ServerSide(kms_key_id.clone())),
            None => Err(CloudError::UnknownKeyAlias(alias.to_string())),
        }
    }
}
