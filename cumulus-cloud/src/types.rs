//! Shared types for sync operations.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// Object metadata key carrying the human-readable local mtime.
pub const META_MODIFICATION_TIME: &str = "ModificationTime";
/// Object metadata key carrying the 32-hex-char plaintext digest.
pub const META_MD5_HASH: &str = "Md5Hash";

/// Index record tracking the last-known digest and timestamp for one
/// `(owner, path)`.
///
/// Created on a path's first upload; only `md5_hash` and `last_updated`
/// change on subsequent uploads. Records are never deleted by the sync
/// engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub owner: String,
    /// Relative path with forward-slash separators, unique per owner.
    pub path: String,
    pub last_updated: String,
    pub md5_hash: String,
    pub file_name: String,
    pub permissions: String,
}

/// Looks up an object metadata value by name, ignoring case.
///
/// S3 lowercases user metadata keys on retrieval, so a value stored under
/// `Md5Hash` comes back as `md5hash`.
pub fn metadata_value<'a>(metadata: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    metadata
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Formats a modification time as a human-readable local timestamp
/// (`%c`, e.g. `Thu Aug  6 14:02:11 2026`).
pub fn format_mtime(mtime: SystemTime) -> String {
    DateTime::<Local>::from(mtime).format("%c").to_string()
}
