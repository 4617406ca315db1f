//! Streaming content digests for change detection.

use md5::{Digest, Md5};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::CloudResult;

const CHUNK_SIZE: usize = 4096;

/// Computes a file's MD5 digest as 32 lowercase hex characters.
///
/// Reads in fixed-size chunks so memory stays bounded regardless of file
/// size. MD5 is change detection here, not a security boundary; it matches
/// the digest format stored in object metadata and index records.
pub async fn file_md5(path: &Path) -> CloudResult<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
