//! Local tree enumeration.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CloudError, CloudResult};

/// One regular file found under the walk root.
#[derive(Clone, Debug)]
pub struct LocalFile {
    /// Path relative to the root, forward-slash separated.
    pub rel_path: String,
    pub abs_path: PathBuf,
}

/// Walks every regular file under `root`, lazily.
///
/// The root's own entry is excluded and directories are never yielded.
/// Symbolic links are not followed, so a cyclic link cannot loop the walk
/// and every file is reported at most once. Each call is a fresh traversal
/// with no shared cursor; ordering is unspecified. Unreadable entries and
/// non-UTF-8 paths surface as per-item errors so callers can skip and
/// continue.
pub fn walk(root: &Path) -> impl Iterator<Item = CloudResult<LocalFile>> + '_ {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(relative(root, entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(CloudError::Io(e.into()))),
        })
}

fn relative(root: &Path, abs_path: PathBuf) -> CloudResult<LocalFile> {
    let rel = abs_path.strip_prefix(root).map_err(|_| {
        CloudError::Config(format!(
            "walked entry {} is outside the root {}",
            abs_path.display(),
            root.display()
        ))
    })?;

    let mut rel_path = String::new();
    for component in rel.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| CloudError::NonUtf8Path(abs_path.display().to_string()))?;
        if !rel_path.is_empty() {
            rel_path.push('/');
        }
        rel_path.push_str(part);
    }

    Ok(LocalFile { rel_path, abs_path })
}
