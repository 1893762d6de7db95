//! File index built by walking a distribution root

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::trace;
use walkdir::WalkDir;

use crate::error::Result;

/// Relative path (forward-slash separated) to absolute path, ordered lexically
pub type FileIndex = BTreeMap<String, PathBuf>;

/// Join the components of `path` below `root` with forward slashes
///
/// Returns `None` for the root itself or for paths outside it.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let components: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    if components.is_empty() {
        None
    } else {
        Some(components.join("/"))
    }
}

/// Walk `root` and record every file beneath it
///
/// Directories are skipped; symlinks are followed so a linked file is
/// indexed like a regular one.
pub fn build_file_index(root: &Path) -> Result<FileIndex> {
    let mut files = FileIndex::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(key) = relative_key(root, entry.path()) {
            trace!(file = %key, "Indexed file");
            files.insert(key, entry.path().to_path_buf());
        }
    }

    Ok(files)
}
