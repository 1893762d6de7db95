//! Unpacking an archive and re-homing its contents
//!
//! The archive is unpacked into a staging directory first. Distribution
//! archives wrap everything in one `Name-Version/` directory; when the
//! staging root holds exactly one directory, that component is stripped and
//! its contents are moved into the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::archive;
use crate::config::DistributionOptions;
use crate::error::ExtractError;

/// Allocate a fresh, uniquely named temporary directory
pub(crate) fn allocate_temp_dir(
    options: &DistributionOptions,
) -> std::io::Result<tempfile::TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("distview-");
    match &options.temp_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
}

/// Unpack `archive` and move its contents under `working_dir`
pub(crate) fn extract_into(
    archive_path: &Path,
    working_dir: &Path,
    options: &DistributionOptions,
) -> Result<(), ExtractError> {
    let staging = allocate_temp_dir(options).map_err(ExtractError::TempDir)?;
    archive::unpack(archive_path, staging.path())?;

    let source_root =
        wrapper_dir(staging.path())?.unwrap_or_else(|| staging.path().to_path_buf());
    rehome(&source_root, working_dir)
}

/// The single top-level directory of an unpacked archive, if there is one
fn wrapper_dir(staging: &Path) -> Result<Option<PathBuf>, ExtractError> {
    let entries: Vec<_> = fs::read_dir(staging)
        .map_err(|source| ExtractError::Rehome {
            path: staging.to_path_buf(),
            source,
        })?
        .filter_map(|e| e.ok())
        .collect();

    match entries.as_slice() {
        [only] if only.path().is_dir() => {
            debug!(wrapper = ?only.file_name(), "Stripping top-level archive directory");
            Ok(Some(only.path()))
        }
        _ => Ok(None),
    }
}

/// Move every entry below `source_root` to the same relative path under `dest`
fn rehome(source_root: &Path, dest: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(dest).map_err(|source| ExtractError::Rehome {
        path: dest.to_path_buf(),
        source,
    })?;

    // Collect first so moves don't disturb the walk
    let entries = WalkDir::new(source_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    for entry in entries {
        let Ok(relative) = entry.path().strip_prefix(source_root) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| ExtractError::Rehome {
                path: target.clone(),
                source,
            })?;
        } else {
            trace!(from = %entry.path().display(), to = %target.display(), "Moving entry");
            move_file(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Rename, falling back to copy and remove when crossing filesystems
fn move_file(from: &Path, to: &Path) -> Result<(), ExtractError> {
    let rehome_err = |source| ExtractError::Rehome {
        path: to.to_path_buf(),
        source,
    };

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(rehome_err)?;
    }

    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    fs::copy(from, to).map_err(rehome_err)?;
    fs::remove_file(from).map_err(rehome_err)?;
    Ok(())
}
