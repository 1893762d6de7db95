//! Lazy, read-only access to a source distribution
//!
//! A [`Distribution`] is built from an archive, a directory, or both. Nothing
//! touches the filesystem until an accessor needs it; every derived value is
//! then computed once and cached for the lifetime of the instance.
//!
//! ```text
//! archive ──unpack──▶ staging dir ──strip wrapper, move──▶ working dir
//!                                                              │
//!                                                         walk once
//!                                                              ▼
//!                                                          FileIndex
//!                                         ┌───────────────┬────┴─────────┐
//!                                         ▼               ▼              ▼
//!                                     metadata      namespace index  script index
//! ```
//!
//! # Concurrency
//!
//! The caches are single-threaded cells, so `Distribution` is `Send` but not
//! `Sync`. Share one across threads behind a `Mutex`, or build one per thread.
//!
//! Temporary working directories allocated for archive-only distributions
//! are left on disk after the instance is dropped.

mod extract;
mod indexes;

#[cfg(test)]
mod tests;

pub use indexes::{doc_namespace, NamespaceIndex, ScriptIndex};

use chrono::{DateTime, Utc};
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DistributionOptions;
use crate::error::{DistError, Result};
use crate::metadata::{DistMetadata, ProvidedPackage};
use crate::tree::{build_file_index, FileIndex};

/// What a call to [`Distribution::extract`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The archive was unpacked into the working directory
    Extracted,
    /// A build marker was already present; nothing was unpacked
    AlreadyExtracted,
    /// No archive is configured
    NoArchive,
}

/// A distribution archive and/or its unpacked directory
#[derive(Debug)]
pub struct Distribution {
    archive: Option<PathBuf>,
    directory: Option<PathBuf>,
    options: DistributionOptions,

    working_dir: OnceCell<PathBuf>,
    /// Set once this instance has unpacked its archive
    extracted: OnceCell<()>,
    files: OnceCell<FileIndex>,
    metadata: OnceCell<Option<DistMetadata>>,
    namespaces: OnceCell<NamespaceIndex>,
    scripts: OnceCell<ScriptIndex>,
}

/// Builder for [`Distribution`] with options and passthrough settings
#[derive(Debug, Default)]
pub struct DistributionBuilder {
    archive: Option<PathBuf>,
    directory: Option<PathBuf>,
    options: DistributionOptions,
}

impl DistributionBuilder {
    /// Archive to unpack
    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive = Some(path.into());
        self
    }

    /// Directory holding (or receiving) the unpacked distribution
    pub fn directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directory = Some(path.into());
        self
    }

    /// Replace the layout options wholesale
    pub fn options(mut self, options: DistributionOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a single passthrough option
    pub fn option(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.options.extra.insert(key.into(), value.into());
        self
    }

    /// Finish construction
    ///
    /// Fails with [`DistError::Configuration`] when neither an archive nor a
    /// directory was given. With both, extraction runs immediately.
    pub fn build(self) -> Result<Distribution> {
        if self.archive.is_none() && self.directory.is_none() {
            return Err(DistError::Configuration(
                "an archive path or a directory is required".to_string(),
            ));
        }

        let eager = self.archive.is_some() && self.directory.is_some();
        let dist = Distribution::new(self.archive, self.directory, self.options);

        if eager {
            dist.extract()?;
        }

        Ok(dist)
    }
}

impl Distribution {
    fn new(
        archive: Option<PathBuf>,
        directory: Option<PathBuf>,
        options: DistributionOptions,
    ) -> Self {
        Self {
            archive,
            directory,
            options,
            working_dir: OnceCell::new(),
            extracted: OnceCell::new(),
            files: OnceCell::new(),
            metadata: OnceCell::new(),
            namespaces: OnceCell::new(),
            scripts: OnceCell::new(),
        }
    }

    pub fn builder() -> DistributionBuilder {
        DistributionBuilder::default()
    }

    /// Distribution backed by an archive, unpacked on first access
    pub fn from_archive(path: impl Into<PathBuf>) -> Self {
        Self::new(Some(path.into()), None, DistributionOptions::default())
    }

    /// Distribution backed by an already unpacked directory
    pub fn from_directory(path: impl Into<PathBuf>) -> Self {
        Self::new(None, Some(path.into()), DistributionOptions::default())
    }

    /// Unpack `archive` into `directory` now, unless it already holds a build marker
    pub fn from_both(
        archive: impl Into<PathBuf>,
        directory: impl Into<PathBuf>,
    ) -> Result<Self> {
        Self::builder().archive(archive).directory(directory).build()
    }

    /// Open a path, treating directories as unpacked and files as archives
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            Ok(Self::from_directory(path))
        } else if path.is_file() {
            Ok(Self::from_archive(path))
        } else {
            Err(DistError::NotFound { path })
        }
    }

    pub fn archive_path(&self) -> Option<&Path> {
        self.archive.as_deref()
    }

    pub fn directory_path(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn options(&self) -> &DistributionOptions {
        &self.options
    }

    /// Directory the distribution is read from
    ///
    /// The configured directory if there is one, otherwise a fresh temporary
    /// directory allocated on first call.
    pub fn working_dir(&self) -> Result<&Path> {
        self.working_dir
            .get_or_try_init(|| match &self.directory {
                Some(dir) => Ok(dir.clone()),
                None => {
                    let temp = extract::allocate_temp_dir(&self.options).map_err(|source| {
                        DistError::Io {
                            path: self
                                .options
                                .temp_root
                                .clone()
                                .unwrap_or_else(std::env::temp_dir),
                            source,
                        }
                    })?;
                    let path = temp.keep();
                    debug!(dir = %path.display(), "Allocated working directory");
                    Ok(path)
                }
            })
            .map(PathBuf::as_path)
    }

    /// Whether the archive has been unpacked, either by this instance or
    /// earlier (the working directory holds a build marker)
    pub fn is_extracted(&self) -> Result<bool> {
        if self.extracted.get().is_some() {
            return Ok(true);
        }
        let root = self.working_dir()?;
        Ok(self
            .options
            .build_markers
            .iter()
            .any(|marker| root.join(marker).is_file()))
    }

    /// Unpack the archive into the working directory if that is still needed
    pub fn extract(&self) -> Result<ExtractOutcome> {
        let Some(archive) = &self.archive else {
            debug!("No archive configured, nothing to extract");
            return Ok(ExtractOutcome::NoArchive);
        };

        if self.is_extracted()? {
            debug!(archive = %archive.display(), "Already extracted, skipping");
            return Ok(ExtractOutcome::AlreadyExtracted);
        }

        let working_dir = self.working_dir()?;
        extract::extract_into(archive, working_dir, &self.options).map_err(|source| {
            DistError::Extraction {
                archive: archive.clone(),
                source,
            }
        })?;

        let _ = self.extracted.set(());
        info!(
            archive = %archive.display(),
            dir = %working_dir.display(),
            "Extracted distribution"
        );
        Ok(ExtractOutcome::Extracted)
    }

    /// Every file in the distribution, keyed by relative path
    pub fn files(&self) -> Result<&FileIndex> {
        self.files.get_or_try_init(|| {
            self.extract()?;
            let root = self.working_dir()?;
            let files = build_file_index(root)?;
            debug!(count = files.len(), root = %root.display(), "Built file index");
            Ok(files)
        })
    }

    /// Absolute path of a file given its relative path
    pub fn file(&self, relative: &str) -> Result<Option<&Path>> {
        Ok(self.files()?.get(relative).map(PathBuf::as_path))
    }

    /// Parsed metadata, or `None` if no metadata file is present
    ///
    /// Candidates are tried in preference order. If a present candidate
    /// fails to parse, the next one is tried; the first failure is returned
    /// when none parse.
    pub fn metadata(&self) -> Result<Option<&DistMetadata>> {
        self.metadata
            .get_or_try_init(|| {
                let files = self.files()?;
                let mut first_error = None;

                for name in &self.options.metadata_files {
                    let Some(path) = files.get(name) else {
                        continue;
                    };

                    match DistMetadata::from_path(path) {
                        Ok(meta) => {
                            debug!(file = %name, "Loaded metadata");
                            return Ok(Some(meta));
                        }
                        Err(source) => {
                            warn!(file = %name, error = %source, "Unreadable metadata file");
                            first_error.get_or_insert(DistError::Metadata {
                                path: path.clone(),
                                source,
                            });
                        }
                    }
                }

                match first_error {
                    Some(err) => Err(err),
                    None => Ok(None),
                }
            })
            .map(Option::as_ref)
    }

    pub fn name(&self) -> Result<Option<&str>> {
        Ok(self.metadata()?.and_then(|m| m.name.as_deref()))
    }

    pub fn version(&self) -> Result<Option<&str>> {
        Ok(self.metadata()?.and_then(|m| m.version.as_deref()))
    }

    pub fn abstract_(&self) -> Result<Option<&str>> {
        Ok(self.metadata()?.and_then(|m| m.abstract_.as_deref()))
    }

    pub fn release_status(&self) -> Result<Option<&str>> {
        Ok(self.metadata()?.and_then(|m| m.release_status.as_deref()))
    }

    pub fn authors(&self) -> Result<&[String]> {
        Ok(self.metadata()?.map(|m| m.authors.as_slice()).unwrap_or(&[]))
    }

    pub fn licenses(&self) -> Result<&[String]> {
        Ok(self.metadata()?.map(|m| m.licenses.as_slice()).unwrap_or(&[]))
    }

    /// Namespaces declared by modules or documented under the library root
    pub fn namespaces(&self) -> Result<&NamespaceIndex> {
        self.namespaces.get_or_try_init(|| {
            let index = indexes::build_namespace_index(self.files()?, &self.options)?;
            debug!(count = index.len(), "Built namespace index");
            Ok(index)
        })
    }

    /// Files declaring or documenting `name`
    pub fn namespace(&self, name: &str) -> Result<Option<&[String]>> {
        Ok(self.namespaces()?.get(name).map(Vec::as_slice))
    }

    /// Namespace index with the metadata's `no_index` rules applied
    pub fn indexable_namespaces(&self) -> Result<NamespaceIndex> {
        let namespaces = self.namespaces()?;
        Ok(match self.metadata()? {
            Some(meta) => indexes::filter_no_index(namespaces, &meta.no_index),
            None => namespaces.clone(),
        })
    }

    /// Packages the distribution provides
    ///
    /// Uses the metadata's `provides` section when it has one, otherwise the
    /// first module file of every indexable namespace.
    pub fn provides(&self) -> Result<BTreeMap<String, ProvidedPackage>> {
        if let Some(meta) = self.metadata()? {
            if !meta.provides.is_empty() {
                return Ok(meta.provides.clone());
            }
        }

        let extension = self.options.module_extension.as_str();
        Ok(self
            .indexable_namespaces()?
            .into_iter()
            .filter_map(|(namespace, paths)| {
                let file = paths.into_iter().find(|p| p.ends_with(extension))?;
                Some((
                    namespace,
                    ProvidedPackage {
                        file: Some(file),
                        version: None,
                    },
                ))
            })
            .collect())
    }

    /// Executables keyed by their path below the executable root
    pub fn scripts(&self) -> Result<&ScriptIndex> {
        self.scripts.get_or_try_init(|| {
            let index = indexes::build_script_index(self.files()?, &self.options);
            debug!(count = index.len(), "Built script index");
            Ok(index)
        })
    }

    /// Full relative path of a script
    pub fn script(&self, name: &str) -> Result<Option<&str>> {
        Ok(self.scripts()?.get(name).map(String::as_str))
    }

    /// Modification time of the archive, or of the directory if there is no archive
    pub fn last_modified(&self) -> Result<DateTime<Utc>> {
        let path = self
            .archive
            .as_deref()
            .or(self.directory.as_deref())
            .ok_or_else(|| DistError::Configuration("no path to inspect".to_string()))?;

        let metadata = std::fs::metadata(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => DistError::NotFound {
                path: path.to_path_buf(),
            },
            _ => DistError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let modified = metadata.modified().map_err(|source| DistError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(DateTime::<Utc>::from(modified))
    }
}
