//! Distribution layout conventions and passthrough options
//!
//! Every field has a default matching the conventional CPAN layout, so
//! `DistributionOptions::default()` is enough for most callers. Options can
//! also be loaded from a YAML or JSON file; unknown keys are kept verbatim
//! in [`DistributionOptions::extra`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DistError, Result};

/// Options controlling how a distribution is located and classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionOptions {
    /// Files whose presence marks a directory as already unpacked
    pub build_markers: Vec<String>,

    /// Metadata file names, most preferred first
    pub metadata_files: Vec<String>,

    /// Extension of source modules scanned for namespace declarations
    pub module_extension: String,

    /// Extension of documentation files under the library root
    pub doc_extension: String,

    /// Top-level directory holding library code and documentation
    pub library_root: String,

    /// Top-level directories holding executables, in tie-break order
    pub script_roots: Vec<String>,

    /// Where temporary directories are allocated (system temp dir if unset)
    pub temp_root: Option<PathBuf>,

    /// Caller-supplied options carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            build_markers: vec!["Build.PL".to_string(), "Makefile.PL".to_string()],
            metadata_files: vec!["META.yml".to_string(), "META.json".to_string()],
            module_extension: ".pm".to_string(),
            doc_extension: ".pod".to_string(),
            library_root: "lib".to_string(),
            script_roots: vec!["bin".to_string(), "script".to_string()],
            temp_root: None,
            extra: BTreeMap::new(),
        }
    }
}

impl DistributionOptions {
    /// Parse options from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content)
            .map_err(|e| DistError::Configuration(format!("invalid options YAML: {e}")))
    }

    /// Parse options from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| DistError::Configuration(format!("invalid options JSON: {e}")))
    }

    /// Load options from a file, choosing JSON for `.json` and YAML otherwise
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DistError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Look up a passthrough option
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// Library root as a path prefix (`lib/`)
    pub(crate) fn library_prefix(&self) -> String {
        format!("{}/", self.library_root.trim_end_matches('/'))
    }
}
