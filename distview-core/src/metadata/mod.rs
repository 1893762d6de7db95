//! Distribution metadata (`META.yml` / `META.json`)
//!
//! Both schema generations are normalized into a single [`DistMetadata`]
//! record at parse time. Field contents are not validated: whatever the
//! author wrote is exposed as-is, apart from mapping 1.x layouts onto their
//! 2.x equivalents.

mod prereqs;
mod raw;

pub use prereqs::{Prereqs, Requirements};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::MetadataError;
use prereqs::LEGACY_KEYS;
use raw::{into_prereqs, into_requirements, RawLink, RawMeta};

/// Parsed distribution metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistMetadata {
    /// Metadata schema version and URL
    pub meta_spec: MetaSpec,
    pub name: Option<String>,
    pub version: Option<String>,
    /// One-line summary (`abstract` in the file)
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub licenses: Vec<String>,
    pub keywords: Vec<String>,
    /// Tool that wrote the metadata file
    pub generated_by: Option<String>,
    pub resources: Resources,
    /// Whether prerequisites are computed at configure time
    pub dynamic_config: bool,
    /// `stable`, `testing` or `unstable`
    pub release_status: Option<String>,
    pub prereqs: Prereqs,
    pub optional_features: BTreeMap<String, OptionalFeature>,
    pub no_index: NoIndex,
    pub provides: BTreeMap<String, ProvidedPackage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSpec {
    pub version: Option<String>,
    pub url: Option<String>,
}

/// Links published with the distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub homepage: Option<String>,
    pub license: Vec<String>,
    pub bugtracker: Option<Bugtracker>,
    pub repository: Option<Repository>,
    /// Resource keys outside the standard set, kept verbatim
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bugtracker {
    pub web: Option<String>,
    pub mailto: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub url: Option<String>,
    pub web: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A named optional feature and the prerequisites it pulls in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalFeature {
    pub description: Option<String>,
    pub prereqs: Prereqs,
}

/// Paths and names the author asked indexers to skip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoIndex {
    pub file: Vec<String>,
    pub directory: Vec<String>,
    pub package: Vec<String>,
    pub namespace: Vec<String>,
}

/// A package the distribution declares it provides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidedPackage {
    pub file: Option<String>,
    pub version: Option<String>,
}

impl NoIndex {
    /// Whether a relative file path falls under a `file` or `directory` rule
    pub fn excludes_path(&self, relative: &str) -> bool {
        self.file.iter().any(|f| f == relative)
            || self.directory.iter().any(|dir| {
                let dir = dir.trim_end_matches('/');
                relative
                    .strip_prefix(dir)
                    .map(|rest| rest.starts_with('/'))
                    .unwrap_or(false)
            })
    }

    /// Whether a namespace falls under a `package` or `namespace` rule
    pub fn excludes_namespace(&self, name: &str) -> bool {
        self.package.iter().any(|p| p == name)
            || self.namespace.iter().any(|ns| {
                name.strip_prefix(ns.as_str())
                    .map(|rest| rest.starts_with("::"))
                    .unwrap_or(false)
            })
    }
}

impl DistMetadata {
    /// Parse a `META.yml` style document
    pub fn from_yaml(content: &str) -> Result<Self, MetadataError> {
        let raw: RawMeta = serde_yaml_ng::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Parse a `META.json` style document
    ///
    /// Numeric scalars are turned into strings first so versions written
    /// without quotes are handled like quoted ones.
    pub fn from_json(content: &str) -> Result<Self, MetadataError> {
        let mut value: serde_json::Value = serde_json::from_str(content)?;
        stringify_numbers(&mut value);
        let raw: RawMeta = serde_json::from_value(value)?;
        Ok(Self::from_raw(raw))
    }

    /// Load a metadata file, choosing the parser by extension
    pub fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yml") | Some("yaml") => Self::from_yaml(&std::fs::read_to_string(path)?),
            Some("json") => Self::from_json(&std::fs::read_to_string(path)?),
            _ => Err(MetadataError::UnknownFormat(path.to_path_buf())),
        }
    }

    fn from_raw(mut raw: RawMeta) -> Self {
        let mut prereqs: Prereqs = raw.prereqs.take().map(into_prereqs).unwrap_or_default();
        for (key, phase, relationship) in LEGACY_KEYS {
            if let Some(requirements) = raw.legacy_requirements(key) {
                prereqs.extend(phase, relationship, into_requirements(requirements));
            }
        }

        let release_status = raw.release_status.or_else(|| {
            raw.version.as_ref().map(|version| {
                if version.contains('_') {
                    "testing".to_string()
                } else {
                    "stable".to_string()
                }
            })
        });

        let meta_spec = raw
            .meta_spec
            .map(|spec| MetaSpec {
                version: spec.version,
                url: spec.url,
            })
            .unwrap_or_default();

        let resources = raw.resources.map(convert_resources).unwrap_or_default();

        let optional_features = raw
            .optional_features
            .unwrap_or_default()
            .into_iter()
            .map(|(name, feature)| {
                let mut prereqs = feature.prereqs.map(into_prereqs).unwrap_or_default();
                if let Some(requires) = feature.requires {
                    prereqs.extend("runtime", "requires", into_requirements(requires));
                }
                if let Some(build_requires) = feature.build_requires {
                    prereqs.extend("build", "requires", into_requirements(build_requires));
                }
                (
                    name,
                    OptionalFeature {
                        description: feature.description,
                        prereqs,
                    },
                )
            })
            .collect();

        let no_index = raw
            .no_index
            .map(|rules| NoIndex {
                file: rules.file.map(|v| v.into_vec()).unwrap_or_default(),
                directory: rules.directory.map(|v| v.into_vec()).unwrap_or_default(),
                package: rules.package.map(|v| v.into_vec()).unwrap_or_default(),
                namespace: rules.namespace.map(|v| v.into_vec()).unwrap_or_default(),
            })
            .unwrap_or_default();

        let provides = raw
            .provides
            .unwrap_or_default()
            .into_iter()
            .map(|(name, provided)| {
                (
                    name,
                    ProvidedPackage {
                        file: provided.file,
                        version: provided.version,
                    },
                )
            })
            .collect();

        DistMetadata {
            meta_spec,
            name: raw.name,
            version: raw.version,
            abstract_: raw.abstract_,
            description: raw.description,
            authors: raw.author.map(|a| a.into_vec()).unwrap_or_default(),
            licenses: raw.license.map(|l| l.into_vec()).unwrap_or_default(),
            keywords: raw.keywords.map(|k| k.into_vec()).unwrap_or_default(),
            generated_by: raw.generated_by,
            resources,
            dynamic_config: raw.dynamic_config.unwrap_or(true),
            release_status,
            prereqs,
            optional_features,
            no_index,
            provides,
        }
    }
}

fn convert_resources(raw: raw::RawResources) -> Resources {
    let bugtracker = raw.bugtracker.map(|link| match link {
        RawLink::Url(web) => Bugtracker {
            web: Some(web),
            mailto: None,
        },
        RawLink::Detailed(detail) => Bugtracker {
            web: detail.web,
            mailto: detail.mailto,
        },
    });

    let repository = raw.repository.map(|link| match link {
        RawLink::Url(url) => Repository {
            url: Some(url),
            web: None,
            kind: None,
        },
        RawLink::Detailed(detail) => Repository {
            url: detail.url,
            web: detail.web,
            kind: detail.kind,
        },
    });

    Resources {
        homepage: raw.homepage,
        license: raw.license.map(|l| l.into_vec()).unwrap_or_default(),
        bugtracker,
        repository,
        extra: raw.extra,
    }
}

fn stringify_numbers(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Number(n) => *value = serde_json::Value::String(n.to_string()),
        serde_json::Value::Array(items) => items.iter_mut().for_each(stringify_numbers),
        serde_json::Value::Object(map) => map.values_mut().for_each(stringify_numbers),
        _ => {}
    }
}
