//! On-disk shapes of the metadata file
//!
//! One permissive record accepts both the 1.x (`META.yml`) and 2.x
//! (`META.json`) layouts. Version-bearing fields are plain `String`s so a
//! YAML scalar such as `1.10` is kept exactly as written; untagged enums are
//! only used for fields that never carry versions.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use super::prereqs::{Prereqs, Requirements};

pub(crate) type RawRequirements = BTreeMap<String, RawVersion>;

pub(crate) type PrereqGraph = BTreeMap<String, BTreeMap<String, RawRequirements>>;

/// Version of a single requirement
///
/// A null or blank version means "any version" and is stored as `"0"`.
#[derive(Debug)]
pub(crate) struct RawVersion(String);

impl<'de> Deserialize<'de> for RawVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = Option::<String>::deserialize(deserializer)?;
        Ok(match version {
            Some(v) if !v.trim().is_empty() && v.trim() != "~" => RawVersion(v),
            _ => RawVersion("0".to_string()),
        })
    }
}

pub(crate) fn into_requirements(raw: RawRequirements) -> Requirements {
    raw.into_iter()
        .map(|(module, RawVersion(version))| (module, version))
        .collect()
}

pub(crate) fn into_prereqs(graph: PrereqGraph) -> Prereqs {
    let graph: BTreeMap<String, BTreeMap<String, Requirements>> = graph
        .into_iter()
        .map(|(phase, relationships)| {
            let relationships = relationships
                .into_iter()
                .map(|(relationship, raw)| (relationship, into_requirements(raw)))
                .collect();
            (phase, relationships)
        })
        .collect();
    Prereqs::from(graph)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawMeta {
    #[serde(rename = "meta-spec")]
    pub meta_spec: Option<RawMetaSpec>,
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub description: Option<String>,
    pub author: Option<OneOrMany>,
    pub license: Option<OneOrMany>,
    pub keywords: Option<OneOrMany>,
    pub generated_by: Option<String>,
    pub resources: Option<RawResources>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub dynamic_config: Option<bool>,
    pub release_status: Option<String>,
    pub prereqs: Option<PrereqGraph>,
    pub requires: Option<RawRequirements>,
    pub recommends: Option<RawRequirements>,
    pub conflicts: Option<RawRequirements>,
    pub build_requires: Option<RawRequirements>,
    pub configure_requires: Option<RawRequirements>,
    pub test_requires: Option<RawRequirements>,
    #[serde(deserialize_with = "deserialize_features")]
    pub optional_features: Option<BTreeMap<String, RawFeature>>,
    #[serde(alias = "private")]
    pub no_index: Option<RawNoIndex>,
    pub provides: Option<BTreeMap<String, RawProvided>>,
}

impl RawMeta {
    /// Legacy top-level prerequisite map by key name
    pub fn legacy_requirements(&mut self, key: &str) -> Option<RawRequirements> {
        match key {
            "requires" => self.requires.take(),
            "recommends" => self.recommends.take(),
            "conflicts" => self.conflicts.take(),
            "build_requires" => self.build_requires.take(),
            "configure_requires" => self.configure_requires.take(),
            "test_requires" => self.test_requires.take(),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawMetaSpec {
    pub version: Option<String>,
    pub url: Option<String>,
}

/// A scalar or a list of scalars
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawResources {
    pub homepage: Option<String>,
    pub license: Option<OneOrMany>,
    pub bugtracker: Option<RawLink<RawBugtracker>>,
    pub repository: Option<RawLink<RawRepository>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 1.x resources are bare URLs, 2.x resources are maps
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawLink<T> {
    Url(String),
    Detailed(T),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawBugtracker {
    pub web: Option<String>,
    pub mailto: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawRepository {
    pub url: Option<String>,
    pub web: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawFeature {
    pub description: Option<String>,
    pub prereqs: Option<PrereqGraph>,
    pub requires: Option<RawRequirements>,
    pub build_requires: Option<RawRequirements>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawNoIndex {
    pub file: Option<OneOrMany>,
    #[serde(alias = "dir")]
    pub directory: Option<OneOrMany>,
    pub package: Option<OneOrMany>,
    pub namespace: Option<OneOrMany>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawProvided {
    pub file: Option<String>,
    pub version: Option<String>,
}

/// Accept `true`/`false`, `0`/`1` and their string spellings
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = Option<bool>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean, 0 or 1")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v != 0))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v != 0))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            match v.trim() {
                "" => Ok(None),
                "1" | "true" => Ok(Some(true)),
                "0" | "false" => Ok(Some(false)),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(FlagVisitor)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// Accept the 2.x map of features as well as the 1.x list of
/// single-feature maps, folding the list into one map
fn deserialize_features<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, RawFeature>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FeaturesVisitor;

    impl<'de> Visitor<'de> for FeaturesVisitor {
        type Value = Option<BTreeMap<String, RawFeature>>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of features or a list of feature maps")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut features = BTreeMap::new();
            while let Some((name, feature)) = map.next_entry::<String, RawFeature>()? {
                features.insert(name, feature);
            }
            Ok(Some(features))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut features = BTreeMap::new();
            while let Some(entry) = seq.next_element::<BTreeMap<String, RawFeature>>()? {
                features.extend(entry);
            }
            Ok(Some(features))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            d.deserialize_any(FeaturesVisitor)
        }
    }

    deserializer.deserialize_any(FeaturesVisitor)
}
