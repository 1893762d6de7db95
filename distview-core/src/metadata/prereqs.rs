//! Prerequisite graph: phase -> relationship -> module -> version

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Module name to version requirement
pub type Requirements = BTreeMap<String, String>;

/// Prerequisites grouped by phase (`runtime`, `build`, ...) and
/// relationship (`requires`, `recommends`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prereqs(BTreeMap<String, BTreeMap<String, Requirements>>);

/// Legacy top-level prerequisite keys and where they land in the graph
pub(crate) const LEGACY_KEYS: &[(&str, &str, &str)] = &[
    ("requires", "runtime", "requires"),
    ("recommends", "runtime", "recommends"),
    ("conflicts", "runtime", "conflicts"),
    ("build_requires", "build", "requires"),
    ("configure_requires", "configure", "requires"),
    ("test_requires", "test", "requires"),
];

impl Prereqs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `requirements` into `phase`/`relationship`, later entries winning
    pub fn extend(&mut self, phase: &str, relationship: &str, requirements: Requirements) {
        if requirements.is_empty() {
            return;
        }
        self.0
            .entry(phase.to_string())
            .or_default()
            .entry(relationship.to_string())
            .or_default()
            .extend(requirements);
    }

    /// Requirements for one phase and relationship
    pub fn requirements(&self, phase: &str, relationship: &str) -> Option<&Requirements> {
        self.0.get(phase).and_then(|rels| rels.get(relationship))
    }

    /// Phases that declare at least one relationship
    pub fn phases(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Every module named anywhere in the graph, sorted and deduplicated
    pub fn modules(&self) -> Vec<&str> {
        let modules: BTreeSet<&str> = self
            .0
            .values()
            .flat_map(|rels| rels.values())
            .flat_map(|reqs| reqs.keys())
            .map(String::as_str)
            .collect();
        modules.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying graph
    pub fn as_map(&self) -> &BTreeMap<String, BTreeMap<String, Requirements>> {
        &self.0
    }
}

impl From<BTreeMap<String, BTreeMap<String, Requirements>>> for Prereqs {
    fn from(graph: BTreeMap<String, BTreeMap<String, Requirements>>) -> Self {
        let mut prereqs = Prereqs::new();
        for (phase, rels) in graph {
            for (relationship, reqs) in rels {
                prereqs.extend(&phase, &relationship, reqs);
            }
        }
        prereqs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reqs(pairs: &[(&str, &str)]) -> Requirements {
        pairs
            .iter()
            .map(|(m, v)| (m.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extend_merges_and_skips_empty() {
        let mut prereqs = Prereqs::new();
        prereqs.extend("runtime", "requires", reqs(&[("perl", "5.006")]));
        prereqs.extend("runtime", "requires", reqs(&[("Carp", "0")]));
        prereqs.extend("build", "requires", Requirements::new());

        let runtime = prereqs.requirements("runtime", "requires").unwrap();
        assert_eq!(runtime.len(), 2);
        assert_eq!(runtime["perl"], "5.006");
        assert!(prereqs.requirements("build", "requires").is_none());
        assert_eq!(prereqs.phases().collect::<Vec<_>>(), vec!["runtime"]);
    }

    #[test]
    fn test_modules_are_deduplicated_across_phases() {
        let mut prereqs = Prereqs::new();
        prereqs.extend("runtime", "requires", reqs(&[("Carp", "0"), ("perl", "5.008")]));
        prereqs.extend("test", "requires", reqs(&[("Test::More", "0.88"), ("Carp", "0")]));

        assert_eq!(prereqs.modules(), vec!["Carp", "Test::More", "perl"]);
    }
}
