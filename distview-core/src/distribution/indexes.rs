//! Namespace and script indexes derived from the file index

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::warn;

use crate::config::DistributionOptions;
use crate::error::Result;
use crate::metadata::NoIndex;
use crate::namespaces::scan_namespaces;
use crate::tree::FileIndex;

/// Namespace to the relative paths declaring or documenting it
pub type NamespaceIndex = BTreeMap<String, Vec<String>>;

/// Script path without its executable root to the full relative path
pub type ScriptIndex = BTreeMap<String, String>;

/// Namespace documented by a file under the library root
///
/// `lib/Foo/Bar.pod` documents `Foo::Bar`. Returns `None` for paths outside
/// the library root or without the documentation extension.
pub fn doc_namespace(relative: &str, options: &DistributionOptions) -> Option<String> {
    let stem = relative
        .strip_prefix(&options.library_prefix())?
        .strip_suffix(options.doc_extension.as_str())?;

    if stem.is_empty() {
        return None;
    }

    Some(stem.replace('/', "::"))
}

/// Build the namespace index in file index order
pub(crate) fn build_namespace_index(
    files: &FileIndex,
    options: &DistributionOptions,
) -> Result<NamespaceIndex> {
    let mut index = NamespaceIndex::new();

    for (relative, absolute) in files {
        if relative.ends_with(options.module_extension.as_str()) {
            for namespace in scan_namespaces(absolute)? {
                index.entry(namespace).or_default().push(relative.clone());
            }
        }

        if let Some(namespace) = doc_namespace(relative, options) {
            index.entry(namespace).or_default().push(relative.clone());
        }
    }

    Ok(index)
}

/// Build the script index
///
/// Roots are consulted in configured order; the first root to claim a
/// stripped name keeps it.
pub(crate) fn build_script_index(files: &FileIndex, options: &DistributionOptions) -> ScriptIndex {
    let mut index = ScriptIndex::new();

    for root in &options.script_roots {
        let prefix = format!("{}/", root.trim_end_matches('/'));

        for relative in files.keys() {
            let Some(stripped) = relative.strip_prefix(&prefix) else {
                continue;
            };

            match index.entry(stripped.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(relative.clone());
                }
                Entry::Occupied(existing) => {
                    warn!(
                        script = stripped,
                        kept = %existing.get(),
                        ignored = %relative,
                        "Script name claimed by an earlier root"
                    );
                }
            }
        }
    }

    index
}

/// Drop namespaces and paths the metadata excludes from indexing
pub(crate) fn filter_no_index(index: &NamespaceIndex, rules: &NoIndex) -> NamespaceIndex {
    index
        .iter()
        .filter(|(namespace, _)| !rules.excludes_namespace(namespace))
        .filter_map(|(namespace, paths)| {
            let kept: Vec<String> = paths
                .iter()
                .filter(|path| !rules.excludes_path(path))
                .cloned()
                .collect();
            (!kept.is_empty()).then(|| (namespace.clone(), kept))
        })
        .collect()
}
