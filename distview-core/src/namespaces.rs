//! Namespace declaration scanner for Perl module sources
//!
//! Finds `package NAME;`, `package NAME VERSION;` and `package NAME { ... }`
//! statements. POD blocks, comment lines and anything after `__END__` or
//! `__DATA__` are skipped. This is a line-oriented scan, not a parser, so a
//! `package` statement hidden inside a heredoc will still be reported.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::{DistError, Result};

static PACKAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bpackage\s+([A-Za-z_]\w*(?:::\w+)*)(?:\s+v?\d[\d._]*)?\s*[;{]",
    )
    .expect("package pattern is valid")
});

static POD_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^=[a-zA-Z]").expect("pod pattern is valid"));

/// Namespaces never reported as declared
const IGNORED_NAMESPACES: &[&str] = &["main"];

/// Extract declared namespaces from source text, in declaration order
pub fn namespaces_in(source: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut in_pod = false;

    for line in source.lines() {
        if in_pod {
            if line.starts_with("=cut") {
                in_pod = false;
            }
            continue;
        }

        if POD_START_RE.is_match(line) {
            in_pod = !line.starts_with("=cut");
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with("__END__") || trimmed.starts_with("__DATA__") {
            break;
        }
        if trimmed.starts_with('#') {
            continue;
        }

        for caps in PACKAGE_RE.captures_iter(line) {
            let Some(whole) = caps.get(0) else { continue };
            if !starts_statement(&line[..whole.start()]) {
                continue;
            }

            let name = &caps[1];
            if IGNORED_NAMESPACES.contains(&name) {
                continue;
            }
            if !found.iter().any(|n| n == name) {
                found.push(name.to_string());
            }
        }
    }

    found
}

/// A `package` keyword only counts at the start of a statement
fn starts_statement(before: &str) -> bool {
    matches!(before.trim_end().chars().last(), None | Some(';' | '{' | '}'))
}

/// Read a module file and extract its declared namespaces
///
/// Files that are not valid UTF-8 are decoded lossily.
pub fn scan_namespaces(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|source| DistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(namespaces_in(&String::from_utf8_lossy(&bytes)))
}
