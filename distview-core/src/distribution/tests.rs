//! Unit tests for directory-backed distributions

use super::*;
use std::fs;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Unpacked layout with modules, docs, scripts and a META.yml
fn sample_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "Makefile.PL", "use ExtUtils::MakeMaker;\n");
    write(root, "META.yml", "name: Sample-Dist\nversion: 0.02\nauthor: [Someone]\n");
    write(root, "lib/Sample/Dist.pm", "package Sample::Dist;\n1;\n");
    write(
        root,
        "lib/Sample/Dist/Parts.pm",
        "package Sample::Dist::Parts;\npackage Sample::Dist;\n1;\n",
    );
    write(root, "lib/Sample/Dist/Guide.pod", "=head1 NAME\n\n=cut\n");
    write(root, "bin/sample", "#!/usr/bin/perl\n");
    write(root, "script/sample", "#!/usr/bin/perl\n");
    write(root, "script/other", "#!/usr/bin/perl\n");
    temp_dir
}

#[test]
fn test_builder_without_paths_is_a_configuration_error() {
    let result = Distribution::builder().option("mirror", "local").build();
    assert!(matches!(result, Err(DistError::Configuration(_))));
}

#[test]
fn test_directory_only_never_extracts() {
    let dir = sample_dir();
    let dist = Distribution::from_directory(dir.path());

    assert_eq!(dist.extract().unwrap(), ExtractOutcome::NoArchive);
    assert_eq!(dist.working_dir().unwrap(), dir.path());
    assert!(dist.is_extracted().unwrap());
}

#[test]
fn test_open_dispatches_on_path_kind() {
    let dir = sample_dir();
    let opened = Distribution::open(dir.path()).unwrap();
    assert_eq!(opened.directory_path(), Some(dir.path()));
    assert!(opened.archive_path().is_none());

    let file = dir.path().join("Makefile.PL");
    let opened = Distribution::open(&file).unwrap();
    assert_eq!(opened.archive_path(), Some(file.as_path()));

    let missing = Distribution::open(dir.path().join("nope.tar.gz"));
    assert!(matches!(missing, Err(DistError::NotFound { .. })));
}

#[test]
fn test_file_lookup() {
    let dir = sample_dir();
    let dist = Distribution::from_directory(dir.path());

    assert_eq!(
        dist.file("lib/Sample/Dist.pm").unwrap(),
        Some(dir.path().join("lib/Sample/Dist.pm").as_path())
    );
    assert_eq!(dist.file("lib/Missing.pm").unwrap(), None);
}

#[test]
fn test_namespaces_accumulate_across_files() {
    let dir = sample_dir();
    let dist = Distribution::from_directory(dir.path());

    let namespaces = dist.namespaces().unwrap();
    assert_eq!(
        namespaces["Sample::Dist"],
        vec!["lib/Sample/Dist.pm", "lib/Sample/Dist/Parts.pm"]
    );
    assert_eq!(
        dist.namespace("Sample::Dist::Guide").unwrap(),
        Some(&["lib/Sample/Dist/Guide.pod".to_string()][..])
    );
    assert_eq!(dist.namespace("Unknown::Thing").unwrap(), None);
}

#[test]
fn test_scripts_prefer_bin_over_script() {
    let dir = sample_dir();
    let dist = Distribution::from_directory(dir.path());

    assert_eq!(dist.script("sample").unwrap(), Some("bin/sample"));
    assert_eq!(dist.script("other").unwrap(), Some("script/other"));
    assert_eq!(dist.scripts().unwrap().len(), 2);
}

#[test]
fn test_file_index_is_cached() {
    let dir = sample_dir();
    let dist = Distribution::from_directory(dir.path());

    let before = dist.files().unwrap().clone();
    write(dir.path(), "lib/Sample/Late.pm", "package Sample::Late;\n");
    let after = dist.files().unwrap();

    assert_eq!(&before, after);
    assert!(dist.file("lib/Sample/Late.pm").unwrap().is_none());
    assert!(dist.namespace("Sample::Late").unwrap().is_none());
}

#[test]
fn test_missing_metadata_leaves_accessors_empty() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "lib/Bare.pm", "package Bare;\n");
    let dist = Distribution::from_directory(temp_dir.path());

    assert!(dist.metadata().unwrap().is_none());
    assert!(dist.name().unwrap().is_none());
    assert!(dist.version().unwrap().is_none());
    assert!(dist.authors().unwrap().is_empty());
    assert!(dist.licenses().unwrap().is_empty());
}

#[test]
fn test_metadata_prefers_yaml_and_falls_back_to_json() {
    let dir = sample_dir();
    write(dir.path(), "META.json", r#"{"name": "From-Json", "version": "9"}"#);
    let dist = Distribution::from_directory(dir.path());
    assert_eq!(dist.name().unwrap(), Some("Sample-Dist"));
    assert_eq!(dist.version().unwrap(), Some("0.02"));
    assert_eq!(dist.authors().unwrap(), ["Someone".to_string()]);

    write(dir.path(), "META.yml", "name: [broken\n");
    let dist = Distribution::from_directory(dir.path());
    assert_eq!(dist.name().unwrap(), Some("From-Json"));
}

#[test]
fn test_unparseable_metadata_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "META.json", "{ nope");
    let dist = Distribution::from_directory(temp_dir.path());

    assert!(matches!(dist.metadata(), Err(DistError::Metadata { .. })));
}

#[test]
fn test_provides_derived_from_namespaces() {
    let dir = sample_dir();
    write(
        dir.path(),
        "META.yml",
        "name: Sample-Dist\nno_index:\n  namespace: [Sample::Dist]\n",
    );
    let dist = Distribution::from_directory(dir.path());

    let provides = dist.provides().unwrap();
    // Everything below Sample::Dist is excluded, the pod-only namespace has no module
    assert_eq!(provides.keys().collect::<Vec<_>>(), vec!["Sample::Dist"]);
    assert_eq!(
        provides["Sample::Dist"].file.as_deref(),
        Some("lib/Sample/Dist.pm")
    );
}

#[test]
fn test_last_modified_of_directory() {
    let dir = sample_dir();
    let dist = Distribution::from_directory(dir.path());

    let modified = dist.last_modified().unwrap();
    assert!(modified <= Utc::now());

    let gone = Distribution::from_directory(dir.path().join("vanished"));
    assert!(matches!(
        gone.last_modified(),
        Err(DistError::NotFound { .. })
    ));
}
