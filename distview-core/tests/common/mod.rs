//! Test helpers shared by the integration tests
//!
//! Builds a small sample distribution on disk and packs it as a gzipped
//! tarball or a zip file, both wrapped in a `Foo-Bar-0.01/` directory.

#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub const WRAPPER: &str = "Foo-Bar-0.01";

pub const BAR_PM: &str = r#"package Foo::Bar;

use strict;
use warnings;

our $VERSION = '0.01';

sub new { bless {}, shift }

1;

__END__

=head1 NAME

Foo::Bar - Frobnicate bars

=cut
"#;

pub const TUTORIAL_POD: &str = "=head1 NAME\n\nFoo::Bar::Tutorial - Getting started\n\n=cut\n";

pub const META_YML: &str = r#"---
abstract: 'Frobnicate bars'
author:
  - 'Jane Doe <jane@example.org>'
  - 'John Roe <john@example.org>'
build_requires:
  Test::More: 0.88
configure_requires:
  Module::Build: 0.38
generated_by: 'Module::Build version 0.4224'
license: perl
meta-spec:
  url: http://module-build.sourceforge.net/META-spec-v1.4.html
  version: 1.4
name: Foo-Bar
provides:
  Foo::Bar:
    file: lib/Foo/Bar.pm
    version: 0.01
requires:
  perl: 5.006
resources:
  license: http://dev.perl.org/licenses/
version: 0.01
"#;

/// Relative paths in the sample distribution, sorted
pub const SAMPLE_FILES: &[&str] = &[
    "Build.PL",
    "Changes",
    "MANIFEST",
    "META.yml",
    "README",
    "bin/foobar",
    "lib/Foo/Bar.pm",
    "lib/Foo/Bar/Tutorial.pod",
    "t/00-load.t",
];

fn sample_contents(relative: &str) -> &'static str {
    match relative {
        "Build.PL" => "use Module::Build;\nModule::Build->new(module_name => 'Foo::Bar')->create_build_script;\n",
        "Changes" => "0.01  First release\n",
        "MANIFEST" => "Build.PL\nChanges\nMANIFEST\nMETA.yml\nREADME\nbin/foobar\nlib/Foo/Bar.pm\nlib/Foo/Bar/Tutorial.pod\nt/00-load.t\n",
        "META.yml" => META_YML,
        "README" => "Foo::Bar frobnicates bars.\n",
        "bin/foobar" => "#!/usr/bin/perl\nuse Foo::Bar;\nFoo::Bar->new;\n",
        "lib/Foo/Bar.pm" => BAR_PM,
        "lib/Foo/Bar/Tutorial.pod" => TUTORIAL_POD,
        "t/00-load.t" => "use Test::More tests => 1;\nuse_ok('Foo::Bar');\n",
        _ => "",
    }
}

/// Write the unpacked sample distribution below `root`
pub fn write_sample_tree(root: &Path) -> Result<()> {
    for relative in SAMPLE_FILES {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, sample_contents(relative))?;
    }
    Ok(())
}

/// Pack the sample distribution as `Foo-Bar-0.01.tar.gz` inside `dir`
pub fn create_sample_tarball(dir: &Path) -> Result<PathBuf> {
    let staging = tempfile::TempDir::new()?;
    let dist_dir = staging.path().join(WRAPPER);
    write_sample_tree(&dist_dir)?;

    let archive_path = dir.join(format!("{WRAPPER}.tar.gz"));
    let file = fs::File::create(&archive_path)?;
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(WRAPPER, &dist_dir)?;
    builder.into_inner()?.finish()?;

    Ok(archive_path)
}

/// Pack the sample distribution as `Foo-Bar-0.01.zip` inside `dir`
pub fn create_sample_zip(dir: &Path) -> Result<PathBuf> {
    let archive_path = dir.join(format!("{WRAPPER}.zip"));
    let file = fs::File::create(&archive_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    zip.add_directory(format!("{WRAPPER}/"), options)?;
    for relative in SAMPLE_FILES {
        zip.start_file(format!("{WRAPPER}/{relative}"), options)?;
        zip.write_all(sample_contents(relative).as_bytes())?;
    }
    zip.finish()?;

    Ok(archive_path)
}

/// Pack loose files into a tarball with no wrapper directory
pub fn create_flat_tarball(dir: &Path, files: &[(&str, &str)]) -> Result<PathBuf> {
    let archive_path = dir.join("flat.tar.gz");
    let file = fs::File::create(&archive_path)?;
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (relative, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, relative, content.as_bytes())?;
    }
    builder.into_inner()?.finish()?;

    Ok(archive_path)
}
