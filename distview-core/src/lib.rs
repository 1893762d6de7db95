//! distview - read-only introspection of source distributions
//!
//! Opens a distribution archive (`.tar.gz`, `.tar`, `.zip`) or an unpacked
//! directory and exposes its files, its `META.yml`/`META.json` metadata, the
//! namespaces its modules declare and the scripts it ships.
//!
//! ```no_run
//! use distview_core::Distribution;
//!
//! # fn main() -> distview_core::Result<()> {
//! let dist = Distribution::from_archive("Foo-Bar-0.01.tar.gz");
//! println!("{:?} {:?}", dist.name()?, dist.version()?);
//! for (namespace, files) in dist.namespaces()? {
//!     println!("{namespace}: {files:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod distribution;
pub mod error;
pub mod metadata;
pub mod namespaces;
pub mod tree;

pub use config::DistributionOptions;
pub use distribution::{
    Distribution, DistributionBuilder, ExtractOutcome, NamespaceIndex, ScriptIndex,
};
pub use error::{DistError, ExtractError, MetadataError, Result};
pub use metadata::DistMetadata;
pub use tree::FileIndex;
