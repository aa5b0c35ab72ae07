//! This crate implements handling of JVM mapping files and remapping of
//! compiled classes.
//!
//! Mappings in the Proguard, SRG, CSRG, TSRG and Tiny formats are parsed
//! into one model, which can be reversed, swapped between namespaces and
//! written back out. A [`Remapper`] resolves class, member and local
//! variable names against that model and a class hierarchy, and the
//! [`rewrite`] pipeline applies it to class files.
//!
//! # Examples
//!
//! ```
//! use jvm_remap::{HierarchyGraph, MappingFormat, Remapper};
//!
//! let mut mapping = MappingFormat::Proguard
//!     .parse(
//!         r#"com.example.Foo -> a:
//!     int count -> b
//!     void run() -> c"#,
//!     )
//!     .unwrap();
//!
//! // remap from the original names to the obfuscated ones
//! mapping.reverse().unwrap();
//!
//! let hierarchy = HierarchyGraph::default();
//! let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
//! assert_eq!(remapper.map_class_name("com/example/Foo"), "a");
//! assert_eq!(remapper.map_field_name("com/example/Foo", "count"), "b");
//! assert_eq!(remapper.map_method_name("com/example/Foo", "run", "()V"), "c");
//! assert_eq!(remapper.map_descriptor("[Lcom/example/Foo;"), "[La;");
//! ```

#![warn(missing_docs)]

pub mod classfile;
pub mod descriptor;
pub mod format;
pub mod hierarchy;
pub mod manifest;
pub mod mapping;
pub mod remapper;
pub mod rewrite;
pub mod session;
mod utils;

use thiserror::Error;

pub use classfile::{ClassFile, ClassFileError};
pub use format::{GenerateError, MappingFormat, ParseError};
pub use hierarchy::{HierarchyGraph, MixinRefmap};
pub use manifest::ManifestError;
pub use mapping::{ClassMapping, ClassifiedMapping, Mapping, MappingError, Names};
pub use remapper::{Remapper, SignatureKind};
pub use rewrite::{Pipeline, RewriteError, VariableLedger};
pub use session::{BatchReport, ConfigError, Entry, RemapOptions, Session};

/// Any error raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Mapping text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A mapping could not be written.
    #[error(transparent)]
    Generate(#[from] GenerateError),
    /// A mapping operation failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// A class file is malformed.
    #[error(transparent)]
    ClassFile(#[from] ClassFileError),
    /// A class could not be rewritten.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    /// A manifest is malformed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// Invalid options.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A ledger or refmap is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
