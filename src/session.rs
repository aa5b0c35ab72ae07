//! Configuration and batch remapping of archive entries.
//!
//! A [`Session`] owns a validated mapping and its options. Running it over
//! a batch of entries first scans every class into a hierarchy, then
//! rewrites all classes in parallel against the frozen hierarchy.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::format::MappingFormat;
use crate::hierarchy::{HierarchyGraph, MixinRefmap};
use crate::manifest::clear_entry_sections;
use crate::mapping::{ClassifiedMapping, MappingError};
use crate::remapper::Remapper;
use crate::rewrite::{Pipeline, VariableLedger};
use crate::Error;

const MANIFEST: &str = "META-INF/MANIFEST.MF";
const SIGNATURE_EXTENSIONS: [&str; 4] = [".SF", ".RSA", ".DSA", ".EC"];

/// Options of a remapping run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RemapOptions {
    /// Format of the mapping text, needed by [`Session::from_text`].
    pub format: Option<MappingFormat>,
    /// Reverse a paired mapping before remapping.
    pub reverse: bool,
    /// Swap the unmapped namespace of a namespaced mapping with this one.
    pub swap_to: Option<String>,
    /// Namespace the input classes are in. Defaults to the unmapped one.
    pub source_namespace: Option<String>,
    /// Namespace to remap to. Required for namespaced mappings.
    pub target_namespace: Option<String>,
    /// Synthesize local variable names the mapping does not provide.
    pub regenerate_variables: bool,
}

/// Invalid options, detected before anything is rewritten.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Mapping text without a format.
    #[error("no mapping format given")]
    MissingFormat,
    /// A namespaced mapping without a target namespace.
    #[error("namespaced mapping needs a target namespace")]
    MissingTargetNamespace,
    /// Reversing a format that has no inverse.
    #[error("{0} mappings cannot be reversed")]
    NoInverse(MappingFormat),
    /// A namespace the mapping does not declare.
    #[error("unknown namespace `{0}`")]
    UnknownNamespace(String),
    /// Options that contradict the kind of mapping.
    #[error("conflicting options: {0}")]
    Conflict(&'static str),
    /// Applying reverse or swap failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// An archive entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Path inside the archive.
    pub name: String,
    /// Contents.
    pub data: Vec<u8>,
}

impl Entry {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Entry {
            name: name.into(),
            data: data.into(),
        }
    }

    fn is_class(&self) -> bool {
        self.name.ends_with(".class")
    }

    fn is_manifest(&self) -> bool {
        self.name.eq_ignore_ascii_case(MANIFEST)
    }

    fn is_signature(&self) -> bool {
        let upper = self.name.to_ascii_uppercase();
        upper.starts_with("META-INF/") && SIGNATURE_EXTENSIONS.iter().any(|ext| upper.ends_with(ext))
    }
}

/// An entry that could not be processed.
#[derive(Debug)]
pub struct EntryFailure {
    /// Path of the entry.
    pub name: String,
    /// What went wrong.
    pub error: Error,
}

/// Result of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output entries, in input order.
    pub entries: Vec<Entry>,
    /// Names of dropped signature files.
    pub dropped: Vec<String>,
    /// Entries skipped because of an error.
    pub failures: Vec<EntryFailure>,
}

enum Outcome {
    Keep(Entry),
    Drop(String),
    Fail(EntryFailure),
}

/// A validated remapping configuration.
#[derive(Debug)]
pub struct Session {
    mapping: ClassifiedMapping,
    options: RemapOptions,
    source: Option<String>,
    refmap: Option<MixinRefmap>,
    ledger: Option<VariableLedger>,
}

impl Session {
    /// Validates `options` against a parsed mapping and applies reverse or
    /// swap.
    pub fn new(format: MappingFormat, mut mapping: ClassifiedMapping, options: RemapOptions) -> Result<Self, ConfigError> {
        if options.reverse {
            if !format.has_inverse() {
                return Err(ConfigError::NoInverse(format));
            }
            if mapping.is_namespaced() {
                return Err(ConfigError::Conflict("reverse needs a paired mapping"));
            }
            mapping.reverse()?;
        }

        if let Some(target) = &options.swap_to {
            let source = match mapping.unmapped_namespace() {
                Some(source) if mapping.is_namespaced() => source.to_string(),
                _ => return Err(ConfigError::Conflict("namespace swap needs a namespaced mapping")),
            };
            if !mapping.namespaces().contains(target) {
                return Err(ConfigError::UnknownNamespace(target.clone()));
            }
            mapping.swap(&source, target)?;
        }

        let source = if mapping.is_namespaced() {
            let target = options
                .target_namespace
                .as_ref()
                .ok_or(ConfigError::MissingTargetNamespace)?;
            let source = match &options.source_namespace {
                Some(source) => source.clone(),
                None => mapping
                    .unmapped_namespace()
                    .ok_or(ConfigError::MissingTargetNamespace)?
                    .to_string(),
            };
            for namespace in [&source, target] {
                if !mapping.namespaces().contains(namespace) {
                    return Err(ConfigError::UnknownNamespace(namespace.clone()));
                }
            }
            Some(source)
        } else {
            if options.source_namespace.is_some() || options.target_namespace.is_some() {
                return Err(ConfigError::Conflict("namespaces given for a paired mapping"));
            }
            None
        };

        let ledger = options.regenerate_variables.then(VariableLedger::new);
        log::debug!("configured {} session, namespaces {:?} -> {:?}", format, source, options.target_namespace);
        Ok(Session {
            mapping,
            options,
            source,
            refmap: None,
            ledger,
        })
    }

    /// Parses mapping text in the format named by `options`.
    pub fn from_text(text: &str, options: RemapOptions) -> Result<Self, Error> {
        let format = options.format.ok_or(ConfigError::MissingFormat)?;
        let mapping = format.parse(text)?;
        Ok(Self::new(format, mapping, options)?)
    }

    /// Resolves `@Mixin` string targets through `refmap`.
    pub fn with_refmap(mut self, refmap: MixinRefmap) -> Self {
        self.refmap = Some(refmap);
        self
    }

    /// Continues from an earlier ledger, enabling variable regeneration.
    pub fn with_ledger(mut self, ledger: VariableLedger) -> Self {
        self.options.regenerate_variables = true;
        self.ledger = Some(ledger);
        self
    }

    /// The mapping after reverse or swap.
    pub fn mapping(&self) -> &ClassifiedMapping {
        &self.mapping
    }

    /// The options.
    pub fn options(&self) -> &RemapOptions {
        &self.options
    }

    /// The variable ledger, present when regenerating.
    pub fn ledger(&self) -> Option<&VariableLedger> {
        self.ledger.as_ref()
    }

    /// A remapper over `hierarchy`.
    pub fn remapper<'s>(&'s self, hierarchy: &'s HierarchyGraph) -> Result<Remapper<'s>, MappingError> {
        match (&self.source, &self.options.target_namespace) {
            (Some(source), Some(target)) => Remapper::namespaced(&self.mapping, hierarchy, source, target),
            _ => Remapper::new(&self.mapping, hierarchy),
        }
    }

    /// Remaps a batch of entries.
    ///
    /// Classes are rewritten, the manifest loses its entry sections,
    /// signature files are dropped and everything else passes through.
    /// Entries that fail are logged and reported, the rest of the batch
    /// continues.
    pub fn run(&self, entries: Vec<Entry>) -> Result<BatchReport, Error> {
        let classes: Vec<&[u8]> = entries
            .iter()
            .filter(|entry| entry.is_class())
            .map(|entry| entry.data.as_slice())
            .collect();
        let (hierarchy, _) = HierarchyGraph::scan(&classes, self.refmap.as_ref());
        log::debug!("scanned {} classes into a hierarchy of {}", classes.len(), hierarchy.len());

        let remapper = self.remapper(&hierarchy)?;
        let pipeline = Pipeline::new();
        let outcomes: Vec<Outcome> = entries
            .into_par_iter()
            .map(|entry| self.process(entry, &pipeline, &remapper))
            .collect();

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Keep(entry) => report.entries.push(entry),
                Outcome::Drop(name) => report.dropped.push(name),
                Outcome::Fail(failure) => report.failures.push(failure),
            }
        }
        log::debug!(
            "remapped {} entries, dropped {}, {} failed",
            report.entries.len(),
            report.dropped.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn process(&self, entry: Entry, pipeline: &Pipeline, remapper: &Remapper<'_>) -> Outcome {
        let result = if entry.is_class() {
            pipeline
                .rewrite(&entry.data, remapper, self.ledger.as_ref())
                .map(|(name, data)| Entry {
                    name: format!("{}{}", versioned_prefix(&entry.name), name),
                    data,
                })
                .map_err(Error::from)
        } else if entry.is_manifest() {
            clear_entry_sections(&entry.data)
                .map(|data| Entry {
                    name: entry.name.clone(),
                    data,
                })
                .map_err(Error::from)
        } else if entry.is_signature() {
            log::debug!("dropping signature file {}", entry.name);
            return Outcome::Drop(entry.name);
        } else {
            return Outcome::Keep(entry);
        };

        match result {
            Ok(entry) => Outcome::Keep(entry),
            Err(error) => {
                log::warn!("skipping {}: {}", entry.name, error);
                Outcome::Fail(EntryFailure {
                    name: entry.name,
                    error,
                })
            }
        }
    }
}

/// The `META-INF/versions/<n>/` prefix of a multi-release class entry.
fn versioned_prefix(name: &str) -> &str {
    let rest = match name.strip_prefix("META-INF/versions/") {
        Some(rest) => rest,
        None => return "",
    };
    match rest.split_once('/') {
        Some((version, _)) if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) => {
            &name[.."META-INF/versions/".len() + version.len() + 1]
        }
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json() {
        let options: RemapOptions =
            serde_json::from_str(r#"{"format": "tiny-v2", "target-namespace": "named", "regenerate-variables": true}"#)
                .unwrap();
        assert_eq!(options.format, Some(MappingFormat::TinyV2));
        assert_eq!(options.target_namespace.as_deref(), Some("named"));
        assert!(options.regenerate_variables);
        assert!(!options.reverse);
    }

    #[test]
    fn test_entry_kinds() {
        assert!(Entry::new("META-INF/MANIFEST.MF", "").is_manifest());
        assert!(Entry::new("META-INF/SIGNER.SF", "").is_signature());
        assert!(Entry::new("META-INF/signer.rsa", "").is_signature());
        assert!(!Entry::new("assets/key.rsa", "").is_signature());
        assert!(Entry::new("a/B.class", "").is_class());
    }

    #[test]
    fn test_versioned_prefix() {
        assert_eq!(versioned_prefix("META-INF/versions/9/a/B.class"), "META-INF/versions/9/");
        assert_eq!(versioned_prefix("META-INF/versions/x/a/B.class"), "");
        assert_eq!(versioned_prefix("a/B.class"), "");
    }
}
