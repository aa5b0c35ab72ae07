//! Processors for the supported textual mapping formats.
//!
//! Each format parses pre-cleaned lines (see [`strip_comments`]) into a
//! [`ClassifiedMapping`] and, with the exception of Tiny v1, generates the
//! same grammar back from one.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::{ClassNameIndex, ClassifiedMapping, Descriptor, MappingError, NameSide, Names};

mod csrg;
mod proguard;
mod srg;
mod tiny;
mod tsrg;

pub use proguard::{ProguardLineMapping, ProguardRecord};

/// A supported mapping format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingFormat {
    /// Proguard / R8 `mapping.txt`.
    Proguard,
    /// SRG, including XSRG field descriptors.
    Srg,
    /// Compact SRG.
    Csrg,
    /// Tab-indented SRG.
    TsrgV1,
    /// Namespaced tab-indented SRG.
    TsrgV2,
    /// Legacy Tiny, read-only.
    TinyV1,
    /// Tiny v2.
    TinyV2,
}

impl fmt::Display for MappingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingFormat::Proguard => "Proguard",
            MappingFormat::Srg => "SRG",
            MappingFormat::Csrg => "CSRG",
            MappingFormat::TsrgV1 => "TSRG v1",
            MappingFormat::TsrgV2 => "TSRG v2",
            MappingFormat::TinyV1 => "Tiny v1",
            MappingFormat::TinyV2 => "Tiny v2",
        })
    }
}

impl MappingFormat {
    /// Whether the format produces namespaced names.
    pub fn is_namespaced(&self) -> bool {
        matches!(
            self,
            MappingFormat::TsrgV2 | MappingFormat::TinyV1 | MappingFormat::TinyV2
        )
    }

    /// Whether mappings of this format can be generated and reversed.
    pub fn has_inverse(&self) -> bool {
        !matches!(self, MappingFormat::TinyV1)
    }

    /// Parses raw mapping text, stripping comments and blank lines first.
    pub fn parse(&self, text: &str) -> Result<ClassifiedMapping, ParseError> {
        self.process(&strip_comments(text))
    }

    /// Parses lines that are already free of comments and blank lines.
    pub fn process<S: AsRef<str>>(&self, lines: &[S]) -> Result<ClassifiedMapping, ParseError> {
        let lines: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        let mapping = match self {
            MappingFormat::Proguard => proguard::process(&lines),
            MappingFormat::Srg => srg::process(&lines),
            MappingFormat::Csrg => csrg::process(&lines),
            MappingFormat::TsrgV1 => tsrg::process_v1(&lines),
            MappingFormat::TsrgV2 => tsrg::process_v2(&lines),
            MappingFormat::TinyV1 => tiny::process_v1(&lines),
            MappingFormat::TinyV2 => tiny::process_v2(&lines),
        }?;
        log::debug!(
            "parsed {} mapping: {} classes, {} packages",
            self,
            mapping.classes().count(),
            mapping.packages().len()
        );
        Ok(mapping)
    }

    /// Writes `mapping` in this format, one string per line.
    pub fn generate(&self, mapping: &ClassifiedMapping) -> Result<Vec<String>, GenerateError> {
        if self.is_namespaced() != mapping.is_namespaced() {
            return Err(GenerateError::WrongKind {
                format: *self,
                expected: if self.is_namespaced() {
                    "namespaced"
                } else {
                    "paired"
                },
            });
        }
        match self {
            MappingFormat::Proguard => proguard::generate(mapping),
            MappingFormat::Srg => srg::generate(mapping),
            MappingFormat::Csrg => csrg::generate(mapping),
            MappingFormat::TsrgV1 => tsrg::generate_v1(mapping),
            MappingFormat::TsrgV2 => tsrg::generate_v2(mapping),
            MappingFormat::TinyV1 => Err(GenerateError::Unsupported(*self)),
            MappingFormat::TinyV2 => tiny::generate_v2(mapping),
        }
    }
}

/// Removes `#` comments, trailing spaces and blank lines.
///
/// Trailing tabs are kept, they delimit empty columns in Tiny files.
pub fn strip_comments(text: &str) -> Vec<&str> {
    text.lines()
        .map(|line| match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        })
        .map(|line| line.trim_end_matches(' '))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Error when parsing a mapping file.
///
/// Contains the offending line and its index in the processed lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{format} mapping, line {index}: {kind} (`{line}`)")]
pub struct ParseError {
    format: MappingFormat,
    index: usize,
    line: String,
    kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(
        format: MappingFormat,
        index: usize,
        line: &str,
        kind: impl Into<ParseErrorKind>,
    ) -> Self {
        ParseError {
            format,
            index,
            line: line.to_string(),
            kind: kind.into(),
        }
    }

    /// The format being parsed.
    pub fn format(&self) -> MappingFormat {
        self.format
    }

    /// Index of the offending line.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The offending line.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The specific parse error.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

/// The specific parse error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The header line is missing or malformed.
    #[error("missing or malformed header")]
    Header,
    /// The line is indented where it must not be, or the other way round.
    #[error("unexpected indentation")]
    Indentation,
    /// The line has the wrong number of columns.
    #[error("unexpected column count")]
    Columns,
    /// A member line appears before any class.
    #[error("member outside of a class")]
    Orphan,
    /// A numeric column failed to parse.
    #[error("invalid number")]
    Number,
    /// Any other malformed line.
    #[error("{0}")]
    Malformed(&'static str),
    /// The line is well-formed but violates a mapping invariant.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Error when writing a mapping in a given format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The format cannot be written.
    #[error("{0} mappings cannot be generated")]
    Unsupported(MappingFormat),
    /// The format needs the other kind of names.
    #[error("{format} mappings require {expected} names")]
    WrongKind {
        /// The target format.
        format: MappingFormat,
        /// `"paired"` or `"namespaced"`.
        expected: &'static str,
    },
    /// A member has no descriptor but the format needs one.
    #[error("{format} mappings require a descriptor for `{owner}.{member}`")]
    MissingDescriptor {
        /// The target format.
        format: MappingFormat,
        /// The owning class.
        owner: String,
        /// The member.
        member: String,
    },
}

/// Builds namespaced names from columns, treating empty columns as absent.
pub(crate) fn namespaced_names(
    namespaces: &[String],
    columns: &[&str],
) -> Result<Names, MappingError> {
    let names = columns
        .iter()
        .map(|c| (!c.is_empty()).then(|| c.to_string()))
        .collect();
    let unmapped = namespaces.first().map(String::as_str).unwrap_or_default();
    Names::namespaced(namespaces, names, unmapped)
}

/// Like [`namespaced_names`], but the unmapped name may be absent.
pub(crate) fn variable_names(
    namespaces: &[String],
    columns: &[&str],
) -> Result<Names, MappingError> {
    let names = columns
        .iter()
        .map(|c| (!c.is_empty()).then(|| c.to_string()))
        .collect();
    let unmapped = namespaces.first().map(String::as_str).unwrap_or_default();
    Names::namespaced_partial(namespaces, names, unmapped)
}

/// Both slots of a paired descriptor, filling a missing one by translation.
pub(crate) struct PairedDescriptors {
    forward: ClassNameIndex,
    backward: ClassNameIndex,
}

impl PairedDescriptors {
    pub(crate) fn new(mapping: &ClassifiedMapping) -> Self {
        PairedDescriptors {
            forward: mapping.class_index(NameSide::Unmapped, NameSide::Mapped),
            backward: mapping.class_index(NameSide::Mapped, NameSide::Unmapped),
        }
    }

    pub(crate) fn unmapped(&self, descriptor: Option<&Descriptor>) -> Option<String> {
        match descriptor? {
            Descriptor::Paired {
                unmapped: Some(d), ..
            } => Some(d.clone()),
            Descriptor::Paired {
                mapped: Some(d), ..
            } => Some(self.backward.translate(d)),
            _ => None,
        }
    }

    pub(crate) fn mapped(&self, descriptor: Option<&Descriptor>) -> Option<String> {
        match descriptor? {
            Descriptor::Paired {
                mapped: Some(d), ..
            } => Some(d.clone()),
            Descriptor::Paired {
                unmapped: Some(d), ..
            } => Some(self.forward.translate(d)),
            _ => None,
        }
    }
}

/// Column order and descriptor translation for namespaced generators.
///
/// The unmapped namespace is written first, followed by the remaining
/// namespaces in declaration order. Descriptors are re-expressed in the
/// unmapped namespace, which is how the parsers read them back.
pub(crate) struct NamespacedColumns {
    namespaces: Vec<String>,
    indexes: HashMap<String, ClassNameIndex>,
}

impl NamespacedColumns {
    pub(crate) fn new(mapping: &ClassifiedMapping) -> Self {
        let mut namespaces = mapping.namespaces().to_vec();
        if let Some(position) = mapping
            .unmapped_namespace()
            .and_then(|unmapped| namespaces.iter().position(|n| n == unmapped))
        {
            let unmapped = namespaces.remove(position);
            namespaces.insert(0, unmapped);
        }
        let indexes = match namespaces.split_first() {
            Some((unmapped, others)) => others
                .iter()
                .map(|namespace| {
                    let index = mapping.class_index(NameSide::Namespace(namespace), NameSide::Namespace(unmapped));
                    (namespace.clone(), index)
                })
                .collect(),
            None => HashMap::new(),
        };
        NamespacedColumns { namespaces, indexes }
    }

    /// Namespaces in output order.
    pub(crate) fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Name columns in output order, empty for absent names.
    pub(crate) fn columns<'n>(&self, names: &'n Names) -> Vec<&'n str> {
        self.namespaces
            .iter()
            .map(|ns| names.get(ns).unwrap_or_default())
            .collect()
    }

    /// A namespaced descriptor expressed in the unmapped namespace.
    pub(crate) fn descriptor(&self, descriptor: Option<&Descriptor>) -> Option<String> {
        match descriptor? {
            Descriptor::Namespaced {
                descriptor,
                namespace,
            } => Some(match self.indexes.get(namespace) {
                Some(index) => index.translate(descriptor),
                None => descriptor.clone(),
            }),
            Descriptor::Paired { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        let text = "# header\n\na b # trailing\n    c d\n   \n\te f\r\n";
        assert_eq!(strip_comments(text), vec!["a b", "    c d", "\te f"]);
    }

    #[test]
    fn test_generate_wrong_kind() {
        let paired = ClassifiedMapping::new();
        assert_eq!(
            MappingFormat::TinyV2.generate(&paired),
            Err(GenerateError::WrongKind {
                format: MappingFormat::TinyV2,
                expected: "namespaced",
            })
        );
        let namespaced = ClassifiedMapping::namespaced(vec!["a".into(), "b".into()]);
        assert_eq!(
            MappingFormat::TinyV1.generate(&namespaced),
            Err(GenerateError::Unsupported(MappingFormat::TinyV1))
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = MappingFormat::TsrgV2.parse("a b\n").unwrap_err();
        assert_eq!(err.index(), 0);
        assert_eq!(err.kind(), &ParseErrorKind::Header);
        assert_eq!(
            err.to_string(),
            "TSRG v2 mapping, line 0: missing or malformed header (`a b`)"
        );
    }
}
