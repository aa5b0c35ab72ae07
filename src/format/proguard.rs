//! Proguard / R8 mapping files.
//!
//! The mapping file format is described
//! [here](https://www.guardsquare.com/en/products/proguard/manual/retrace).
//! Unmapped names are the obfuscated ones, mapped names the original ones.

use crate::descriptor::{
    descriptor_to_java_type, java_method_to_descriptor, java_type_to_descriptor,
    parse_method_descriptor,
};
use crate::mapping::{ClassMapping, ClassifiedMapping, Descriptor, LineNumber, Mapping};
use crate::utils::{binary_name, internal_name};

use super::{GenerateError, MappingFormat, PairedDescriptors, ParseError, ParseErrorKind};

const INVALID: ParseErrorKind = ParseErrorKind::Malformed("line is not a valid proguard record");

/// A proguard line mapping: the obfuscated line range of a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProguardLineMapping {
    /// Start Line, 1-based.
    pub startline: usize,
    /// End Line, inclusive.
    pub endline: usize,
}

/// A single record of a proguard mapping file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProguardRecord<'s> {
    /// A Class Mapping.
    Class {
        /// Original name of the class.
        original: &'s str,
        /// Obfuscated name of the class.
        obfuscated: &'s str,
    },
    /// A Field Mapping.
    Field {
        /// Type of the field
        ty: &'s str,
        /// Original name of the field.
        original: &'s str,
        /// Obfuscated name of the field.
        obfuscated: &'s str,
    },
    /// A Method Mapping.
    Method {
        /// Return Type of the method.
        ty: &'s str,
        /// Original name of the method.
        original: &'s str,
        /// Obfuscated name of the method.
        obfuscated: &'s str,
        /// Arguments of the method as raw string.
        arguments: &'s str,
        /// Original class of a foreign inlined method.
        original_class: Option<&'s str>,
        /// Optional line mapping of the method.
        line_mapping: Option<ProguardLineMapping>,
    },
}

impl<'s> ProguardRecord<'s> {
    /// Parses a line from a proguard mapping file.
    ///
    /// # Examples
    ///
    /// ```
    /// use jvm_remap::format::{ProguardLineMapping, ProguardRecord};
    ///
    /// let parsed = ProguardRecord::try_parse("android.arch.core.executor.ArchTaskExecutor -> a.a.a.a.c:");
    /// assert_eq!(
    ///     parsed,
    ///     Some(ProguardRecord::Class {
    ///         original: "android.arch.core.executor.ArchTaskExecutor",
    ///         obfuscated: "a.a.a.a.c"
    ///     })
    /// );
    ///
    /// let parsed = ProguardRecord::try_parse("    1016:1016:void com.example1.domain.MyBean.doWork():16:16 -> buttonClicked");
    /// assert_eq!(
    ///     parsed,
    ///     Some(ProguardRecord::Method {
    ///         ty: "void",
    ///         original: "doWork",
    ///         obfuscated: "buttonClicked",
    ///         arguments: "",
    ///         original_class: Some("com.example1.domain.MyBean"),
    ///         line_mapping: Some(ProguardLineMapping { startline: 1016, endline: 1016 }),
    ///     })
    /// );
    /// ```
    pub fn try_parse(line: &'s str) -> Option<Self> {
        match line.strip_prefix("    ") {
            Some(member) => parse_field_or_method(member),
            None => parse_class(line),
        }
    }
}

fn parse_class(line: &str) -> Option<ProguardRecord<'_>> {
    // `originalclassname -> obfuscatedclassname:`
    let (original, rest) = line.split_once(" -> ")?;
    let obfuscated = rest.strip_suffix(':')?;
    if !is_name(original) || !is_name(obfuscated) {
        return None;
    }
    Some(ProguardRecord::Class {
        original,
        obfuscated,
    })
}

fn parse_field_or_method(line: &str) -> Option<ProguardRecord<'_>> {
    // `originalfieldtype originalfieldname -> obfuscatedfieldname`
    // `[startline:endline:]originalreturntype [originalclassname.]originalmethodname(originalargumenttype,...)[:originalstartline[:originalendline]] -> obfuscatedmethodname`
    let (declaration, obfuscated) = line.rsplit_once(" -> ")?;
    if !is_name(obfuscated) {
        return None;
    }

    let (line_mapping, declaration) = if declaration.starts_with(|c: char| c.is_ascii_digit()) {
        let (startline, endline, rest) = parse_line_prefix(declaration)?;
        (Some(ProguardLineMapping { startline, endline }), rest)
    } else {
        (None, declaration)
    };

    let (ty, rest) = declaration.split_once(' ')?;
    if !is_name(ty) {
        return None;
    }

    let Some(open) = rest.find('(') else {
        if !is_name(rest) {
            return None;
        }
        return Some(ProguardRecord::Field {
            ty,
            original: rest,
            obfuscated,
        });
    };

    let (qualified, tail) = rest.split_at(open);
    let (arguments, original_lines) = tail[1..].split_once(')')?;
    if !original_lines.is_empty() && !is_original_lines(original_lines) {
        return None;
    }
    let (original_class, original) = match qualified.rsplit_once('.') {
        Some((class, method)) => (Some(class), method),
        None => (None, qualified),
    };
    if !is_name(original) {
        return None;
    }

    Some(ProguardRecord::Method {
        ty,
        original,
        obfuscated,
        arguments,
        original_class,
        line_mapping: line_mapping.filter(|m| m.startline > 0 && m.endline > 0),
    })
}

/// Splits `a:b:` off a member declaration.
fn parse_line_prefix(declaration: &str) -> Option<(usize, usize, &str)> {
    let mut parts = declaration.splitn(3, ':');
    let startline = parts.next()?.parse().ok()?;
    let endline = parts.next()?.parse().ok()?;
    Some((startline, endline, parts.next()?))
}

fn is_original_lines(lines: &str) -> bool {
    lines
        .strip_prefix(':')
        .map(|l| l.split(':').all(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())))
        .unwrap_or(false)
}

fn is_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(char::is_whitespace)
}

pub(super) fn process(lines: &[&str]) -> Result<ClassifiedMapping, ParseError> {
    let mut mapping = ClassifiedMapping::new();
    for (index, line) in lines.iter().enumerate() {
        let error = |kind: ParseErrorKind| ParseError::new(MappingFormat::Proguard, index, line, kind);
        let record = ProguardRecord::try_parse(line).ok_or_else(|| {
            if line.starts_with(' ') && !line.starts_with("    ") {
                error(ParseErrorKind::Indentation)
            } else {
                error(INVALID)
            }
        })?;

        match record {
            ProguardRecord::Class {
                original,
                obfuscated,
            } => {
                let class = ClassMapping::new(Mapping::paired(internal_name(obfuscated), internal_name(original)));
                mapping.add_class(class).map_err(|e| error(e.into()))?;
            }
            ProguardRecord::Field {
                ty,
                original,
                obfuscated,
            } => {
                let descriptor = java_type_to_descriptor(ty).ok_or_else(|| error(INVALID))?;
                let field = Mapping::paired(obfuscated, original).with_descriptor(Descriptor::mapped(descriptor));
                let class = mapping.last_class_mut().ok_or_else(|| error(ParseErrorKind::Orphan))?;
                class.add_field(field).map_err(|e| error(e.into()))?;
            }
            ProguardRecord::Method {
                original_class: Some(original_class),
                ..
            } => {
                log::trace!("skipping method inlined from {}", original_class);
            }
            ProguardRecord::Method {
                ty,
                original,
                obfuscated,
                arguments,
                line_mapping,
                ..
            } => {
                let descriptor = java_method_to_descriptor(ty, arguments).ok_or_else(|| error(INVALID))?;
                let mut method = Mapping::paired(obfuscated, original).with_descriptor(Descriptor::mapped(descriptor));
                if let Some(lines) = line_mapping {
                    let start = u32::try_from(lines.startline).map_err(|_| error(ParseErrorKind::Number))?;
                    let end = u32::try_from(lines.endline).map_err(|_| error(ParseErrorKind::Number))?;
                    let range = LineNumber::new(start, end).map_err(|e| error(e.into()))?;
                    method = method.with_line_number(range);
                }
                let class = mapping.last_class_mut().ok_or_else(|| error(ParseErrorKind::Orphan))?;
                // R8 repeats a method once per line range
                let duplicate = class.methods().iter().any(|m| {
                    m.names() == method.names() && m.get_descriptor() == method.get_descriptor()
                });
                if !duplicate {
                    class.add_method(method);
                }
            }
        }
    }
    Ok(mapping)
}

pub(super) fn generate(mapping: &ClassifiedMapping) -> Result<Vec<String>, GenerateError> {
    let descriptors = PairedDescriptors::new(mapping);
    let missing = |owner: &str, member: &str| GenerateError::MissingDescriptor {
        format: MappingFormat::Proguard,
        owner: owner.to_string(),
        member: member.to_string(),
    };

    let mut lines = Vec::new();
    for class in mapping.classes() {
        let owner = class.mapping().unmapped_name();
        let original = class.mapping().mapped_name().unwrap_or(owner);
        lines.push(format!("{} -> {}:", binary_name(original), binary_name(owner)));

        for field in class.fields() {
            let ty = descriptors
                .mapped(field.get_descriptor())
                .and_then(|d| descriptor_to_java_type(&d))
                .ok_or_else(|| missing(owner, field.unmapped_name()))?;
            lines.push(format!(
                "    {} {} -> {}",
                ty,
                field.mapped_name().unwrap_or_default(),
                field.unmapped_name()
            ));
        }

        for method in class.methods() {
            let descriptor = descriptors
                .mapped(method.get_descriptor())
                .ok_or_else(|| missing(owner, method.unmapped_name()))?;
            let (params, ret) = parse_method_descriptor(&descriptor)
                .ok_or_else(|| missing(owner, method.unmapped_name()))?;
            let arguments = params
                .iter()
                .map(|p| descriptor_to_java_type(p))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| missing(owner, method.unmapped_name()))?;
            let ret = descriptor_to_java_type(ret).ok_or_else(|| missing(owner, method.unmapped_name()))?;
            let lines_prefix = method
                .line_number()
                .map(|l| format!("{}:{}:", l.start(), l.end()))
                .unwrap_or_default();
            lines.push(format!(
                "    {}{} {}({}) -> {}",
                lines_prefix,
                ret,
                method.mapped_name().unwrap_or_default(),
                arguments.join(","),
                method.unmapped_name()
            ));
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_parse_class() {
        assert_eq!(
            ProguardRecord::try_parse("android.support.v4.app.RemoteActionCompatParcelizer -> a.b:"),
            Some(ProguardRecord::Class {
                original: "android.support.v4.app.RemoteActionCompatParcelizer",
                obfuscated: "a.b",
            })
        );
    }

    #[test]
    fn try_parse_class_with_bad_delimiter() {
        assert_eq!(ProguardRecord::try_parse("a.b.C->a.b:"), None);
        assert_eq!(ProguardRecord::try_parse("a.b.C -> a.b"), None);
    }

    #[test]
    fn try_parse_field() {
        assert_eq!(
            ProguardRecord::try_parse("    android.app.Activity mActivity -> a"),
            Some(ProguardRecord::Field {
                ty: "android.app.Activity",
                original: "mActivity",
                obfuscated: "a",
            })
        );
    }

    #[test]
    fn try_parse_method_with_lines() {
        assert_eq!(
            ProguardRecord::try_parse("    14:15:boolean equals(java.lang.Object,int[]):436:437 -> a"),
            Some(ProguardRecord::Method {
                ty: "boolean",
                original: "equals",
                obfuscated: "a",
                arguments: "java.lang.Object,int[]",
                original_class: None,
                line_mapping: Some(ProguardLineMapping {
                    startline: 14,
                    endline: 15,
                }),
            })
        );
    }

    #[test]
    fn try_parse_method_with_only_startline() {
        assert_eq!(
            ProguardRecord::try_parse("    14:void a.b(int) -> c"),
            None
        );
    }

    #[test]
    fn process_builds_descriptors() {
        let lines = [
            "com.example.Foo -> a:",
            "    int count -> a",
            "    1:4:com.example.Foo copy(java.lang.String[]) -> b",
            "    5:6:com.example.Foo copy(java.lang.String[]) -> b",
            "    7:7:void com.example.Other.inlined():3:3 -> c",
        ];
        let mapping = MappingFormat::Proguard.process(&lines).unwrap();
        let class = mapping.class("a").unwrap();
        assert_eq!(class.mapping().mapped_name(), Some("com/example/Foo"));
        assert_eq!(
            class.field("a").unwrap().get_descriptor(),
            Some(&Descriptor::mapped("I"))
        );
        assert_eq!(class.methods().len(), 1);
        let method = &class.methods()[0];
        assert_eq!(
            method.get_descriptor(),
            Some(&Descriptor::mapped("([Ljava/lang/String;)Lcom/example/Foo;"))
        );
        assert_eq!(method.line_number(), Some(LineNumber::new(1, 4).unwrap()));
    }

    #[test]
    fn process_rejects_orphans_and_bad_indentation() {
        let err = MappingFormat::Proguard.process(&["    int a -> b"]).unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::Orphan);

        let err = MappingFormat::Proguard
            .process(&["a -> b:", "  int a -> b"])
            .unwrap_err();
        assert_eq!(err.index(), 1);
        assert_eq!(err.kind(), &ParseErrorKind::Indentation);
    }

    #[test]
    fn generate_round_trips() {
        let lines = [
            "com.example.Foo -> a:",
            "    int count -> a",
            "    1:4:com.example.Foo copy(java.lang.String[],long) -> b",
            "    void run() -> c",
            "com.example.Foo$Inner -> a$a:",
        ];
        let mapping = MappingFormat::Proguard.process(&lines).unwrap();
        let generated = MappingFormat::Proguard.generate(&mapping).unwrap();
        assert_eq!(generated, lines);
        assert_eq!(MappingFormat::Proguard.process(&generated).unwrap(), mapping);
    }
}
