//! Tiny mappings.
//!
//! Tiny v2 is a tab-indented tree with a `tiny 2 0` header. Tiny v1 is the
//! legacy flat format with `CLASS`, `FIELD` and `METHOD` lines; it can only
//! be read.

use indexmap::IndexMap;

use crate::mapping::{ClassMapping, ClassifiedMapping, Descriptor, Mapping, MappingError};

use super::{
    namespaced_names, variable_names, GenerateError, MappingFormat, NamespacedColumns, ParseError,
    ParseErrorKind,
};

fn header_error(format: MappingFormat, lines: &[&str]) -> ParseError {
    ParseError::new(
        format,
        0,
        lines.first().copied().unwrap_or_default(),
        ParseErrorKind::Header,
    )
}

pub(super) fn process_v1(lines: &[&str]) -> Result<ClassifiedMapping, ParseError> {
    let format = MappingFormat::TinyV1;
    let header: Vec<&str> = lines.first().map(|l| l.split('\t').collect()).unwrap_or_default();
    let namespaces: Vec<String> = match header.as_slice() {
        ["v1", namespaces @ ..] if !namespaces.is_empty() => {
            namespaces.iter().map(|n| n.to_string()).collect()
        }
        _ => return Err(header_error(format, lines)),
    };
    let width = namespaces.len();

    let mut mapping = ClassifiedMapping::namespaced(namespaces.clone());
    let mut classes: IndexMap<String, ClassMapping> = IndexMap::new();
    let mut members = Vec::new();

    for (index, line) in lines.iter().enumerate().skip(1) {
        let error = |kind: ParseErrorKind| ParseError::new(format, index, line, kind);
        let columns: Vec<&str> = line.split('\t').collect();
        match columns.as_slice() {
            ["CLASS", names @ ..] if names.len() == width => {
                let names = namespaced_names(&namespaces, names).map_err(|e| error(e.into()))?;
                let class = ClassMapping::new(Mapping::new(names));
                let key = class.mapping().unmapped_name().to_string();
                if classes.contains_key(&key) {
                    return Err(error(MappingError::DuplicateClass(key).into()));
                }
                classes.insert(key, class);
            }
            ["FIELD" | "METHOD", _, _, names @ ..] if names.len() == width => {
                members.push((index, columns))
            }
            ["CLASS" | "FIELD" | "METHOD", ..] => return Err(error(ParseErrorKind::Columns)),
            _ => return Err(error(ParseErrorKind::Malformed("unknown Tiny v1 line"))),
        }
    }

    for (index, columns) in members {
        let error = |kind: ParseErrorKind| ParseError::new(format, index, lines[index], kind);
        let (kind, owner, descriptor) = (columns[0], columns[1], columns[2]);
        let names = namespaced_names(&namespaces, &columns[3..]).map_err(|e| error(e.into()))?;
        let member = Mapping::new(names)
            .with_descriptor(Descriptor::namespaced(descriptor, namespaces[0].as_str()));

        if !classes.contains_key(owner) {
            let mut names = vec![""; width];
            names[0] = owner;
            let names = namespaced_names(&namespaces, &names).map_err(|e| error(e.into()))?;
            classes.insert(owner.to_string(), ClassMapping::new(Mapping::new(names)));
        }
        let class = classes
            .get_mut(owner)
            .ok_or_else(|| error(ParseErrorKind::Orphan))?;
        if kind == "FIELD" {
            class.add_field(member).map_err(|e| error(e.into()))?;
        } else {
            class.add_method(member);
        }
    }

    for (_, class) in classes {
        mapping.add_class(class).map_err(|e| ParseError::new(format, 0, "", e))?;
    }
    Ok(mapping)
}

fn unescape(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next()? {
            '\\' => '\\',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            _ => return None,
        });
    }
    Some(out)
}

fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

fn needs_escape(name: &str) -> bool {
    name.contains(['\\', '\n', '\r', '\t', '\0'])
}

pub(super) fn process_v2(lines: &[&str]) -> Result<ClassifiedMapping, ParseError> {
    let format = MappingFormat::TinyV2;
    let header: Vec<&str> = lines.first().map(|l| l.split('\t').collect()).unwrap_or_default();
    let namespaces: Vec<String> = match header.as_slice() {
        ["tiny", "2", _, namespaces @ ..] if !namespaces.is_empty() => {
            namespaces.iter().map(|n| n.to_string()).collect()
        }
        _ => return Err(header_error(format, lines)),
    };
    let width = namespaces.len();

    let mut mapping = ClassifiedMapping::namespaced(namespaces.clone());
    let mut escaped = false;
    let mut in_header = true;
    // depth of the innermost open element: 1 class, 2 method, 3 other member
    let mut open = 0;

    for (index, line) in lines.iter().enumerate().skip(1) {
        let error = |kind: ParseErrorKind| ParseError::new(format, index, line, kind);
        let depth = line.bytes().take_while(|b| *b == b'\t').count();
        let columns: Vec<&str> = line[depth..].split('\t').collect();

        if in_header && depth == 1 {
            if columns.first() == Some(&"escaped-names") {
                escaped = true;
            }
            continue;
        }
        in_header = false;

        let names = |columns: &[&str], partial: bool| -> Result<_, ParseError> {
            let columns = if escaped {
                columns
                    .iter()
                    .map(|c| unescape(c))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| error(ParseErrorKind::Malformed("invalid escape sequence")))?
            } else {
                columns.iter().map(|c| c.to_string()).collect()
            };
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let names = if partial {
                variable_names(&namespaces, &columns)
            } else {
                namespaced_names(&namespaces, &columns)
            };
            names.map_err(|e| error(e.into()))
        };

        match (depth, columns.as_slice()) {
            (0, ["c", class @ ..]) if class.len() == width => {
                let class = ClassMapping::new(Mapping::new(names(class, false)?));
                mapping.add_class(class).map_err(|e| error(e.into()))?;
                open = 1;
            }
            (0, _) => return Err(error(ParseErrorKind::Columns)),
            (1, ["c", _]) if open >= 1 => {}
            (1, [kind @ ("f" | "m"), descriptor, member @ ..]) if open >= 1 && member.len() == width => {
                let class = mapping.last_class_mut().ok_or_else(|| error(ParseErrorKind::Orphan))?;
                let member = Mapping::new(names(member, false)?)
                    .with_descriptor(Descriptor::namespaced(*descriptor, namespaces[0].as_str()));
                if *kind == "f" {
                    class.add_field(member).map_err(|e| error(e.into()))?;
                    open = 3;
                } else {
                    class.add_method(member.with_local_variables());
                    open = 2;
                }
            }
            (1, _) if open >= 1 => return Err(error(ParseErrorKind::Columns)),
            (2, ["c", _]) if open >= 2 => {}
            (2, ["p", slot, variable @ ..]) if open == 2 && variable.len() == width => {
                add_variable(&mut mapping, slot, names(variable, true)?).map_err(error)?;
            }
            (2, ["v", slot, _start, _lvt_index, variable @ ..]) if open == 2 && variable.len() == width => {
                add_variable(&mut mapping, slot, names(variable, true)?).map_err(error)?;
            }
            (2, _) if open >= 2 => return Err(error(ParseErrorKind::Columns)),
            (3, ["c", _]) if open == 2 => {}
            _ => return Err(error(ParseErrorKind::Indentation)),
        }
    }
    Ok(mapping)
}

fn add_variable(
    mapping: &mut ClassifiedMapping,
    slot: &str,
    names: crate::mapping::Names,
) -> Result<(), ParseErrorKind> {
    let slot: u16 = slot.parse().map_err(|_| ParseErrorKind::Number)?;
    let method = mapping
        .last_class_mut()
        .and_then(|c| c.last_method_mut())
        .ok_or(ParseErrorKind::Orphan)?;
    method
        .set_local_variable(slot, Mapping::new(names))
        .map_err(|e| MappingError::from(e).into())
}

pub(super) fn generate_v2(mapping: &ClassifiedMapping) -> Result<Vec<String>, GenerateError> {
    let layout = NamespacedColumns::new(mapping);
    let mut names = Vec::new();
    for class in mapping.classes() {
        names.extend(layout.columns(class.mapping().names()));
        for member in class.fields().chain(class.methods()) {
            names.extend(layout.columns(member.names()));
            for variable in member.local_variables().into_iter().flat_map(|t| t.values()) {
                names.extend(layout.columns(variable.names()));
            }
        }
    }
    let escaped = names.iter().any(|n| needs_escape(n));
    let row = |columns: Vec<&str>| -> String {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| if escaped { escape(c) } else { c.to_string() })
            .collect();
        columns.join("\t")
    };

    let mut lines = vec![format!("tiny\t2\t0\t{}", layout.namespaces().join("\t"))];
    if escaped {
        lines.push("\tescaped-names".to_string());
    }
    if !mapping.packages().is_empty() {
        log::debug!("Tiny v2 has no package entries, skipping {}", mapping.packages().len());
    }

    for class in mapping.classes() {
        let owner = class.mapping().unmapped_name();
        lines.push(format!("c\t{}", row(layout.columns(class.mapping().names()))));
        let descriptor = |member: &Mapping| {
            layout.descriptor(member.get_descriptor()).ok_or_else(|| {
                GenerateError::MissingDescriptor {
                    format: MappingFormat::TinyV2,
                    owner: owner.to_string(),
                    member: member.unmapped_name().to_string(),
                }
            })
        };
        for field in class.fields() {
            lines.push(format!(
                "\tf\t{}\t{}",
                descriptor(field)?,
                row(layout.columns(field.names()))
            ));
        }
        for method in class.methods() {
            lines.push(format!(
                "\tm\t{}\t{}",
                descriptor(method)?,
                row(layout.columns(method.names()))
            ));
            for (slot, variable) in method.local_variables().into_iter().flatten() {
                lines.push(format!(
                    "\t\tp\t{}\t{}",
                    slot,
                    row(layout.columns(variable.names()))
                ));
            }
        }
    }
    Ok(lines)
}
