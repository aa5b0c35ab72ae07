//! TSRG mappings.
//!
//! Version 1 is a paired, tab-indented tree. Version 2 adds a `tsrg2`
//! header naming the namespaces, optional field descriptors, a `static`
//! marker and local variable lines on methods.

use crate::mapping::{ClassMapping, ClassifiedMapping, Descriptor, Mapping, MappingError};

use super::{
    namespaced_names, variable_names, GenerateError, MappingFormat, NamespacedColumns,
    PairedDescriptors, ParseError, ParseErrorKind,
};

pub(super) fn process_v1(lines: &[&str]) -> Result<ClassifiedMapping, ParseError> {
    let mut mapping = ClassifiedMapping::new();
    let mut in_class = false;

    for (index, line) in lines.iter().enumerate() {
        let error = |kind: ParseErrorKind| ParseError::new(MappingFormat::TsrgV1, index, line, kind);
        if line.starts_with("\t\t") {
            return Err(error(ParseErrorKind::Indentation));
        }

        if let Some(member) = line.strip_prefix('\t') {
            let class = match mapping.last_class_mut() {
                Some(class) if in_class => class,
                _ => return Err(error(ParseErrorKind::Orphan)),
            };
            match member.split(' ').collect::<Vec<_>>().as_slice() {
                [name, mapped] => class
                    .add_field(Mapping::paired(*name, *mapped))
                    .map_err(|e| error(e.into()))?,
                [name, descriptor, mapped] if descriptor.starts_with('(') => class.add_method(
                    Mapping::paired(*name, *mapped).with_descriptor(Descriptor::unmapped(*descriptor)),
                ),
                _ => return Err(error(ParseErrorKind::Columns)),
            }
            continue;
        }

        match line.split(' ').collect::<Vec<_>>().as_slice() {
            [unmapped, mapped] if unmapped.ends_with('/') => {
                mapping.add_package(Mapping::paired(
                    unmapped.trim_end_matches('/'),
                    mapped.trim_end_matches('/'),
                ));
                in_class = false;
            }
            [unmapped, mapped] => {
                mapping
                    .add_class(ClassMapping::new(Mapping::paired(*unmapped, *mapped)))
                    .map_err(|e| error(e.into()))?;
                in_class = true;
            }
            _ => return Err(error(ParseErrorKind::Columns)),
        }
    }
    Ok(mapping)
}

pub(super) fn generate_v1(mapping: &ClassifiedMapping) -> Result<Vec<String>, GenerateError> {
    let descriptors = PairedDescriptors::new(mapping);
    let mut lines = Vec::new();
    for package in mapping.packages() {
        lines.push(format!(
            "{}/ {}/",
            package.unmapped_name(),
            package.mapped_name().unwrap_or_default()
        ));
    }
    for class in mapping.classes() {
        let owner = class.mapping().unmapped_name();
        lines.push(format!("{} {}", owner, class.mapping().mapped_name().unwrap_or(owner)));
        for field in class.fields() {
            lines.push(format!(
                "\t{} {}",
                field.unmapped_name(),
                field.mapped_name().unwrap_or_default()
            ));
        }
        for method in class.methods() {
            let descriptor = descriptors
                .unmapped(method.get_descriptor())
                .ok_or_else(|| GenerateError::MissingDescriptor {
                    format: MappingFormat::TsrgV1,
                    owner: owner.to_string(),
                    member: method.unmapped_name().to_string(),
                })?;
            lines.push(format!(
                "\t{} {} {}",
                method.unmapped_name(),
                descriptor,
                method.mapped_name().unwrap_or_default()
            ));
        }
    }
    Ok(lines)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Last {
    Nothing,
    Class,
    Field,
    Method,
}

pub(super) fn process_v2(lines: &[&str]) -> Result<ClassifiedMapping, ParseError> {
    let header = lines.first().copied().unwrap_or_default();
    let namespaces: Vec<String> = match header.strip_prefix("tsrg2 ") {
        Some(rest) if !rest.trim().is_empty() => rest.split(' ').map(str::to_string).collect(),
        _ => {
            return Err(ParseError::new(
                MappingFormat::TsrgV2,
                0,
                header,
                ParseErrorKind::Header,
            ))
        }
    };
    let unmapped_namespace = namespaces[0].clone();
    let width = namespaces.len();

    let mut mapping = ClassifiedMapping::namespaced(namespaces.clone());
    let mut last = Last::Nothing;

    for (index, line) in lines.iter().enumerate().skip(1) {
        let error = |kind: ParseErrorKind| ParseError::new(MappingFormat::TsrgV2, index, line, kind);

        if let Some(content) = line.strip_prefix("\t\t") {
            let method = match mapping.last_class_mut().and_then(|c| c.last_method_mut()) {
                Some(method) if last == Last::Method => method,
                _ => return Err(error(ParseErrorKind::Indentation)),
            };
            if content == "static" {
                method.set_static(true).map_err(|e| error(MappingError::from(e).into()))?;
                continue;
            }
            let columns: Vec<&str> = content.split(' ').collect();
            if columns.len() != width + 1 {
                return Err(error(ParseErrorKind::Columns));
            }
            let slot: u16 = columns[0].parse().map_err(|_| error(ParseErrorKind::Number))?;
            let names = variable_names(&namespaces, &columns[1..]).map_err(|e| error(e.into()))?;
            method
                .set_local_variable(slot, Mapping::new(names))
                .map_err(|e| error(MappingError::from(e).into()))?;
        } else if let Some(content) = line.strip_prefix('\t') {
            let class = match mapping.last_class_mut() {
                Some(class) if last != Last::Nothing => class,
                _ => return Err(error(ParseErrorKind::Orphan)),
            };
            let mut columns: Vec<&str> = content.split(' ').collect();
            if columns.len() == width {
                let names = namespaced_names(&namespaces, &columns).map_err(|e| error(e.into()))?;
                class.add_field(Mapping::new(names)).map_err(|e| error(e.into()))?;
                last = Last::Field;
            } else if columns.len() == width + 1 {
                let descriptor = columns.remove(1);
                let names = namespaced_names(&namespaces, &columns).map_err(|e| error(e.into()))?;
                let member = Mapping::new(names)
                    .with_descriptor(Descriptor::namespaced(descriptor, unmapped_namespace.as_str()));
                if descriptor.starts_with('(') {
                    class.add_method(member.with_static(false).with_local_variables());
                    last = Last::Method;
                } else {
                    class.add_field(member).map_err(|e| error(e.into()))?;
                    last = Last::Field;
                }
            } else {
                return Err(error(ParseErrorKind::Columns));
            }
        } else {
            let columns: Vec<&str> = line.split(' ').collect();
            if columns.len() != width {
                return Err(error(ParseErrorKind::Columns));
            }
            if columns[0].ends_with('/') {
                let stripped: Vec<&str> = columns.iter().map(|c| c.trim_end_matches('/')).collect();
                let names = namespaced_names(&namespaces, &stripped).map_err(|e| error(e.into()))?;
                mapping.add_package(Mapping::new(names));
                last = Last::Nothing;
            } else {
                let names = namespaced_names(&namespaces, &columns).map_err(|e| error(e.into()))?;
                mapping
                    .add_class(ClassMapping::new(Mapping::new(names)))
                    .map_err(|e| error(e.into()))?;
                last = Last::Class;
            }
        }
    }
    Ok(mapping)
}

pub(super) fn generate_v2(mapping: &ClassifiedMapping) -> Result<Vec<String>, GenerateError> {
    let layout = NamespacedColumns::new(mapping);
    let mut lines = vec![format!("tsrg2 {}", layout.namespaces().join(" "))];

    for package in mapping.packages() {
        let columns: Vec<String> = layout
            .columns(package.names())
            .into_iter()
            .map(|c| format!("{}/", c))
            .collect();
        lines.push(columns.join(" "));
    }

    for class in mapping.classes() {
        lines.push(layout.columns(class.mapping().names()).join(" "));

        for field in class.fields() {
            let columns = layout.columns(field.names());
            lines.push(match layout.descriptor(field.get_descriptor()) {
                Some(descriptor) => member_line(&columns, &descriptor),
                None => format!("\t{}", columns.join(" ")),
            });
        }

        for method in class.methods() {
            let columns = layout.columns(method.names());
            let descriptor = layout
                .descriptor(method.get_descriptor())
                .ok_or_else(|| GenerateError::MissingDescriptor {
                    format: MappingFormat::TsrgV2,
                    owner: class.mapping().unmapped_name().to_string(),
                    member: method.unmapped_name().to_string(),
                })?;
            lines.push(member_line(&columns, &descriptor));
            if method.is_static() == Some(true) {
                lines.push("\t\tstatic".to_string());
            }
            for (slot, variable) in method.local_variables().into_iter().flatten() {
                lines.push(format!("\t\t{} {}", slot, layout.columns(variable.names()).join(" ")));
            }
        }
    }
    Ok(lines)
}

fn member_line(columns: &[&str], descriptor: &str) -> String {
    let mut line = format!("\t{} {}", columns[0], descriptor);
    for column in &columns[1..] {
        line.push(' ');
        line.push_str(column);
    }
    line
}
