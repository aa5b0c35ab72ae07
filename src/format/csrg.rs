//! Compact SRG: space separated columns, members name their owning class.

use indexmap::IndexMap;

use crate::mapping::{ClassMapping, ClassifiedMapping, Descriptor, Mapping, MappingError};

use super::{GenerateError, MappingFormat, PairedDescriptors, ParseError, ParseErrorKind};

pub(super) fn process(lines: &[&str]) -> Result<ClassifiedMapping, ParseError> {
    let error = |index: usize, kind: ParseErrorKind| {
        ParseError::new(MappingFormat::Csrg, index, lines[index], kind)
    };

    let mut mapping = ClassifiedMapping::new();
    let mut classes: IndexMap<String, ClassMapping> = IndexMap::new();
    let mut members = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if line.starts_with(char::is_whitespace) {
            return Err(error(index, ParseErrorKind::Indentation));
        }
        let columns: Vec<&str> = line.split(' ').collect();
        match columns.as_slice() {
            [unmapped, mapped] if unmapped.ends_with('/') => {
                let unmapped = unmapped.trim_end_matches('/');
                let mapped = mapped.trim_end_matches('/');
                mapping.add_package(Mapping::paired(unmapped, mapped));
            }
            [unmapped, mapped] => {
                if classes.contains_key(*unmapped) {
                    let duplicate = MappingError::DuplicateClass(unmapped.to_string());
                    return Err(error(index, duplicate.into()));
                }
                classes.insert(
                    unmapped.to_string(),
                    ClassMapping::new(Mapping::paired(*unmapped, *mapped)),
                );
            }
            [_, _, _] | [_, _, _, _] => members.push((index, columns)),
            _ => return Err(error(index, ParseErrorKind::Columns)),
        }
    }

    for (index, columns) in members {
        let owner = columns[0];
        let class = classes
            .entry(owner.to_string())
            .or_insert_with(|| ClassMapping::new(Mapping::paired(owner, owner)));
        match columns.as_slice() {
            [_, name, mapped] => class
                .add_field(Mapping::paired(*name, *mapped))
                .map_err(|e| error(index, e.into()))?,
            [_, name, descriptor, mapped] => {
                if !descriptor.starts_with('(') {
                    return Err(error(index, ParseErrorKind::Malformed("method descriptor expected")));
                }
                class.add_method(
                    Mapping::paired(*name, *mapped).with_descriptor(Descriptor::unmapped(*descriptor)),
                );
            }
            _ => return Err(error(index, ParseErrorKind::Columns)),
        }
    }

    for (_, class) in classes {
        mapping.add_class(class).map_err(|e| error(0, e.into()))?;
    }
    Ok(mapping)
}

pub(super) fn generate(mapping: &ClassifiedMapping) -> Result<Vec<String>, GenerateError> {
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
        lines.push(format!(
            "{} {}",
            owner,
            class.mapping().mapped_name().unwrap_or(owner)
        ));
        for field in class.fields() {
            lines.push(format!(
                "{} {} {}",
                owner,
                field.unmapped_name(),
                field.mapped_name().unwrap_or_default()
            ));
        }
        for method in class.methods() {
            let descriptor = descriptors
                .unmapped(method.get_descriptor())
                .ok_or_else(|| GenerateError::MissingDescriptor {
                    format: MappingFormat::Csrg,
                    owner: owner.to_string(),
                    member: method.unmapped_name().to_string(),
                })?;
            lines.push(format!(
                "{} {} {} {}",
                owner,
                method.unmapped_name(),
                descriptor,
                method.mapped_name().unwrap_or_default()
            ));
        }
    }
    Ok(lines)
}
