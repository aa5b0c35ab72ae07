//! SRG mappings: `PK:`, `CL:`, `FD:` and `MD:` lines with explicit owners.
//!
//! XSRG field lines carry a descriptor after each name.

use indexmap::IndexMap;

use crate::mapping::{ClassMapping, ClassifiedMapping, Descriptor, Mapping, MappingError};

use super::{GenerateError, MappingFormat, PairedDescriptors, ParseError, ParseErrorKind};

fn split_member(qualified: &str) -> Option<(&str, &str)> {
    qualified.rsplit_once('/')
}

pub(super) fn process(lines: &[&str]) -> Result<ClassifiedMapping, ParseError> {
    let error = |index: usize, kind: ParseErrorKind| {
        ParseError::new(MappingFormat::Srg, index, lines[index], kind)
    };

    let mut mapping = ClassifiedMapping::new();
    let mut classes: IndexMap<String, ClassMapping> = IndexMap::new();
    let mut members = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        match columns.as_slice() {
            ["PK:", unmapped, mapped] => mapping.add_package(Mapping::paired(*unmapped, *mapped)),
            ["CL:", unmapped, mapped] => {
                if classes.contains_key(*unmapped) {
                    let duplicate = MappingError::DuplicateClass(unmapped.to_string());
                    return Err(error(index, duplicate.into()));
                }
                classes.insert(
                    unmapped.to_string(),
                    ClassMapping::new(Mapping::paired(*unmapped, *mapped)),
                );
            }
            ["FD:", ..] | ["MD:", ..] => members.push((index, columns)),
            [tag, ..] if tag.ends_with(':') => return Err(error(index, ParseErrorKind::Columns)),
            _ => return Err(error(index, ParseErrorKind::Malformed("unknown SRG line"))),
        }
    }

    for (index, columns) in members {
        let no_owner = || error(index, ParseErrorKind::Malformed("member without owner"));
        let (owner, mapped_owner, member) = match columns.as_slice() {
            ["FD:", unmapped, mapped] => {
                let (owner, name) = split_member(unmapped).ok_or_else(no_owner)?;
                let (mapped_owner, mapped_name) = split_member(mapped).ok_or_else(no_owner)?;
                (owner, mapped_owner, Member::Field(Mapping::paired(name, mapped_name)))
            }
            ["FD:", unmapped, unmapped_desc, mapped, mapped_desc] => {
                let (owner, name) = split_member(unmapped).ok_or_else(no_owner)?;
                let (mapped_owner, mapped_name) = split_member(mapped).ok_or_else(no_owner)?;
                let field = Mapping::paired(name, mapped_name).with_descriptor(Descriptor::Paired {
                    unmapped: Some(unmapped_desc.to_string()),
                    mapped: Some(mapped_desc.to_string()),
                });
                (owner, mapped_owner, Member::Field(field))
            }
            ["MD:", unmapped, unmapped_desc, mapped, mapped_desc] => {
                let (owner, name) = split_member(unmapped).ok_or_else(no_owner)?;
                let (mapped_owner, mapped_name) = split_member(mapped).ok_or_else(no_owner)?;
                if !unmapped_desc.starts_with('(') || !mapped_desc.starts_with('(') {
                    return Err(error(index, ParseErrorKind::Malformed("method descriptor expected")));
                }
                let method = Mapping::paired(name, mapped_name).with_descriptor(Descriptor::Paired {
                    unmapped: Some(unmapped_desc.to_string()),
                    mapped: Some(mapped_desc.to_string()),
                });
                (owner, mapped_owner, Member::Method(method))
            }
            _ => return Err(error(index, ParseErrorKind::Columns)),
        };

        let class = classes
            .entry(owner.to_string())
            .or_insert_with(|| ClassMapping::new(Mapping::paired(owner, mapped_owner)));
        match member {
            Member::Field(field) => class.add_field(field).map_err(|e| error(index, e.into()))?,
            Member::Method(method) => class.add_method(method),
        }
    }

    for (_, class) in classes {
        mapping.add_class(class).map_err(|e| error(0, e.into()))?;
    }
    Ok(mapping)
}

enum Member {
    Field(Mapping),
    Method(Mapping),
}

pub(super) fn generate(mapping: &ClassifiedMapping) -> Result<Vec<String>, GenerateError> {
    let descriptors = PairedDescriptors::new(mapping);
    let mut lines = Vec::new();

    for package in mapping.packages() {
        lines.push(format!(
            "PK: {} {}",
            package.unmapped_name(),
            package.mapped_name().unwrap_or_default()
        ));
    }

    for class in mapping.classes() {
        let owner = class.mapping().unmapped_name();
        let mapped_owner = class.mapping().mapped_name().unwrap_or(owner);
        lines.push(format!("CL: {} {}", owner, mapped_owner));

        for field in class.fields() {
            let mapped = field.mapped_name().unwrap_or_default();
            match (
                descriptors.unmapped(field.get_descriptor()),
                descriptors.mapped(field.get_descriptor()),
            ) {
                (Some(unmapped_desc), Some(mapped_desc)) => lines.push(format!(
                    "FD: {}/{} {} {}/{} {}",
                    owner,
                    field.unmapped_name(),
                    unmapped_desc,
                    mapped_owner,
                    mapped,
                    mapped_desc
                )),
                _ => lines.push(format!(
                    "FD: {}/{} {}/{}",
                    owner,
                    field.unmapped_name(),
                    mapped_owner,
                    mapped
                )),
            }
        }

        for method in class.methods() {
            let missing = || GenerateError::MissingDescriptor {
                format: MappingFormat::Srg,
                owner: owner.to_string(),
                member: method.unmapped_name().to_string(),
            };
            let unmapped_desc = descriptors.unmapped(method.get_descriptor()).ok_or_else(missing)?;
            let mapped_desc = descriptors.mapped(method.get_descriptor()).ok_or_else(missing)?;
            lines.push(format!(
                "MD: {}/{} {} {}/{} {}",
                owner,
                method.unmapped_name(),
                unmapped_desc,
                mapped_owner,
                method.mapped_name().unwrap_or_default(),
                mapped_desc
            ));
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = r#"PK: . net/minecraft/src
CL: a net/minecraft/world/World
FD: a/a net/minecraft/world/World/entities
MD: a/a (Lb;)V net/minecraft/world/World/spawn (Lnet/minecraft/entity/Entity;)V
MD: a/a (I)Lb; net/minecraft/world/World/getEntity (I)Lnet/minecraft/entity/Entity;
CL: b net/minecraft/entity/Entity
FD: b/c I net/minecraft/entity/Entity/health I
"#;

    #[test]
    fn test_process() {
        let mapping = MappingFormat::Srg.parse(MAPPING).unwrap();
        assert_eq!(mapping.packages().len(), 1);

        let world = mapping.class("a").unwrap();
        assert_eq!(world.mapping().mapped_name(), Some("net/minecraft/world/World"));
        assert_eq!(world.field("a").unwrap().mapped_name(), Some("entities"));
        assert_eq!(world.methods().len(), 2);

        let entity = mapping.class("b").unwrap();
        assert_eq!(
            entity.field("c").unwrap().get_descriptor(),
            Some(&Descriptor::Paired {
                unmapped: Some("I".into()),
                mapped: Some("I".into()),
            })
        );
    }

    #[test]
    fn test_members_create_missing_classes() {
        let mapping = MappingFormat::Srg
            .parse("FD: x/y com/example/Owner/value\n")
            .unwrap();
        let class = mapping.class("x").unwrap();
        assert_eq!(class.mapping().mapped_name(), Some("com/example/Owner"));
    }

    #[test]
    fn test_round_trip() {
        let mapping = MappingFormat::Srg.parse(MAPPING).unwrap();
        let generated = MappingFormat::Srg.generate(&mapping).unwrap();
        assert_eq!(generated, MAPPING.lines().collect::<Vec<_>>());
        assert_eq!(MappingFormat::Srg.process(&generated).unwrap(), mapping);
    }

    #[test]
    fn test_malformed() {
        let err = MappingFormat::Srg.parse("CL: a\n").unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::Columns);

        let err = MappingFormat::Srg.parse("CL: a b\nMD: a/b (I)V c/d\n").unwrap_err();
        assert_eq!(err.index(), 1);
        assert_eq!(err.kind(), &ParseErrorKind::Columns);

        let err = MappingFormat::Srg.parse("XX a b\n").unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::Malformed("unknown SRG line"));
    }
}
