//! Name resolution from a source to a target side of a mapping.
//!
//! A [`Remapper`] is built once from a [`ClassifiedMapping`] and a
//! [`HierarchyGraph`] and then shared by all rewriting tasks. Every lookup
//! returns the input unchanged when nothing maps.

use std::collections::HashMap;

use crate::descriptor::{object_internal_name, remap_descriptor, remap_signature};
use crate::hierarchy::HierarchyGraph;
use crate::mapping::{ClassNameIndex, ClassifiedMapping, Descriptor, Mapping, MappingError, NameSide};
use crate::utils::lookup_nested_class;

/// The kind of a generic signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureKind {
    /// A class signature: type parameters, superclass and interfaces.
    Class,
    /// A method signature.
    Method,
    /// A field or local variable signature.
    Field,
}

struct MethodEntry<'m> {
    descriptor: Option<String>,
    target: Option<&'m str>,
    mapping: &'m Mapping,
}

#[derive(Default)]
struct ClassEntry<'m> {
    target: Option<&'m str>,
    fields: HashMap<&'m str, &'m str>,
    methods: HashMap<&'m str, Vec<MethodEntry<'m>>>,
}

impl<'m> ClassEntry<'m> {
    fn method(&self, name: &str, descriptor: &str) -> Option<&MethodEntry<'m>> {
        let candidates = self.methods.get(name)?;
        candidates
            .iter()
            .find(|m| m.descriptor.as_deref() == Some(descriptor))
            .or_else(|| candidates.iter().find(|m| m.descriptor.is_none()))
    }
}

/// Resolves class, member and local variable names.
pub struct Remapper<'m> {
    hierarchy: &'m HierarchyGraph,
    target: NameSide<'m>,
    classes: HashMap<&'m str, ClassEntry<'m>>,
}

impl<'m> Remapper<'m> {
    /// A remapper from unmapped to mapped names of a paired mapping.
    pub fn new(mapping: &'m ClassifiedMapping, hierarchy: &'m HierarchyGraph) -> Result<Self, MappingError> {
        if mapping.is_namespaced() {
            return Err(MappingError::WrongKind { expected: "paired" });
        }
        let backward = mapping.class_index(NameSide::Mapped, NameSide::Unmapped);
        let source_descriptor = |descriptor: &Descriptor| match descriptor {
            Descriptor::Paired {
                unmapped: Some(d), ..
            } => Some(d.clone()),
            Descriptor::Paired {
                mapped: Some(d), ..
            } => Some(backward.translate(d)),
            _ => None,
        };
        Ok(Self::build(
            mapping,
            hierarchy,
            NameSide::Unmapped,
            NameSide::Mapped,
            source_descriptor,
        ))
    }

    /// A remapper between two namespaces of a namespaced mapping.
    pub fn namespaced(
        mapping: &'m ClassifiedMapping,
        hierarchy: &'m HierarchyGraph,
        source: &'m str,
        target: &'m str,
    ) -> Result<Self, MappingError> {
        if !mapping.is_namespaced() {
            return Err(MappingError::WrongKind {
                expected: "namespaced",
            });
        }
        for namespace in [source, target] {
            if !mapping.namespaces().iter().any(|n| n == namespace) {
                return Err(MappingError::UnknownNamespace(namespace.to_string()));
            }
        }
        let mut indexes: HashMap<String, ClassNameIndex> = HashMap::new();
        let source_descriptor = |descriptor: &Descriptor| match descriptor {
            Descriptor::Namespaced {
                descriptor,
                namespace,
            } if namespace == source => Some(descriptor.clone()),
            Descriptor::Namespaced {
                descriptor,
                namespace,
            } => {
                let index = indexes.entry(namespace.clone()).or_insert_with(|| {
                    mapping.class_index(NameSide::Namespace(namespace), NameSide::Namespace(source))
                });
                Some(index.translate(descriptor))
            }
            Descriptor::Paired { .. } => None,
        };
        Ok(Self::build(
            mapping,
            hierarchy,
            NameSide::Namespace(source),
            NameSide::Namespace(target),
            source_descriptor,
        ))
    }

    fn build<F>(
        mapping: &'m ClassifiedMapping,
        hierarchy: &'m HierarchyGraph,
        source: NameSide<'m>,
        target: NameSide<'m>,
        mut source_descriptor: F,
    ) -> Self
    where
        F: FnMut(&Descriptor) -> Option<String>,
    {
        let mut classes: HashMap<&'m str, ClassEntry<'m>> = HashMap::new();
        for class in mapping.classes() {
            let Some(name) = source.of(class.mapping().names()) else {
                continue;
            };
            let entry = classes.entry(name).or_default();
            entry.target = target.of(class.mapping().names()).filter(|t| !t.is_empty());
            for field in class.fields() {
                if let (Some(from), Some(to)) = (source.of(field.names()), target.of(field.names())) {
                    entry.fields.insert(from, to);
                }
            }
            for method in class.methods() {
                let Some(from) = source.of(method.names()) else {
                    continue;
                };
                entry.methods.entry(from).or_default().push(MethodEntry {
                    descriptor: method.get_descriptor().and_then(&mut source_descriptor),
                    target: target.of(method.names()),
                    mapping: method,
                });
            }
        }
        log::debug!("built remapper over {} classes", classes.len());
        Remapper {
            hierarchy,
            target,
            classes,
        }
    }

    /// The hierarchy used for inherited members.
    pub fn hierarchy(&self) -> &'m HierarchyGraph {
        self.hierarchy
    }

    fn lookup_class(&self, name: &str) -> Option<String> {
        lookup_nested_class(name, |class| self.classes.get(class).and_then(|c| c.target))
    }

    /// Maps an internal class name. Array descriptors are mapped as descriptors.
    pub fn map_class_name(&self, name: &str) -> String {
        if name.starts_with('[') {
            return self.map_descriptor(name);
        }
        self.lookup_class(name).unwrap_or_else(|| name.to_string())
    }

    /// Maps a field name, looking through the supertypes of `owner`.
    pub fn map_field_name(&self, owner: &str, name: &str) -> String {
        if let Some(target) = self.classes.get(owner).and_then(|c| c.fields.get(name)) {
            return target.to_string();
        }
        for ancestor in self.hierarchy.ancestors(owner) {
            if self.hierarchy.is_private_field(ancestor, name) {
                continue;
            }
            if let Some(target) = self.classes.get(ancestor).and_then(|c| c.fields.get(name)) {
                return target.to_string();
            }
        }
        name.to_string()
    }

    fn find_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<&MethodEntry<'m>> {
        if let Some(method) = self.classes.get(owner).and_then(|c| c.method(name, descriptor)) {
            return Some(method);
        }
        self.hierarchy
            .ancestors(owner)
            .filter(|ancestor| !self.hierarchy.is_private_method(ancestor, name, descriptor))
            .find_map(|ancestor| self.classes.get(ancestor)?.method(name, descriptor))
    }

    /// Maps a method name, selecting the overload by `descriptor` and
    /// looking through the supertypes of `owner`.
    ///
    /// Constructors and static initializers are never renamed.
    pub fn map_method_name(&self, owner: &str, name: &str, descriptor: &str) -> String {
        if name == "<init>" || name == "<clinit>" {
            return name.to_string();
        }
        self.find_method(owner, name, descriptor)
            .and_then(|m| m.target)
            .unwrap_or(name)
            .to_string()
    }

    /// Maps an annotation element name, declared as a method of the
    /// annotation type.
    pub fn map_annotation_attribute_name(&self, annotation_descriptor: &str, name: &str) -> String {
        let target = object_internal_name(annotation_descriptor)
            .and_then(|owner| self.classes.get(owner))
            .and_then(|c| c.methods.get(name))
            .and_then(|candidates| {
                candidates
                    .iter()
                    .find(|m| m.descriptor.as_deref().map_or(true, |d| d.starts_with("()")))
            })
            .and_then(|m| m.target);
        target.unwrap_or(name).to_string()
    }

    /// Maps every class token of a field descriptor.
    pub fn map_descriptor(&self, descriptor: &str) -> String {
        remap_descriptor(descriptor, |class| self.lookup_class(class))
    }

    /// Maps every class token of a method descriptor.
    pub fn map_method_descriptor(&self, descriptor: &str) -> String {
        self.map_descriptor(descriptor)
    }

    /// Maps a generic signature. Malformed signatures are returned unchanged.
    pub fn map_signature(&self, signature: &str, kind: SignatureKind) -> String {
        let shape_ok = match kind {
            SignatureKind::Method => signature.starts_with('(') || signature.starts_with('<'),
            SignatureKind::Class => !signature.starts_with('('),
            SignatureKind::Field => !signature.starts_with('(') && !signature.starts_with('<'),
        };
        let mapped = shape_ok
            .then(|| remap_signature(signature, |class| self.lookup_class(class)))
            .flatten();
        match mapped {
            Some(mapped) => mapped,
            None => {
                log::trace!("leaving malformed {:?} signature `{}`", kind, signature);
                signature.to_string()
            }
        }
    }

    /// Maps the simple name of an inner class from its full internal name.
    pub fn map_inner_class_name(&self, name: &str, inner_simple_name: &str) -> String {
        let mapped = self.map_class_name(name);
        if mapped == name {
            return inner_simple_name.to_string();
        }
        match mapped.rsplit_once('$') {
            Some((_, simple)) => {
                // local classes carry a numeric prefix such as `1Local`
                let trimmed = simple.trim_start_matches(|c: char| c.is_ascii_digit());
                if trimmed.is_empty() {
                    simple.to_string()
                } else {
                    trimmed.to_string()
                }
            }
            None => mapped.rsplit('/').next().unwrap_or(inner_simple_name).to_string(),
        }
    }

    fn declared_method(&self, owner: &str, method: &str, descriptor: &str) -> Option<&MethodEntry<'m>> {
        self.classes.get(owner)?.method(method, descriptor)
    }

    /// The target name of a local variable, from the declaring method's
    /// local variable table.
    pub fn local_variable_name(&self, owner: &str, method: &str, descriptor: &str, slot: u16) -> Option<&'m str> {
        let entry = self.declared_method(owner, method, descriptor)?;
        let variable = entry.mapping.local_variables()?.get(&slot)?;
        self.target.of(variable.names()).filter(|n| !n.is_empty())
    }

    /// Whether the declaring method carries a local variable table.
    pub fn has_local_variables(&self, owner: &str, method: &str, descriptor: &str) -> bool {
        self.declared_method(owner, method, descriptor)
            .is_some_and(|m| m.mapping.local_variables().is_some())
    }
}
