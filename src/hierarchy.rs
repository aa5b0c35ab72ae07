//! Class hierarchy information gathered from class headers.
//!
//! The graph is independent of any mapping. It is built once per run by
//! scanning every class in parallel: each scan yields a [`ClassHeader`],
//! the headers are folded into a [`PartialHierarchy`] on a single thread and
//! frozen into a [`HierarchyGraph`].

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classfile::attributes::{Annotation, ElementValue};
use crate::classfile::{find_attribute, ClassFile, ClassFileError, ConstantPool, Constant, ACC_PRIVATE, ACC_PUBLIC};
use crate::descriptor::object_internal_name;
use crate::utils::internal_name;

const MIXIN: &str = "Lorg/spongepowered/asm/mixin/Mixin;";

/// A Mixin reference map.
///
/// Maps, per mixin class, the string targets of `@Mixin` and its injectors
/// to the names they resolve to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinRefmap {
    /// Mixin class to target string to resolved name.
    #[serde(default)]
    pub mappings: HashMap<String, HashMap<String, String>>,
}

impl MixinRefmap {
    /// Parses a refmap from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolves a target string of `mixin`.
    pub fn resolve(&self, mixin: &str, target: &str) -> Option<&str> {
        self.mappings.get(mixin)?.get(target).map(String::as_str)
    }
}

/// The hierarchy facts of a single class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassHeader {
    /// Internal name.
    pub name: String,
    /// Superclass, interfaces and Mixin targets, in that order.
    pub supertypes: Vec<String>,
    /// Non-public fields with their access flags.
    pub fields: Vec<(String, u16)>,
    /// Non-public methods with their descriptor and access flags.
    pub methods: Vec<(String, String, u16)>,
}

impl ClassHeader {
    /// Reads the header facts of a class file.
    pub fn scan(bytes: &[u8], refmap: Option<&MixinRefmap>) -> Result<Self, ClassFileError> {
        let class = ClassFile::parse(bytes)?;
        let name = class.name()?.to_string();

        let mut supertypes = Vec::with_capacity(class.interfaces.len() + 1);
        if let Some(super_name) = class.super_name()? {
            supertypes.push(super_name.to_string());
        }
        for interface in class.interface_names()? {
            supertypes.push(interface.to_string());
        }
        for target in mixin_targets(&class, &name, refmap)? {
            if !supertypes.contains(&target) {
                supertypes.push(target);
            }
        }
        supertypes.retain(|s| !is_platform_class(s));

        let mut fields = Vec::new();
        for field in &class.fields {
            if field.access_flags & ACC_PUBLIC == 0 {
                let (field_name, _) = class.member(field)?;
                fields.push((field_name.to_string(), field.access_flags));
            }
        }
        let mut methods = Vec::new();
        for method in &class.methods {
            if method.access_flags & ACC_PUBLIC == 0 {
                let (method_name, descriptor) = class.member(method)?;
                methods.push((method_name.to_string(), descriptor.to_string(), method.access_flags));
            }
        }

        Ok(ClassHeader {
            name,
            supertypes,
            fields,
            methods,
        })
    }
}

fn is_platform_class(name: &str) -> bool {
    name.starts_with("java/")
}

fn mixin_targets(
    class: &ClassFile,
    name: &str,
    refmap: Option<&MixinRefmap>,
) -> Result<Vec<String>, ClassFileError> {
    let pool = &class.constant_pool;
    let mut targets = Vec::new();
    for attribute_name in ["RuntimeInvisibleAnnotations", "RuntimeVisibleAnnotations"] {
        let Some(attribute) = find_attribute(pool, &class.attributes, attribute_name) else {
            continue;
        };
        for annotation in Annotation::parse_table(&attribute.data)? {
            if pool.utf8(annotation.type_index)? != MIXIN {
                continue;
            }
            for (element_name, value) in &annotation.elements {
                let values = match value {
                    ElementValue::Array(values) => values.as_slice(),
                    other => std::slice::from_ref(other),
                };
                match pool.utf8(*element_name)? {
                    "value" => {
                        for value in values {
                            if let ElementValue::Class(index) = value {
                                if let Some(target) = object_internal_name(pool.utf8(*index)?) {
                                    targets.push(target.to_string());
                                }
                            }
                        }
                    }
                    "targets" => {
                        for value in values {
                            if let Some(target) = string_constant(pool, value)? {
                                let resolved = refmap
                                    .and_then(|r| r.resolve(name, target))
                                    .unwrap_or(target);
                                targets.push(internal_name(resolved));
                            }
                        }
                    }
                    _ => {}
                }
            }
            log::trace!("mixin {} targets {:?}", name, targets);
        }
    }
    Ok(targets)
}

fn string_constant<'p>(pool: &'p ConstantPool, value: &ElementValue) -> Result<Option<&'p str>, ClassFileError> {
    match value {
        ElementValue::Const { tag: b's', index } => match pool.get(*index)? {
            Constant::Utf8(value) => Ok(Some(value)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct MemberAccess {
    fields: HashMap<String, u16>,
    // name, then descriptor
    methods: HashMap<String, HashMap<String, u16>>,
}

/// A hierarchy under construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialHierarchy {
    supertypes: HashMap<String, Vec<String>>,
    access: HashMap<String, MemberAccess>,
}

impl PartialHierarchy {
    /// Creates an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the direct supertypes of a class. Platform classes are left out.
    pub fn add_class<S: Into<String>>(&mut self, name: impl Into<String>, supertypes: impl IntoIterator<Item = S>) {
        let supertypes = supertypes
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !is_platform_class(s))
            .collect();
        self.supertypes.insert(name.into(), supertypes);
    }

    /// Records the access flags of a non-public field.
    pub fn add_field_access(&mut self, class: &str, name: &str, access_flags: u16) {
        self.access
            .entry(class.to_string())
            .or_default()
            .fields
            .insert(name.to_string(), access_flags);
    }

    /// Records the access flags of a non-public method.
    pub fn add_method_access(&mut self, class: &str, name: &str, descriptor: &str, access_flags: u16) {
        self.access
            .entry(class.to_string())
            .or_default()
            .methods
            .entry(name.to_string())
            .or_default()
            .insert(descriptor.to_string(), access_flags);
    }

    /// Adds the facts of one scanned class.
    pub fn insert(&mut self, header: ClassHeader) {
        for (field, flags) in &header.fields {
            self.add_field_access(&header.name, field, *flags);
        }
        for (method, descriptor, flags) in &header.methods {
            self.add_method_access(&header.name, method, descriptor, *flags);
        }
        self.supertypes.insert(header.name, header.supertypes);
    }

    /// Folds another partial hierarchy into this one.
    ///
    /// On conflicts the entries of `other` win.
    pub fn merge(&mut self, other: PartialHierarchy) {
        self.supertypes.extend(other.supertypes);
        for (class, access) in other.access {
            let entry = self.access.entry(class).or_default();
            entry.fields.extend(access.fields);
            for (name, descriptors) in access.methods {
                entry.methods.entry(name).or_default().extend(descriptors);
            }
        }
    }

    /// Freezes the hierarchy.
    pub fn build(self) -> HierarchyGraph {
        HierarchyGraph {
            supertypes: self.supertypes,
            access: self.access,
        }
    }
}

/// An immutable class hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyGraph {
    supertypes: HashMap<String, Vec<String>>,
    access: HashMap<String, MemberAccess>,
}

impl HierarchyGraph {
    /// Scans class files in parallel and merges the results.
    ///
    /// Classes that fail to parse are logged, skipped and returned with
    /// their position in `classes`.
    pub fn scan<B>(classes: &[B], refmap: Option<&MixinRefmap>) -> (Self, Vec<(usize, ClassFileError)>)
    where
        B: AsRef<[u8]> + Sync,
    {
        let headers: Vec<Result<ClassHeader, ClassFileError>> = classes
            .par_iter()
            .map(|bytes| ClassHeader::scan(bytes.as_ref(), refmap))
            .collect();

        let mut hierarchy = PartialHierarchy::new();
        let mut failures = Vec::new();
        for (index, header) in headers.into_iter().enumerate() {
            match header {
                Ok(header) => hierarchy.insert(header),
                Err(err) => {
                    log::warn!("skipping class {} in hierarchy scan: {}", index, err);
                    failures.push((index, err));
                }
            }
        }
        let graph = hierarchy.build();
        log::debug!("scanned hierarchy of {} classes", graph.len());
        (graph, failures)
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.supertypes.len()
    }

    /// Whether no class is known.
    pub fn is_empty(&self) -> bool {
        self.supertypes.is_empty()
    }

    /// Direct supertypes of `class`, superclass first.
    pub fn supertypes(&self, class: &str) -> &[String] {
        self.supertypes.get(class).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `class` declares `name` as a private field.
    pub fn is_private_field(&self, class: &str, name: &str) -> bool {
        self.access
            .get(class)
            .and_then(|a| a.fields.get(name))
            .is_some_and(|flags| flags & ACC_PRIVATE != 0)
    }

    /// Whether `class` declares `name` with `descriptor` as a private method.
    pub fn is_private_method(&self, class: &str, name: &str, descriptor: &str) -> bool {
        self.access
            .get(class)
            .and_then(|a| a.methods.get(name))
            .and_then(|descriptors| descriptors.get(descriptor))
            .is_some_and(|flags| flags & ACC_PRIVATE != 0)
    }

    /// All transitive supertypes of `class`, depth-first, superclass first.
    ///
    /// Each class is visited once, cycles end the walk.
    pub fn ancestors<'a>(&'a self, class: &'a str) -> Ancestors<'a> {
        let mut visited = HashSet::new();
        visited.insert(class);
        let mut stack: Vec<&str> = self.supertypes(class).iter().rev().map(String::as_str).collect();
        stack.retain(|s| *s != class);
        Ancestors {
            graph: self,
            stack,
            visited,
        }
    }
}

/// Iterator over the transitive supertypes of a class.
pub struct Ancestors<'a> {
    graph: &'a HierarchyGraph,
    stack: Vec<&'a str>,
    visited: HashSet<&'a str>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(class) = self.stack.pop() {
            if !self.visited.insert(class) {
                continue;
            }
            let graph = self.graph;
            for supertype in graph.supertypes(class).iter().rev() {
                if !self.visited.contains(supertype.as_str()) {
                    self.stack.push(supertype);
                }
            }
            return Some(class);
        }
        None
    }
}
