//! The unified mapping model.
//!
//! Every mapping format parses into a [`ClassifiedMapping`]. Two-column
//! formats produce [`Names::Paired`] entries, multi-column formats produce
//! [`Names::Namespaced`] ones. Optional per-entity metadata lives in
//! [`Components`].

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;
use indexmap::IndexMap;
use thiserror::Error;

use crate::descriptor::remap_descriptor;
use crate::utils::lookup_nested_class;

/// Errors raised while building or transforming a mapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// Two classes with the same unmapped name.
    #[error("duplicate class `{0}`")]
    DuplicateClass(String),
    /// Two fields with the same unmapped name in one class.
    #[error("duplicate field `{field}` in class `{class}`")]
    DuplicateField {
        /// The owning class.
        class: String,
        /// The field name.
        field: String,
    },
    /// The operation needs the other kind of names.
    #[error("operation requires {expected} names")]
    WrongKind {
        /// `"paired"` or `"namespaced"`.
        expected: &'static str,
    },
    /// A namespace the mapping does not declare.
    #[error("unknown namespace `{0}`")]
    UnknownNamespace(String),
    /// The entity has no name in the namespace it should be keyed by.
    #[error("`{name}` has no name in namespace `{namespace}`")]
    MissingName {
        /// The unmapped name of the entity.
        name: String,
        /// The namespace without a name.
        namespace: String,
    },
    /// The names and namespaces columns do not line up.
    #[error("expected {expected} names, found {found}")]
    NameCount {
        /// Number of namespaces.
        expected: usize,
        /// Number of names given.
        found: usize,
    },
    /// A namespace was declared twice.
    #[error("duplicate namespace `{0}`")]
    DuplicateNamespace(String),
    /// A line number range with start after end.
    #[error("invalid line range {start}..{end}")]
    InvalidLineNumber {
        /// First line.
        start: u32,
        /// Last line.
        end: u32,
    },
    /// A fail-fast component access found nothing.
    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// Raised when a required component is not attached.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("missing component {0:?}")]
pub struct ComponentError(pub ComponentSet);

bitflags! {
    /// The set of components attached to a [`Mapping`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentSet: u8 {
        /// A [`Descriptor`].
        const DESCRIPTOR = 1;
        /// A [`LineNumber`] range.
        const LINE_NUMBER = 1 << 1;
        /// A local variable table.
        const LOCAL_VARIABLE_TABLE = 1 << 2;
        /// The static flag.
        const STATIC_IDENTIFIABLE = 1 << 3;
        /// The owning class.
        const OWNED = 1 << 4;
    }
}

/// The names of a single symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Names {
    /// An unmapped (obfuscated) and a mapped (readable) name.
    Paired {
        /// The unmapped name.
        unmapped: String,
        /// The mapped name.
        mapped: String,
    },
    /// One optional name per namespace, in declaration order.
    Namespaced {
        /// Namespace to name.
        names: IndexMap<String, Option<String>>,
        /// The namespace the symbol is keyed by.
        unmapped_namespace: String,
    },
}

impl Names {
    /// Creates paired names.
    pub fn paired(unmapped: impl Into<String>, mapped: impl Into<String>) -> Self {
        Names::Paired {
            unmapped: unmapped.into(),
            mapped: mapped.into(),
        }
    }

    /// Creates namespaced names, one per namespace.
    ///
    /// Fails if namespaces repeat, the column counts differ or the
    /// unmapped namespace has no name.
    pub fn namespaced<S: AsRef<str>>(
        namespaces: &[S],
        names: Vec<Option<String>>,
        unmapped_namespace: &str,
    ) -> Result<Self, MappingError> {
        let names = Self::namespaced_partial(namespaces, names, unmapped_namespace)?;
        if names.get(unmapped_namespace).is_none() {
            return Err(MappingError::MissingName {
                name: String::new(),
                namespace: unmapped_namespace.to_string(),
            });
        }
        Ok(names)
    }

    /// Creates namespaced names whose unmapped name may be absent.
    ///
    /// Local variables of namespaced formats often have no name in the
    /// obfuscated namespace.
    pub fn namespaced_partial<S: AsRef<str>>(
        namespaces: &[S],
        names: Vec<Option<String>>,
        unmapped_namespace: &str,
    ) -> Result<Self, MappingError> {
        if namespaces.len() != names.len() {
            return Err(MappingError::NameCount {
                expected: namespaces.len(),
                found: names.len(),
            });
        }
        let mut map = IndexMap::with_capacity(names.len());
        for (namespace, name) in namespaces.iter().zip(names) {
            let namespace = namespace.as_ref();
            if map.insert(namespace.to_string(), name).is_some() {
                return Err(MappingError::DuplicateNamespace(namespace.to_string()));
            }
        }
        if !map.contains_key(unmapped_namespace) {
            return Err(MappingError::UnknownNamespace(unmapped_namespace.to_string()));
        }
        Ok(Names::Namespaced {
            names: map,
            unmapped_namespace: unmapped_namespace.to_string(),
        })
    }

    /// The name the symbol is keyed by.
    pub fn unmapped(&self) -> &str {
        match self {
            Names::Paired { unmapped, .. } => unmapped,
            Names::Namespaced {
                names,
                unmapped_namespace,
            } => names
                .get(unmapped_namespace)
                .and_then(|n| n.as_deref())
                .unwrap_or_default(),
        }
    }

    /// The mapped name of paired names.
    pub fn mapped(&self) -> Option<&str> {
        match self {
            Names::Paired { mapped, .. } => Some(mapped),
            Names::Namespaced { .. } => None,
        }
    }

    /// The name in `namespace`, for namespaced names.
    pub fn get(&self, namespace: &str) -> Option<&str> {
        match self {
            Names::Paired { .. } => None,
            Names::Namespaced { names, .. } => names.get(namespace).and_then(|n| n.as_deref()),
        }
    }

    /// The unmapped namespace, for namespaced names.
    pub fn unmapped_namespace(&self) -> Option<&str> {
        match self {
            Names::Paired { .. } => None,
            Names::Namespaced {
                unmapped_namespace, ..
            } => Some(unmapped_namespace),
        }
    }

    /// Whether these are paired names.
    pub fn is_paired(&self) -> bool {
        matches!(self, Names::Paired { .. })
    }

    fn reversed(&self) -> Result<Names, MappingError> {
        match self {
            Names::Paired { unmapped, mapped } => Ok(Names::paired(mapped.clone(), unmapped.clone())),
            Names::Namespaced { .. } => Err(MappingError::WrongKind { expected: "paired" }),
        }
    }

    /// Makes `target` the unmapped namespace. The names of the old and
    /// the new unmapped namespace exchange positions.
    fn swapped(&self, target: &str, partial: bool) -> Result<Names, MappingError> {
        match self {
            Names::Namespaced {
                names,
                unmapped_namespace,
            } => {
                match names.get(target) {
                    None => return Err(MappingError::UnknownNamespace(target.to_string())),
                    Some(None) if !partial => {
                        return Err(MappingError::MissingName {
                            name: self.unmapped().to_string(),
                            namespace: target.to_string(),
                        })
                    }
                    Some(_) => {}
                }
                let mut names = names.clone();
                if let (Some(from), Some(to)) = (names.get_index_of(unmapped_namespace), names.get_index_of(target)) {
                    names.swap_indices(from, to);
                }
                Ok(Names::Namespaced {
                    names,
                    unmapped_namespace: target.to_string(),
                })
            }
            Names::Paired { .. } => Err(MappingError::WrongKind {
                expected: "namespaced",
            }),
        }
    }
}

/// A field or method descriptor attached to a mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptor {
    /// Descriptors expressed in unmapped and/or mapped class names.
    Paired {
        /// In unmapped class names.
        unmapped: Option<String>,
        /// In mapped class names.
        mapped: Option<String>,
    },
    /// A descriptor expressed in the class names of `namespace`.
    Namespaced {
        /// The descriptor text.
        descriptor: String,
        /// The namespace the class names belong to.
        namespace: String,
    },
}

impl Descriptor {
    /// A paired descriptor known in unmapped class names only.
    pub fn unmapped(descriptor: impl Into<String>) -> Self {
        Descriptor::Paired {
            unmapped: Some(descriptor.into()),
            mapped: None,
        }
    }

    /// A paired descriptor known in mapped class names only.
    pub fn mapped(descriptor: impl Into<String>) -> Self {
        Descriptor::Paired {
            unmapped: None,
            mapped: Some(descriptor.into()),
        }
    }

    /// A namespaced descriptor.
    pub fn namespaced(descriptor: impl Into<String>, namespace: impl Into<String>) -> Self {
        Descriptor::Namespaced {
            descriptor: descriptor.into(),
            namespace: namespace.into(),
        }
    }
}

/// An inclusive source line range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineNumber {
    start: u32,
    end: u32,
}

impl LineNumber {
    /// Creates a range, failing when `start > end`.
    pub fn new(start: u32, end: u32) -> Result<Self, MappingError> {
        if start > end {
            return Err(MappingError::InvalidLineNumber { start, end });
        }
        Ok(LineNumber { start, end })
    }

    /// First line.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last line, inclusive.
    pub fn end(&self) -> u32 {
        self.end
    }
}

/// Local variable slot to its names.
pub type LocalVariableTable = BTreeMap<u16, Mapping>;

/// Optional facets of a [`Mapping`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Components {
    descriptor: Option<Descriptor>,
    line_number: Option<LineNumber>,
    local_variables: Option<LocalVariableTable>,
    is_static: Option<bool>,
    owner: Option<String>,
}

/// A named symbol with its components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    names: Names,
    components: Components,
}

impl Mapping {
    /// Creates a mapping without components.
    pub fn new(names: Names) -> Self {
        Mapping {
            names,
            components: Components::default(),
        }
    }

    /// Shorthand for a paired mapping.
    pub fn paired(unmapped: impl Into<String>, mapped: impl Into<String>) -> Self {
        Mapping::new(Names::paired(unmapped, mapped))
    }

    /// The names of this symbol.
    pub fn names(&self) -> &Names {
        &self.names
    }

    /// The name the symbol is keyed by.
    pub fn unmapped_name(&self) -> &str {
        self.names.unmapped()
    }

    /// The mapped name of a paired mapping.
    pub fn mapped_name(&self) -> Option<&str> {
        self.names.mapped()
    }

    /// The name in a namespace.
    pub fn name(&self, namespace: &str) -> Option<&str> {
        self.names.get(namespace)
    }

    /// The attached components.
    pub fn component_set(&self) -> ComponentSet {
        let c = &self.components;
        let mut set = ComponentSet::empty();
        set.set(ComponentSet::DESCRIPTOR, c.descriptor.is_some());
        set.set(ComponentSet::LINE_NUMBER, c.line_number.is_some());
        set.set(ComponentSet::LOCAL_VARIABLE_TABLE, c.local_variables.is_some());
        set.set(ComponentSet::STATIC_IDENTIFIABLE, c.is_static.is_some());
        set.set(ComponentSet::OWNED, c.owner.is_some());
        set
    }

    /// Attaches a descriptor.
    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.components.descriptor = Some(descriptor);
        self
    }

    /// Attaches a line range.
    pub fn with_line_number(mut self, line_number: LineNumber) -> Self {
        self.components.line_number = Some(line_number);
        self
    }

    /// Attaches a static flag.
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.components.is_static = Some(is_static);
        self
    }

    /// Attaches an empty local variable table.
    pub fn with_local_variables(mut self) -> Self {
        self.components.local_variables.get_or_insert_with(BTreeMap::new);
        self
    }

    /// The descriptor, if attached.
    pub fn get_descriptor(&self) -> Option<&Descriptor> {
        self.components.descriptor.as_ref()
    }

    /// The descriptor, failing when it is not attached.
    pub fn descriptor(&self) -> Result<&Descriptor, ComponentError> {
        self.get_descriptor()
            .ok_or(ComponentError(ComponentSet::DESCRIPTOR))
    }

    /// The line range, if attached.
    pub fn line_number(&self) -> Option<LineNumber> {
        self.components.line_number
    }

    /// The static flag, if attached.
    pub fn is_static(&self) -> Option<bool> {
        self.components.is_static
    }

    /// Sets the static flag, failing when the component is not attached.
    pub fn set_static(&mut self, is_static: bool) -> Result<(), ComponentError> {
        match self.components.is_static.as_mut() {
            Some(flag) => {
                *flag = is_static;
                Ok(())
            }
            None => Err(ComponentError(ComponentSet::STATIC_IDENTIFIABLE)),
        }
    }

    /// The local variable table, if attached.
    pub fn local_variables(&self) -> Option<&LocalVariableTable> {
        self.components.local_variables.as_ref()
    }

    /// Records the names of the local variable in `slot`.
    pub fn set_local_variable(&mut self, slot: u16, names: Mapping) -> Result<(), ComponentError> {
        match self.components.local_variables.as_mut() {
            Some(table) => {
                table.insert(slot, names);
                Ok(())
            }
            None => Err(ComponentError(ComponentSet::LOCAL_VARIABLE_TABLE)),
        }
    }

    /// Unmapped name of the owning class, set when added to a [`ClassMapping`].
    pub fn owner(&self) -> Option<&str> {
        self.components.owner.as_deref()
    }

    fn transformed<N, D>(&self, names: &N, translate: &mut D) -> Result<Mapping, MappingError>
    where
        N: Fn(&Names, bool) -> Result<Names, MappingError>,
        D: FnMut(&Descriptor) -> Descriptor,
    {
        let local_variables = match &self.components.local_variables {
            Some(table) => {
                let mut out = BTreeMap::new();
                for (slot, variable) in table {
                    out.insert(*slot, variable.transformed_variable(names)?);
                }
                Some(out)
            }
            None => None,
        };
        Ok(Mapping {
            names: names(&self.names, false)?,
            components: Components {
                descriptor: self.components.descriptor.as_ref().map(|d| translate(d)),
                line_number: self.components.line_number,
                local_variables,
                is_static: self.components.is_static,
                owner: None,
            },
        })
    }

    fn transformed_variable<N>(&self, names: &N) -> Result<Mapping, MappingError>
    where
        N: Fn(&Names, bool) -> Result<Names, MappingError>,
    {
        Ok(Mapping {
            names: names(&self.names, true)?,
            components: self.components.clone(),
        })
    }
}

/// A class with its fields and methods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMapping {
    mapping: Mapping,
    fields: IndexMap<String, Mapping>,
    methods: Vec<Mapping>,
}

impl ClassMapping {
    /// Creates a class without members.
    pub fn new(mapping: Mapping) -> Self {
        ClassMapping {
            mapping,
            fields: IndexMap::new(),
            methods: Vec::new(),
        }
    }

    /// The class's own names.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Adds a field, keyed by its unmapped name.
    pub fn add_field(&mut self, mut field: Mapping) -> Result<(), MappingError> {
        let key = field.unmapped_name().to_string();
        if self.fields.contains_key(&key) {
            return Err(MappingError::DuplicateField {
                class: self.mapping.unmapped_name().to_string(),
                field: key,
            });
        }
        field.components.owner = Some(self.mapping.unmapped_name().to_string());
        self.fields.insert(key, field);
        Ok(())
    }

    /// Adds a method. Overloads are distinguished by descriptor.
    pub fn add_method(&mut self, mut method: Mapping) {
        method.components.owner = Some(self.mapping.unmapped_name().to_string());
        self.methods.push(method);
    }

    /// Looks up a field by unmapped name.
    pub fn field(&self, name: &str) -> Option<&Mapping> {
        self.fields.get(name)
    }

    /// All fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &Mapping> {
        self.fields.values()
    }

    /// All methods in insertion order.
    pub fn methods(&self) -> &[Mapping] {
        &self.methods
    }

    /// The last added method, used by tree-shaped formats to attach children.
    pub(crate) fn last_method_mut(&mut self) -> Option<&mut Mapping> {
        self.methods.last_mut()
    }

    fn transformed<N, D>(&self, names: &N, translate: &mut D) -> Result<ClassMapping, MappingError>
    where
        N: Fn(&Names, bool) -> Result<Names, MappingError>,
        D: FnMut(&Descriptor) -> Descriptor,
    {
        let mut class = ClassMapping::new(self.mapping.transformed(names, translate)?);
        for field in self.fields.values() {
            class.add_field(field.transformed(names, translate)?)?;
        }
        for method in &self.methods {
            class.add_method(method.transformed(names, translate)?);
        }
        Ok(class)
    }
}

/// All classes and packages read from one mapping source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassifiedMapping {
    namespaces: Vec<String>,
    classes: IndexMap<String, ClassMapping>,
    packages: Vec<Mapping>,
}

impl ClassifiedMapping {
    /// An empty mapping with paired names.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty mapping with the given namespaces.
    pub fn namespaced(namespaces: Vec<String>) -> Self {
        ClassifiedMapping {
            namespaces,
            ..Default::default()
        }
    }

    /// Declared namespaces, empty for paired mappings.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Whether the mapping is namespaced.
    pub fn is_namespaced(&self) -> bool {
        !self.namespaces.is_empty()
    }

    /// The unmapped namespace shared by the entries.
    pub fn unmapped_namespace(&self) -> Option<&str> {
        self.classes
            .values()
            .map(|c| c.mapping().names())
            .chain(self.packages.iter().map(|p| p.names()))
            .find_map(|n| n.unmapped_namespace())
            .or_else(|| self.namespaces.first().map(String::as_str))
    }

    /// Adds a class, keyed by its unmapped name.
    pub fn add_class(&mut self, class: ClassMapping) -> Result<(), MappingError> {
        let key = class.mapping().unmapped_name().to_string();
        if self.classes.contains_key(&key) {
            return Err(MappingError::DuplicateClass(key));
        }
        self.classes.insert(key, class);
        Ok(())
    }

    /// Adds a package mapping.
    pub fn add_package(&mut self, package: Mapping) {
        self.packages.push(package);
    }

    /// Looks up a class by unmapped name.
    pub fn class(&self, name: &str) -> Option<&ClassMapping> {
        self.classes.get(name)
    }

    /// All classes in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassMapping> {
        self.classes.values()
    }

    pub(crate) fn last_class_mut(&mut self) -> Option<&mut ClassMapping> {
        self.classes.last_mut().map(|(_, class)| class)
    }

    /// All packages.
    pub fn packages(&self) -> &[Mapping] {
        &self.packages
    }

    /// Index of class names from one side of the mapping to another.
    ///
    /// Classes without a name on either side are left out.
    pub fn class_index(&self, from: NameSide<'_>, to: NameSide<'_>) -> ClassNameIndex {
        let names = self
            .classes
            .values()
            .filter_map(|class| {
                let names = class.mapping().names();
                Some((from.of(names)?.to_string(), to.of(names)?.to_string()))
            })
            .collect();
        ClassNameIndex { names }
    }

    /// Swaps unmapped and mapped names everywhere, re-expressing descriptors.
    ///
    /// Only valid for paired mappings.
    pub fn reverse(&mut self) -> Result<(), MappingError> {
        if self.is_namespaced() {
            return Err(MappingError::WrongKind { expected: "paired" });
        }
        let forward = self.class_index(NameSide::Unmapped, NameSide::Mapped);
        let backward = self.class_index(NameSide::Mapped, NameSide::Unmapped);
        let mut translate = |descriptor: &Descriptor| match descriptor {
            Descriptor::Paired { unmapped, mapped } => Descriptor::Paired {
                unmapped: unmapped.as_deref().map(|d| forward.translate(d)),
                mapped: mapped.as_deref().map(|d| backward.translate(d)),
            },
            other => other.clone(),
        };
        *self = self.transformed(Vec::new(), &|names: &Names, _| names.reversed(), &mut translate)?;
        log::debug!("reversed mapping with {} classes", self.classes.len());
        Ok(())
    }

    /// Makes `target` the unmapped namespace, re-expressing descriptors.
    ///
    /// `source` must be the current unmapped namespace. The two namespaces
    /// exchange positions, so a mapping whose unmapped namespace comes first
    /// keeps it first. Only valid for namespaced mappings.
    pub fn swap(&mut self, source: &str, target: &str) -> Result<(), MappingError> {
        if !self.is_namespaced() {
            return Err(MappingError::WrongKind {
                expected: "namespaced",
            });
        }
        for namespace in [source, target] {
            if !self.namespaces.iter().any(|n| n == namespace) {
                return Err(MappingError::UnknownNamespace(namespace.to_string()));
            }
        }
        if self.unmapped_namespace() != Some(source) {
            return Err(MappingError::UnknownNamespace(source.to_string()));
        }

        let mut indexes: HashMap<String, ClassNameIndex> = HashMap::new();
        let mut translate = |descriptor: &Descriptor| match descriptor {
            Descriptor::Namespaced {
                descriptor,
                namespace,
            } if namespace != target => {
                let index = indexes.entry(namespace.clone()).or_insert_with(|| {
                    self.class_index(NameSide::Namespace(namespace), NameSide::Namespace(target))
                });
                Descriptor::namespaced(index.translate(descriptor), target)
            }
            other => other.clone(),
        };
        let mut namespaces = self.namespaces.clone();
        if let (Some(from), Some(to)) = (
            namespaces.iter().position(|n| n == source),
            namespaces.iter().position(|n| n == target),
        ) {
            namespaces.swap(from, to);
        }
        let swapped = self.transformed(
            namespaces,
            &|names: &Names, partial| names.swapped(target, partial),
            &mut translate,
        )?;
        *self = swapped;
        log::debug!("swapped mapping namespaces {} -> {}", source, target);
        Ok(())
    }

    fn transformed<N, D>(
        &self,
        namespaces: Vec<String>,
        names: &N,
        translate: &mut D,
    ) -> Result<ClassifiedMapping, MappingError>
    where
        N: Fn(&Names, bool) -> Result<Names, MappingError>,
        D: FnMut(&Descriptor) -> Descriptor,
    {
        let mut out = ClassifiedMapping::namespaced(namespaces);
        for class in self.classes.values() {
            out.add_class(class.transformed(names, translate)?)?;
        }
        for package in &self.packages {
            out.add_package(package.transformed(names, translate)?);
        }
        Ok(out)
    }
}

/// Selects one name out of a [`Names`] value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameSide<'a> {
    /// The unmapped name.
    Unmapped,
    /// The mapped name of paired names.
    Mapped,
    /// The name in a namespace.
    Namespace(&'a str),
}

impl NameSide<'_> {
    /// Picks the side out of `names`.
    pub fn of<'n>(&self, names: &'n Names) -> Option<&'n str> {
        match self {
            NameSide::Unmapped => Some(names.unmapped()),
            NameSide::Mapped => names.mapped(),
            NameSide::Namespace(namespace) => names.get(namespace),
        }
    }
}

/// Class name translation table between two sides of a mapping.
#[derive(Clone, Debug, Default)]
pub struct ClassNameIndex {
    names: HashMap<String, String>,
}

impl ClassNameIndex {
    /// Translates a single class name.
    pub fn get(&self, class: &str) -> Option<&str> {
        self.names.get(class).map(String::as_str)
    }

    /// Translates every class token in a descriptor; unknown classes stay.
    ///
    /// Inner classes of known outer classes are translated through the
    /// outer class, like the remapper does.
    pub fn translate(&self, descriptor: &str) -> String {
        remap_descriptor(descriptor, |class| lookup_nested_class(class, |name| self.get(name)))
    }
}
