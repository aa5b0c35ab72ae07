use std::collections::HashMap;
use std::fmt;

use crate::classfile::{find_attribute, Attribute, ClassFile, ConstantPool, ConstantPoolBuilder, MemberInfo};
use crate::remapper::Remapper;

use super::{RewriteError, VariableLedger};

/// Progress of a class through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitState {
    /// Nothing visited yet.
    Unvisited,
    /// The header was visited.
    HeaderSeen,
    /// At least one member was visited.
    Members,
    /// The end was visited.
    Closed,
}

/// An event dispatched to the stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// The class header.
    Header,
    /// A field, in declaration order.
    Field,
    /// A method, in declaration order.
    Method,
    /// The end of the class.
    End,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Event::Header => "header",
            Event::Field => "field",
            Event::Method => "method",
            Event::End => "end",
        })
    }
}

/// Per-class state shared by the stages of a pipeline.
///
/// Reads of class and member references go through the original constant
/// pool. New entries are appended through the builder, and `Utf8` entries
/// are never replaced, so `Utf8` indices are valid in both.
pub struct ClassContext<'a> {
    pub(crate) remapper: &'a Remapper<'a>,
    pub(crate) ledger: Option<&'a VariableLedger>,
    pub(crate) original: ConstantPool,
    pub(crate) pool: ConstantPoolBuilder,
    pub(crate) name: String,
    pub(crate) fields: Vec<MemberInfo>,
    pub(crate) methods: Vec<MemberInfo>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) lambda_names: HashMap<u16, String>,
    pub(crate) record_components: Option<Vec<(String, String)>>,
    pub(crate) parameter_names: HashMap<u16, String>,
    pub(crate) outer_instance: Option<String>,
    header: ClassFile,
    state: VisitState,
}

impl<'a> ClassContext<'a> {
    /// Wraps a parsed class.
    ///
    /// With a ledger, local variables without a mapped name are regenerated.
    pub fn new(
        mut class: ClassFile,
        remapper: &'a Remapper<'a>,
        ledger: Option<&'a VariableLedger>,
    ) -> Result<Self, RewriteError> {
        let name = class.name()?.to_string();
        let original = class.constant_pool.clone();
        let pool = ConstantPoolBuilder::from_pool(std::mem::take(&mut class.constant_pool));
        let fields = std::mem::take(&mut class.fields);
        let methods = std::mem::take(&mut class.methods);
        let attributes = std::mem::take(&mut class.attributes);
        Ok(ClassContext {
            remapper,
            ledger,
            original,
            pool,
            name,
            fields,
            methods,
            attributes,
            lambda_names: HashMap::new(),
            record_components: None,
            parameter_names: HashMap::new(),
            outer_instance: None,
            header: class,
            state: VisitState::Unvisited,
        })
    }

    /// Advances the state machine for `event`.
    pub fn enter(&mut self, event: Event) -> Result<(), RewriteError> {
        let next = match (self.state, event) {
            (VisitState::Unvisited, Event::Header) => VisitState::HeaderSeen,
            (VisitState::HeaderSeen | VisitState::Members, Event::Field | Event::Method) => VisitState::Members,
            (VisitState::HeaderSeen | VisitState::Members, Event::End) => VisitState::Closed,
            (state, event) => return Err(RewriteError::OutOfOrder { event, state }),
        };
        if event == Event::Method {
            self.parameter_names.clear();
        }
        self.state = next;
        Ok(())
    }

    /// The current state.
    pub fn state(&self) -> VisitState {
        self.state
    }

    /// Internal name of the class, as read.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class access flags.
    pub fn access_flags(&self) -> u16 {
        self.header.access_flags
    }

    /// The engine used for every lookup.
    pub fn remapper(&self) -> &'a Remapper<'a> {
        self.remapper
    }

    /// The ledger, present in regeneration mode.
    pub fn ledger(&self) -> Option<&'a VariableLedger> {
        self.ledger
    }

    /// The constant pool as read.
    pub fn original_pool(&self) -> &ConstantPool {
        &self.original
    }

    /// The constant pool being built.
    pub fn pool(&self) -> &ConstantPool {
        self.pool.pool()
    }

    /// Field headers.
    pub fn fields(&self) -> &[MemberInfo] {
        &self.fields
    }

    /// Method headers.
    pub fn methods(&self) -> &[MemberInfo] {
        &self.methods
    }

    /// The first class attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_attribute(&self.original, &self.attributes, name)
    }

    /// Name and descriptor of a method as read.
    pub fn method(&self, index: usize) -> Result<(&str, &str), RewriteError> {
        let method = self.methods.get(index).ok_or(RewriteError::NoSuchMember(index))?;
        Ok((self.original.utf8(method.name_index)?, self.original.utf8(method.descriptor_index)?))
    }

    /// Output entry name and bytes of the rewritten class.
    pub fn finish(self) -> Result<(String, Vec<u8>), RewriteError> {
        if self.state != VisitState::Closed {
            return Err(RewriteError::OutOfOrder {
                event: Event::End,
                state: self.state,
            });
        }
        let entry_name = format!("{}.class", self.remapper.map_class_name(&self.name));
        let class = ClassFile {
            constant_pool: self.pool.into_pool(),
            fields: self.fields,
            methods: self.methods,
            attributes: self.attributes,
            ..self.header
        };
        Ok((entry_name, class.to_bytes()?))
    }
}

/// Position of the first attribute called `name`.
pub(crate) fn attribute_position(pool: &ConstantPool, attributes: &[Attribute], name: &str) -> Option<usize> {
    attributes
        .iter()
        .position(|attribute| pool.utf8(attribute.name_index).is_ok_and(|n| n == name))
}
