//! The binary rewriting pipeline.
//!
//! A [`Pipeline`] runs an ordered list of [`Stage`]s over each class. The
//! stages share one [`ClassContext`] per class and receive the header,
//! every field, every method and finally the end of the class, in that
//! order. The standard pipeline fixes synthetic parameter annotations,
//! relinks lambda names, propagates record component names, renames local
//! variables and finally substitutes every symbol.
//!
//! # Examples
//!
//! ```
//! use jvm_remap::classfile::{ClassFile, ConstantPoolBuilder, ACC_PUBLIC};
//! use jvm_remap::format::MappingFormat;
//! use jvm_remap::hierarchy::HierarchyGraph;
//! use jvm_remap::remapper::Remapper;
//! use jvm_remap::rewrite::Pipeline;
//!
//! let mapping = MappingFormat::Csrg.parse("a com/example/Foo\n").unwrap();
//! let hierarchy = HierarchyGraph::default();
//! let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
//!
//! let mut pool = ConstantPoolBuilder::new();
//! let this_class = pool.class("a").unwrap();
//! let super_class = pool.class("java/lang/Object").unwrap();
//! let class = ClassFile {
//!     minor_version: 0,
//!     major_version: 52,
//!     constant_pool: pool.into_pool(),
//!     access_flags: ACC_PUBLIC,
//!     this_class,
//!     super_class,
//!     interfaces: vec![],
//!     fields: vec![],
//!     methods: vec![],
//!     attributes: vec![],
//! };
//!
//! let (name, bytes) = Pipeline::new()
//!     .rewrite(&class.to_bytes().unwrap(), &remapper, None)
//!     .unwrap();
//! assert_eq!(name, "com/example/Foo.class");
//! assert_eq!(ClassFile::parse(&bytes).unwrap().name().unwrap(), "com/example/Foo");
//! ```

use thiserror::Error;

use crate::classfile::{ClassFile, ClassFileError};
use crate::remapper::Remapper;

mod context;
mod lambda;
mod ledger;
mod locals;
mod parameters;
mod record;
mod substitution;

pub use context::{ClassContext, Event, VisitState};
pub use lambda::BootstrapNameFixer;
pub use ledger::{VariableKey, VariableLedger};
pub use locals::LocalVariableRenamer;
pub use parameters::ParameterAnnotationFixer;
pub use record::RecordComponents;
pub use substitution::SymbolRemapper;

/// Errors raised while rewriting a class.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// The class file is malformed.
    #[error(transparent)]
    ClassFile(#[from] ClassFileError),
    /// An event arrived in a state that does not accept it.
    #[error("{event} event in state {state:?}")]
    OutOfOrder {
        /// The event.
        event: Event,
        /// The state at the time.
        state: VisitState,
    },
    /// A member index outside of the class.
    #[error("no member at index {0}")]
    NoSuchMember(usize),
}

/// A step of the pipeline.
///
/// Stages keep no state of their own; everything per class lives in the
/// [`ClassContext`].
pub trait Stage: Send + Sync {
    /// Called once with the class header.
    fn visit_header(&self, cx: &mut ClassContext<'_>) -> Result<(), RewriteError> {
        let _ = cx;
        Ok(())
    }

    /// Called for every field, with its index.
    fn visit_field(&self, cx: &mut ClassContext<'_>, index: usize) -> Result<(), RewriteError> {
        let _ = (cx, index);
        Ok(())
    }

    /// Called for every method, with its index.
    fn visit_method(&self, cx: &mut ClassContext<'_>, index: usize) -> Result<(), RewriteError> {
        let _ = (cx, index);
        Ok(())
    }

    /// Called once after all members.
    fn visit_end(&self, cx: &mut ClassContext<'_>) -> Result<(), RewriteError> {
        let _ = cx;
        Ok(())
    }
}

/// An ordered list of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// The standard pipeline.
    pub fn new() -> Self {
        Self::with_stages(vec![
            Box::new(ParameterAnnotationFixer),
            Box::new(BootstrapNameFixer),
            Box::new(RecordComponents),
            Box::new(LocalVariableRenamer),
            Box::new(SymbolRemapper),
        ])
    }

    /// A pipeline running `stages` in order.
    pub fn with_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Pipeline { stages }
    }

    /// Rewrites one class file, returning its output entry name and bytes.
    ///
    /// With a ledger, local variables without a mapped name are
    /// regenerated and recorded.
    pub fn rewrite(
        &self,
        bytes: &[u8],
        remapper: &Remapper<'_>,
        ledger: Option<&VariableLedger>,
    ) -> Result<(String, Vec<u8>), RewriteError> {
        let class = ClassFile::parse(bytes)?;
        let mut cx = ClassContext::new(class, remapper, ledger)?;
        self.run(&mut cx)?;
        cx.finish()
    }

    /// Dispatches all events of the class to the stages.
    pub fn run(&self, cx: &mut ClassContext<'_>) -> Result<(), RewriteError> {
        cx.enter(Event::Header)?;
        for stage in &self.stages {
            stage.visit_header(cx)?;
        }
        for index in 0..cx.fields.len() {
            cx.enter(Event::Field)?;
            for stage in &self.stages {
                stage.visit_field(cx, index)?;
            }
        }
        for index in 0..cx.methods.len() {
            cx.enter(Event::Method)?;
            for stage in &self.stages {
                stage.visit_method(cx, index)?;
            }
        }
        cx.enter(Event::End)?;
        for stage in &self.stages {
            stage.visit_end(cx)?;
        }
        log::trace!("rewrote class {}", cx.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{ConstantPoolBuilder, ACC_PUBLIC};
    use crate::hierarchy::HierarchyGraph;
    use crate::mapping::ClassifiedMapping;

    fn empty_class() -> ClassFile {
        let mut pool = ConstantPoolBuilder::new();
        let this_class = pool.class("a/B").unwrap();
        ClassFile {
            minor_version: 0,
            major_version: 52,
            constant_pool: pool.into_pool(),
            access_flags: ACC_PUBLIC,
            this_class,
            super_class: 0,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            attributes: vec![],
        }
    }

    #[test]
    fn test_events_out_of_order() {
        let mapping = ClassifiedMapping::new();
        let hierarchy = HierarchyGraph::default();
        let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
        let mut cx = ClassContext::new(empty_class(), &remapper, None).unwrap();

        assert_eq!(
            cx.enter(Event::Field),
            Err(RewriteError::OutOfOrder {
                event: Event::Field,
                state: VisitState::Unvisited,
            })
        );
        cx.enter(Event::Header).unwrap();
        assert!(cx.enter(Event::Header).is_err());
        cx.enter(Event::Method).unwrap();
        assert_eq!(cx.state(), VisitState::Members);
        cx.enter(Event::End).unwrap();
        assert!(cx.enter(Event::Method).is_err());
        assert_eq!(cx.state(), VisitState::Closed);
    }

    #[test]
    fn test_finish_requires_closed() {
        let mapping = ClassifiedMapping::new();
        let hierarchy = HierarchyGraph::default();
        let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
        let cx = ClassContext::new(empty_class(), &remapper, None).unwrap();
        assert!(cx.finish().is_err());
    }

    #[test]
    fn test_unchanged_class_keeps_bytes() {
        let mapping = ClassifiedMapping::new();
        let hierarchy = HierarchyGraph::default();
        let remapper = Remapper::new(&mapping, &hierarchy).unwrap();
        let bytes = empty_class().to_bytes().unwrap();
        let (name, output) = Pipeline::new().rewrite(&bytes, &remapper, None).unwrap();
        assert_eq!(name, "a/B.class");
        assert_eq!(output, bytes);
    }
}
