use crate::classfile::attributes::{Annotation, InnerClass};
use crate::classfile::{ACC_ENUM, ACC_INTERFACE, ACC_STATIC};
use crate::descriptor::parse_method_descriptor;
use crate::utils::class_name_to_descriptor;

use super::context::attribute_position;
use super::{ClassContext, RewriteError, Stage};

const PARAMETER_ANNOTATIONS: [&str; 2] = [
    "RuntimeVisibleParameterAnnotations",
    "RuntimeInvisibleParameterAnnotations",
];

/// Drops the parameter annotation slots some compilers emit for synthetic
/// constructor parameters.
///
/// Enum constructors carry the constant name and ordinal, constructors of
/// non-static inner classes carry the outer instance. When the annotation
/// table counts those parameters, its leading entries are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParameterAnnotationFixer;

fn outer_instance(cx: &ClassContext<'_>) -> Result<Option<String>, RewriteError> {
    let attribute = match cx.attribute("InnerClasses") {
        Some(attribute) => attribute,
        None => return Ok(None),
    };
    let pool = cx.original_pool();
    for entry in InnerClass::parse_table(&attribute.data)? {
        if pool.class_name(entry.inner_class_info_index)? != cx.name() {
            continue;
        }
        if entry.inner_class_access_flags & (ACC_STATIC | ACC_INTERFACE) != 0 || entry.inner_name_index == 0 {
            return Ok(None);
        }
        let outer = match entry.outer_class_info_index {
            0 => match cx.name().rsplit_once('$') {
                Some((outer, _)) => outer.to_string(),
                None => return Ok(None),
            },
            index => pool.class_name(index)?.to_string(),
        };
        return Ok(Some(outer));
    }
    Ok(None)
}

impl ParameterAnnotationFixer {
    fn synthetic_parameters(cx: &ClassContext<'_>, descriptor: &str) -> usize {
        if cx.access_flags() & ACC_ENUM != 0 && descriptor.starts_with("(Ljava/lang/String;I") {
            return 2;
        }
        let parameters = descriptor.strip_prefix('(').unwrap_or(descriptor);
        match &cx.outer_instance {
            Some(outer) if parameters.starts_with(&class_name_to_descriptor(outer)) => 1,
            _ => 0,
        }
    }
}

impl Stage for ParameterAnnotationFixer {
    fn visit_header(&self, cx: &mut ClassContext<'_>) -> Result<(), RewriteError> {
        cx.outer_instance = outer_instance(cx)?;
        Ok(())
    }

    fn visit_method(&self, cx: &mut ClassContext<'_>, index: usize) -> Result<(), RewriteError> {
        let (name, descriptor) = cx.method(index)?;
        if name != "<init>" {
            return Ok(());
        }
        let remove = Self::synthetic_parameters(cx, descriptor);
        if remove == 0 {
            return Ok(());
        }
        let parameters = match parse_method_descriptor(descriptor) {
            Some((parameters, _)) => parameters.len(),
            None => return Ok(()),
        };

        for attribute_name in PARAMETER_ANNOTATIONS {
            let position = match attribute_position(&cx.original, &cx.methods[index].attributes, attribute_name) {
                Some(position) => position,
                None => continue,
            };
            let attribute = &mut cx.methods[index].attributes[position];
            let mut slots = Annotation::parse_parameters(&attribute.data)?;
            if slots.len() != parameters || slots.len() < remove {
                continue;
            }
            slots.drain(..remove);
            attribute.data = Annotation::write_parameters(&slots)?;
            log::trace!("dropped {} synthetic parameter annotation slots in {}.<init>", remove, cx.name);
        }
        Ok(())
    }
}
