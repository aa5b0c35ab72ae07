use crate::classfile::attributes::RecordComponent;
use crate::descriptor::parameter_slots;

use super::{ClassContext, RewriteError, Stage};

/// Names the canonical constructor parameters of records after their
/// components.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordComponents;

impl Stage for RecordComponents {
    fn visit_header(&self, cx: &mut ClassContext<'_>) -> Result<(), RewriteError> {
        let components = match cx.attribute("Record") {
            Some(attribute) => RecordComponent::parse_table(&attribute.data)?,
            None => return Ok(()),
        };
        let mut names = Vec::with_capacity(components.len());
        for component in components {
            let name = cx.original.utf8(component.name_index)?;
            let descriptor = cx.original.utf8(component.descriptor_index)?;
            names.push((cx.remapper.map_field_name(&cx.name, name), descriptor.to_string()));
        }
        cx.record_components = Some(names);
        Ok(())
    }

    fn visit_method(&self, cx: &mut ClassContext<'_>, index: usize) -> Result<(), RewriteError> {
        let components = match &cx.record_components {
            Some(components) => components,
            None => return Ok(()),
        };
        let (name, descriptor) = cx.method(index)?;
        if name != "<init>" {
            return Ok(());
        }
        let mut canonical = String::from("(");
        for (_, component) in components {
            canonical.push_str(component);
        }
        canonical.push_str(")V");
        if descriptor != canonical {
            return Ok(());
        }

        let slots = parameter_slots(descriptor, false).unwrap_or_default();
        let names: Vec<(u16, String)> = slots
            .into_iter()
            .zip(components.iter().map(|(name, _)| name.clone()))
            .collect();
        cx.parameter_names.extend(names);
        Ok(())
    }
}
