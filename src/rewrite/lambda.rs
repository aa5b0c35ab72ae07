use crate::classfile::attributes::BootstrapMethod;
use crate::classfile::{ClassFileError, Constant, ConstantPool};
use crate::descriptor::{object_internal_name, return_type};

use super::{ClassContext, RewriteError, Stage};

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";

/// Renames lambda call sites after the interface method they implement.
///
/// The name of an `invokedynamic` bootstrapped by the lambda metafactory
/// must match the functional interface method, which the mapping renames on
/// the interface, not on the call site.
#[derive(Clone, Copy, Debug, Default)]
pub struct BootstrapNameFixer;

fn is_lambda_metafactory(pool: &ConstantPool, bootstrap: &BootstrapMethod) -> Result<bool, RewriteError> {
    match pool.get(bootstrap.method_ref)? {
        Constant::MethodHandle { reference_index, .. } => {
            let (owner, _, _) = pool.member_ref(*reference_index)?;
            Ok(owner == LAMBDA_METAFACTORY)
        }
        _ => Ok(false),
    }
}

fn implemented_method_descriptor<'p>(
    pool: &'p ConstantPool,
    bootstrap: &BootstrapMethod,
) -> Result<Option<&'p str>, RewriteError> {
    let argument = match bootstrap.arguments.first() {
        Some(argument) => *argument,
        None => return Ok(None),
    };
    match pool.get(argument)? {
        Constant::MethodType { descriptor_index } => Ok(Some(pool.utf8(*descriptor_index)?)),
        _ => Ok(None),
    }
}

impl Stage for BootstrapNameFixer {
    fn visit_header(&self, cx: &mut ClassContext<'_>) -> Result<(), RewriteError> {
        let bootstrap_methods = match cx.attribute("BootstrapMethods") {
            Some(attribute) => BootstrapMethod::parse_table(&attribute.data)?,
            None => return Ok(()),
        };
        let pool = &cx.original;
        for (index, constant) in pool.iter() {
            let (bootstrap_index, name_and_type_index) = match constant {
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => (*bootstrap_method_attr_index, *name_and_type_index),
                _ => continue,
            };
            let bootstrap = bootstrap_methods
                .get(bootstrap_index as usize)
                .ok_or(ClassFileError::InvalidAttribute {
                    name: "BootstrapMethods",
                    reason: "missing bootstrap method",
                })?;
            if !is_lambda_metafactory(pool, bootstrap)? {
                continue;
            }
            let (name, descriptor) = pool.name_and_type(name_and_type_index)?;
            let interface = match return_type(descriptor).and_then(object_internal_name) {
                Some(interface) => interface,
                None => continue,
            };
            let implemented = match implemented_method_descriptor(pool, bootstrap)? {
                Some(implemented) => implemented,
                None => continue,
            };
            let mapped = cx.remapper.map_method_name(interface, name, implemented);
            if mapped != name {
                log::trace!("lambda call site {} of {} renamed to {}", name, interface, mapped);
                cx.lambda_names.insert(index, mapped);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{ClassFile, ConstantPoolBuilder, ACC_PUBLIC};
    use crate::format::MappingFormat;
    use crate::hierarchy::HierarchyGraph;
    use crate::remapper::Remapper;
    use crate::rewrite::{ClassContext, Event};

    fn lambda_class(metafactory: &str) -> (ClassFile, u16) {
        let mut pool = ConstantPoolBuilder::new();
        let this_class = pool.class("a/User").unwrap();
        let factory = pool
            .method_ref(
                metafactory,
                "metafactory",
                "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;",
            )
            .unwrap();
        let handle = pool.method_handle(6, factory).unwrap();
        let sam = pool.method_type("(Ljava/lang/Object;)V").unwrap();
        let call_site = pool.invoke_dynamic(0, "b", "()La/Callback;").unwrap();
        let attribute = pool.utf8("BootstrapMethods").unwrap();
        let data = BootstrapMethod::write_table(&[BootstrapMethod {
            method_ref: handle,
            arguments: vec![sam],
        }])
        .unwrap();

        let class = ClassFile {
            minor_version: 0,
            major_version: 52,
            constant_pool: pool.into_pool(),
            access_flags: ACC_PUBLIC,
            this_class,
            super_class: 0,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            attributes: vec![crate::classfile::Attribute {
                name_index: attribute,
                data,
            }],
        };
        (class, call_site)
    }

    #[test]
    fn test_lambda_name_follows_interface() {
        let mapping = MappingFormat::Csrg
            .parse("a/Callback com/example/Callback\na/Callback b (Ljava/lang/Object;)V accept\n")
            .unwrap();
        let hierarchy = HierarchyGraph::default();
        let remapper = Remapper::new(&mapping, &hierarchy).unwrap();

        let (class, call_site) = lambda_class(LAMBDA_METAFACTORY);
        let mut cx = ClassContext::new(class, &remapper, None).unwrap();
        cx.enter(Event::Header).unwrap();
        BootstrapNameFixer.visit_header(&mut cx).unwrap();
        assert_eq!(cx.lambda_names.get(&call_site).map(String::as_str), Some("accept"));

        let (class, _) = lambda_class("a/OtherFactory");
        let mut cx = ClassContext::new(class, &remapper, None).unwrap();
        cx.enter(Event::Header).unwrap();
        BootstrapNameFixer.visit_header(&mut cx).unwrap();
        assert!(cx.lambda_names.is_empty());
    }
}
