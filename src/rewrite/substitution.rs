//! Rewrites every symbol reference of a class through the remapper.

use std::collections::HashMap;

use crate::classfile::attributes::{
    parse_index, Annotation, Code, ElementValue, EnclosingMethod, InnerClass, LocalVariable, RecordComponent,
    TypeAnnotation,
};
use crate::classfile::{Attribute, Constant, ConstantPool, ConstantPoolBuilder};
use crate::descriptor::object_internal_name;
use crate::remapper::{Remapper, SignatureKind};

use super::{ClassContext, RewriteError, Stage};

/// Substitutes class, member, descriptor and signature names.
///
/// Existing constant pool entries keep their index. `Class` entries are
/// repointed at new names, member references get a new `NameAndType`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymbolRemapper;

struct Substitution<'c, 'a> {
    remapper: &'a Remapper<'a>,
    original: &'c ConstantPool,
    pool: &'c mut ConstantPoolBuilder,
}

impl Substitution<'_, '_> {
    /// Maps the string of a `Utf8` entry, appending an entry only on change.
    fn utf8<F>(&mut self, index: u16, map: F) -> Result<u16, RewriteError>
    where
        F: FnOnce(&Remapper<'_>, &str) -> String,
    {
        let value = self.pool.pool().utf8(index)?;
        let mapped = map(self.remapper, value);
        if mapped == value {
            return Ok(index);
        }
        Ok(self.pool.utf8(&mapped)?)
    }

    fn descriptor(&mut self, index: u16) -> Result<u16, RewriteError> {
        self.utf8(index, |remapper, descriptor| remapper.map_descriptor(descriptor))
    }

    fn signature(&mut self, index: u16, kind: SignatureKind) -> Result<u16, RewriteError> {
        self.utf8(index, |remapper, signature| remapper.map_signature(signature, kind))
    }

    fn annotation(&mut self, annotation: &mut Annotation) -> Result<(), RewriteError> {
        let type_descriptor = self.pool.pool().utf8(annotation.type_index)?.to_string();
        for (name_index, value) in &mut annotation.elements {
            *name_index = self.utf8(*name_index, |remapper, name| {
                remapper.map_annotation_attribute_name(&type_descriptor, name)
            })?;
            self.element_value(value)?;
        }
        annotation.type_index = self.descriptor(annotation.type_index)?;
        Ok(())
    }

    fn element_value(&mut self, value: &mut ElementValue) -> Result<(), RewriteError> {
        match value {
            ElementValue::Const { .. } => {}
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                let type_descriptor = self.pool.pool().utf8(*type_name_index)?.to_string();
                if let Some(owner) = object_internal_name(&type_descriptor) {
                    *const_name_index =
                        self.utf8(*const_name_index, |remapper, name| remapper.map_field_name(owner, name))?;
                }
                *type_name_index = self.descriptor(*type_name_index)?;
            }
            ElementValue::Class(index) => *index = self.descriptor(*index)?,
            ElementValue::Annotation(annotation) => self.annotation(annotation)?,
            ElementValue::Array(values) => {
                for value in values {
                    self.element_value(value)?;
                }
            }
        }
        Ok(())
    }

    fn annotations(&mut self, annotations: &mut [Annotation]) -> Result<(), RewriteError> {
        for annotation in annotations {
            self.annotation(annotation)?;
        }
        Ok(())
    }

    fn type_annotations(&mut self, annotations: &mut [TypeAnnotation]) -> Result<(), RewriteError> {
        for annotation in annotations {
            self.annotation(&mut annotation.annotation)?;
        }
        Ok(())
    }

    /// Rewrites the attributes shared by classes, members and record
    /// components. Unknown attributes are kept as they are.
    fn attribute(&mut self, attribute: &mut Attribute, kind: SignatureKind) -> Result<(), RewriteError> {
        let original = self.original;
        let data = &attribute.data;
        let rewritten = match original.utf8(attribute.name_index)? {
            "Signature" => {
                let index = self.signature(parse_index(data, "Signature")?, kind)?;
                index.to_be_bytes().to_vec()
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                let mut annotations = Annotation::parse_table(data)?;
                self.annotations(&mut annotations)?;
                Annotation::write_table(&annotations)?
            }
            "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                let mut parameters = Annotation::parse_parameters(data)?;
                for annotations in &mut parameters {
                    self.annotations(annotations)?;
                }
                Annotation::write_parameters(&parameters)?
            }
            "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
                let mut annotations = TypeAnnotation::parse_table(data)?;
                self.type_annotations(&mut annotations)?;
                TypeAnnotation::write_table(&annotations)?
            }
            "AnnotationDefault" => {
                let mut value = ElementValue::parse_default(data)?;
                self.element_value(&mut value)?;
                value.write_default()?
            }
            "Code" => {
                let mut code = Code::parse(data)?;
                for nested in &mut code.attributes {
                    self.code_attribute(nested)?;
                }
                code.to_bytes()?
            }
            _ => return Ok(()),
        };
        attribute.data = rewritten;
        Ok(())
    }

    fn code_attribute(&mut self, attribute: &mut Attribute) -> Result<(), RewriteError> {
        let original = self.original;
        let data = &attribute.data;
        let rewritten = match original.utf8(attribute.name_index)? {
            "LocalVariableTable" => {
                let mut table = LocalVariable::parse_table(data)?;
                for variable in &mut table {
                    variable.descriptor_index = self.descriptor(variable.descriptor_index)?;
                }
                LocalVariable::write_table(&table)?
            }
            "LocalVariableTypeTable" => {
                let mut table = LocalVariable::parse_table(data)?;
                for variable in &mut table {
                    variable.descriptor_index = self.signature(variable.descriptor_index, SignatureKind::Field)?;
                }
                LocalVariable::write_table(&table)?
            }
            "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
                let mut annotations = TypeAnnotation::parse_table(data)?;
                self.type_annotations(&mut annotations)?;
                TypeAnnotation::write_table(&annotations)?
            }
            _ => return Ok(()),
        };
        attribute.data = rewritten;
        Ok(())
    }

    fn inner_classes(&mut self, attribute: &mut Attribute) -> Result<(), RewriteError> {
        let original = self.original;
        let mut table = InnerClass::parse_table(&attribute.data)?;
        for entry in &mut table {
            if entry.inner_name_index == 0 {
                continue;
            }
            let inner = original.class_name(entry.inner_class_info_index)?;
            entry.inner_name_index = self.utf8(entry.inner_name_index, |remapper, simple| {
                remapper.map_inner_class_name(inner, simple)
            })?;
        }
        attribute.data = InnerClass::write_table(&table)?;
        Ok(())
    }

    fn enclosing_method(&mut self, attribute: &mut Attribute) -> Result<(), RewriteError> {
        let mut enclosing = EnclosingMethod::parse(&attribute.data)?;
        if enclosing.method_index == 0 {
            return Ok(());
        }
        let original = self.original;
        let owner = original.class_name(enclosing.class_index)?;
        let (name, descriptor) = original.name_and_type(enclosing.method_index)?;
        let mapped_name = self.remapper.map_method_name(owner, name, descriptor);
        let mapped_descriptor = self.remapper.map_method_descriptor(descriptor);
        if mapped_name != name || mapped_descriptor != descriptor {
            enclosing.method_index = self.pool.name_and_type(&mapped_name, &mapped_descriptor)?;
            attribute.data = enclosing.to_bytes();
        }
        Ok(())
    }

    fn record(&mut self, class: &str, attribute: &mut Attribute) -> Result<(), RewriteError> {
        let mut components = RecordComponent::parse_table(&attribute.data)?;
        for component in &mut components {
            component.name_index =
                self.utf8(component.name_index, |remapper, name| remapper.map_field_name(class, name))?;
            component.descriptor_index = self.descriptor(component.descriptor_index)?;
            for nested in &mut component.attributes {
                self.attribute(nested, SignatureKind::Field)?;
            }
        }
        attribute.data = RecordComponent::write_table(&components)?;
        Ok(())
    }

    /// The `NameAndType` for a reference, new if anything changed.
    fn name_and_type(
        &mut self,
        index: u16,
        name: &str,
        descriptor: &str,
        mapped_name: &str,
        mapped_descriptor: &str,
    ) -> Result<u16, RewriteError> {
        if mapped_name == name && mapped_descriptor == descriptor {
            return Ok(index);
        }
        Ok(self.pool.name_and_type(mapped_name, mapped_descriptor)?)
    }

    /// Repoints the entries of the original pool.
    fn constants(&mut self, lambda_names: &HashMap<u16, String>) -> Result<(), RewriteError> {
        let original = self.original;
        for (index, constant) in original.iter() {
            let replacement = match *constant {
                Constant::Class { name_index } => {
                    let mapped = self.utf8(name_index, |remapper, name| remapper.map_class_name(name))?;
                    (mapped != name_index).then_some(Constant::Class { name_index: mapped })
                }
                Constant::Fieldref {
                    class_index,
                    name_and_type_index,
                } => {
                    let (owner, name, descriptor) = original.member_ref(index)?;
                    let mapped_name = self.remapper.map_field_name(owner, name);
                    let mapped_descriptor = self.remapper.map_descriptor(descriptor);
                    let nat = self.name_and_type(name_and_type_index, name, descriptor, &mapped_name, &mapped_descriptor)?;
                    (nat != name_and_type_index).then_some(Constant::Fieldref {
                        class_index,
                        name_and_type_index: nat,
                    })
                }
                Constant::Methodref {
                    class_index,
                    name_and_type_index,
                }
                | Constant::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    let (owner, name, descriptor) = original.member_ref(index)?;
                    let mapped_name = self.remapper.map_method_name(owner, name, descriptor);
                    let mapped_descriptor = self.remapper.map_method_descriptor(descriptor);
                    let nat = self.name_and_type(name_and_type_index, name, descriptor, &mapped_name, &mapped_descriptor)?;
                    (nat != name_and_type_index).then(|| match constant {
                        Constant::Methodref { .. } => Constant::Methodref {
                            class_index,
                            name_and_type_index: nat,
                        },
                        _ => Constant::InterfaceMethodref {
                            class_index,
                            name_and_type_index: nat,
                        },
                    })
                }
                Constant::MethodType { descriptor_index } => {
                    let mapped = self.descriptor(descriptor_index)?;
                    (mapped != descriptor_index).then_some(Constant::MethodType {
                        descriptor_index: mapped,
                    })
                }
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    let (name, descriptor) = original.name_and_type(name_and_type_index)?;
                    let mapped_name = lambda_names.get(&index).map_or(name, String::as_str);
                    let mapped_descriptor = self.remapper.map_method_descriptor(descriptor);
                    let nat = self.name_and_type(name_and_type_index, name, descriptor, mapped_name, &mapped_descriptor)?;
                    (nat != name_and_type_index).then_some(Constant::InvokeDynamic {
                        bootstrap_method_attr_index,
                        name_and_type_index: nat,
                    })
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    let (name, descriptor) = original.name_and_type(name_and_type_index)?;
                    let mapped_descriptor = self.remapper.map_descriptor(descriptor);
                    let nat = self.name_and_type(name_and_type_index, name, descriptor, name, &mapped_descriptor)?;
                    (nat != name_and_type_index).then_some(Constant::Dynamic {
                        bootstrap_method_attr_index,
                        name_and_type_index: nat,
                    })
                }
                _ => None,
            };
            if let Some(replacement) = replacement {
                self.pool.replace(index, replacement)?;
            }
        }
        Ok(())
    }
}

impl Stage for SymbolRemapper {
    fn visit_field(&self, cx: &mut ClassContext<'_>, index: usize) -> Result<(), RewriteError> {
        let mut sub = Substitution {
            remapper: cx.remapper,
            original: &cx.original,
            pool: &mut cx.pool,
        };
        let field = cx.fields.get_mut(index).ok_or(RewriteError::NoSuchMember(index))?;
        let class = cx.name.as_str();
        field.name_index = sub.utf8(field.name_index, |remapper, name| remapper.map_field_name(class, name))?;
        field.descriptor_index = sub.descriptor(field.descriptor_index)?;
        for attribute in &mut field.attributes {
            sub.attribute(attribute, SignatureKind::Field)?;
        }
        Ok(())
    }

    fn visit_method(&self, cx: &mut ClassContext<'_>, index: usize) -> Result<(), RewriteError> {
        let mut sub = Substitution {
            remapper: cx.remapper,
            original: &cx.original,
            pool: &mut cx.pool,
        };
        let method = cx.methods.get_mut(index).ok_or(RewriteError::NoSuchMember(index))?;
        let class = cx.name.as_str();
        let descriptor = cx.original.utf8(method.descriptor_index)?;
        method.name_index = sub.utf8(method.name_index, |remapper, name| {
            remapper.map_method_name(class, name, descriptor)
        })?;
        method.descriptor_index = sub.utf8(method.descriptor_index, |remapper, descriptor| {
            remapper.map_method_descriptor(descriptor)
        })?;
        for attribute in &mut method.attributes {
            sub.attribute(attribute, SignatureKind::Method)?;
        }
        Ok(())
    }

    fn visit_end(&self, cx: &mut ClassContext<'_>) -> Result<(), RewriteError> {
        let mut sub = Substitution {
            remapper: cx.remapper,
            original: &cx.original,
            pool: &mut cx.pool,
        };
        let class = cx.name.as_str();
        for attribute in &mut cx.attributes {
            match cx.original.utf8(attribute.name_index)? {
                "InnerClasses" => sub.inner_classes(attribute)?,
                "EnclosingMethod" => sub.enclosing_method(attribute)?,
                "Record" => sub.record(class, attribute)?,
                _ => sub.attribute(attribute, SignatureKind::Class)?,
            }
        }
        sub.constants(&cx.lambda_names)?;
        log::debug!("remapped class {} to {}", class, cx.remapper.map_class_name(class));
        Ok(())
    }
}
