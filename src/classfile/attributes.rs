//! Typed views of the attributes that reference symbols.
//!
//! Each type decodes from and encodes back to an [`Attribute`] body. The
//! constant pool indices are kept as they are.

use super::{
    parse_attributes, write_attributes, write_count, write_u2, write_u4, Attribute, ClassFileError, Reader,
};

fn malformed(name: &'static str, reason: &'static str) -> ClassFileError {
    ClassFileError::InvalidAttribute { name, reason }
}

fn finish(reader: &Reader<'_>, name: &'static str) -> Result<(), ClassFileError> {
    if reader.remaining() != 0 {
        return Err(malformed(name, "trailing bytes"));
    }
    Ok(())
}

/// A `Code` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Code {
    /// Operand stack size.
    pub max_stack: u16,
    /// Local variable slots.
    pub max_locals: u16,
    /// The bytecode.
    pub code: Vec<u8>,
    /// Exception handlers as `[start_pc, end_pc, handler_pc, catch_type]`.
    pub exception_table: Vec<[u16; 4]>,
    /// Nested attributes such as `LocalVariableTable`.
    pub attributes: Vec<Attribute>,
}

impl Code {
    /// Decodes a `Code` body.
    pub fn parse(data: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = Reader::new(data);
        let max_stack = reader.u2()?;
        let max_locals = reader.u2()?;
        let len = reader.u4()? as usize;
        let code = reader.bytes(len)?.to_vec();
        let count = reader.u2()?;
        let mut exception_table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            exception_table.push([reader.u2()?, reader.u2()?, reader.u2()?, reader.u2()?]);
        }
        let attributes = parse_attributes(&mut reader)?;
        finish(&reader, "Code")?;
        Ok(Code {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    /// Encodes the body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::with_capacity(self.code.len() + 32);
        write_u2(&mut out, self.max_stack);
        write_u2(&mut out, self.max_locals);
        let len = u32::try_from(self.code.len()).map_err(|_| malformed("Code", "bytecode too large"))?;
        write_u4(&mut out, len);
        out.extend_from_slice(&self.code);
        write_count(&mut out, self.exception_table.len(), "Code")?;
        for entry in &self.exception_table {
            for value in entry {
                write_u2(&mut out, *value);
            }
        }
        write_attributes(&mut out, &self.attributes)?;
        Ok(out)
    }
}

/// An entry of a `LocalVariableTable` or `LocalVariableTypeTable`.
///
/// In the type table `descriptor_index` points at a generic signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalVariable {
    /// First instruction of the live range.
    pub start_pc: u16,
    /// Length of the live range.
    pub length: u16,
    /// `Utf8` entry of the name.
    pub name_index: u16,
    /// `Utf8` entry of the descriptor or signature.
    pub descriptor_index: u16,
    /// The local variable slot.
    pub index: u16,
}

impl LocalVariable {
    /// Decodes a `LocalVariableTable` or `LocalVariableTypeTable` body.
    pub fn parse_table(data: &[u8]) -> Result<Vec<Self>, ClassFileError> {
        let mut reader = Reader::new(data);
        let count = reader.u2()?;
        let mut table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            table.push(LocalVariable {
                start_pc: reader.u2()?,
                length: reader.u2()?,
                name_index: reader.u2()?,
                descriptor_index: reader.u2()?,
                index: reader.u2()?,
            });
        }
        finish(&reader, "LocalVariableTable")?;
        Ok(table)
    }

    /// Encodes a table body.
    pub fn write_table(table: &[Self]) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::with_capacity(2 + table.len() * 10);
        write_count(&mut out, table.len(), "LocalVariableTable")?;
        for entry in table {
            for value in [
                entry.start_pc,
                entry.length,
                entry.name_index,
                entry.descriptor_index,
                entry.index,
            ] {
                write_u2(&mut out, value);
            }
        }
        Ok(out)
    }
}

/// An entry of the `InnerClasses` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InnerClass {
    /// `Class` entry of the inner class.
    pub inner_class_info_index: u16,
    /// `Class` entry of the outer class, 0 for local and anonymous classes.
    pub outer_class_info_index: u16,
    /// `Utf8` entry of the simple name, 0 for anonymous classes.
    pub inner_name_index: u16,
    /// Access flags as declared in source.
    pub inner_class_access_flags: u16,
}

impl InnerClass {
    /// Decodes an `InnerClasses` body.
    pub fn parse_table(data: &[u8]) -> Result<Vec<Self>, ClassFileError> {
        let mut reader = Reader::new(data);
        let count = reader.u2()?;
        let mut table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            table.push(InnerClass {
                inner_class_info_index: reader.u2()?,
                outer_class_info_index: reader.u2()?,
                inner_name_index: reader.u2()?,
                inner_class_access_flags: reader.u2()?,
            });
        }
        finish(&reader, "InnerClasses")?;
        Ok(table)
    }

    /// Encodes an `InnerClasses` body.
    pub fn write_table(table: &[Self]) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::with_capacity(2 + table.len() * 8);
        write_count(&mut out, table.len(), "InnerClasses")?;
        for entry in table {
            write_u2(&mut out, entry.inner_class_info_index);
            write_u2(&mut out, entry.outer_class_info_index);
            write_u2(&mut out, entry.inner_name_index);
            write_u2(&mut out, entry.inner_class_access_flags);
        }
        Ok(out)
    }
}

/// The `EnclosingMethod` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnclosingMethod {
    /// `Class` entry of the enclosing class.
    pub class_index: u16,
    /// `NameAndType` entry of the enclosing method, 0 outside of methods.
    pub method_index: u16,
}

impl EnclosingMethod {
    /// Decodes the body.
    pub fn parse(data: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = Reader::new(data);
        let attribute = EnclosingMethod {
            class_index: reader.u2()?,
            method_index: reader.u2()?,
        };
        finish(&reader, "EnclosingMethod")?;
        Ok(attribute)
    }

    /// Encodes the body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4);
        write_u2(&mut out, self.class_index);
        write_u2(&mut out, self.method_index);
        out
    }
}

/// An entry of the `BootstrapMethods` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapMethod {
    /// `MethodHandle` entry of the bootstrap method.
    pub method_ref: u16,
    /// Static arguments.
    pub arguments: Vec<u16>,
}

impl BootstrapMethod {
    /// Decodes a `BootstrapMethods` body.
    pub fn parse_table(data: &[u8]) -> Result<Vec<Self>, ClassFileError> {
        let mut reader = Reader::new(data);
        let count = reader.u2()?;
        let mut table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let method_ref = reader.u2()?;
            let argument_count = reader.u2()?;
            let mut arguments = Vec::with_capacity(argument_count as usize);
            for _ in 0..argument_count {
                arguments.push(reader.u2()?);
            }
            table.push(BootstrapMethod { method_ref, arguments });
        }
        finish(&reader, "BootstrapMethods")?;
        Ok(table)
    }

    /// Encodes a `BootstrapMethods` body.
    pub fn write_table(table: &[Self]) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::new();
        write_count(&mut out, table.len(), "BootstrapMethods")?;
        for entry in table {
            write_u2(&mut out, entry.method_ref);
            write_count(&mut out, entry.arguments.len(), "BootstrapMethods")?;
            for argument in &entry.arguments {
                write_u2(&mut out, *argument);
            }
        }
        Ok(out)
    }
}

/// A component of the `Record` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordComponent {
    /// `Utf8` entry of the name.
    pub name_index: u16,
    /// `Utf8` entry of the field descriptor.
    pub descriptor_index: u16,
    /// Component attributes such as `Signature`.
    pub attributes: Vec<Attribute>,
}

impl RecordComponent {
    /// Decodes a `Record` body.
    pub fn parse_table(data: &[u8]) -> Result<Vec<Self>, ClassFileError> {
        let mut reader = Reader::new(data);
        let count = reader.u2()?;
        let mut components = Vec::with_capacity(count as usize);
        for _ in 0..count {
            components.push(RecordComponent {
                name_index: reader.u2()?,
                descriptor_index: reader.u2()?,
                attributes: parse_attributes(&mut reader)?,
            });
        }
        finish(&reader, "Record")?;
        Ok(components)
    }

    /// Encodes a `Record` body.
    pub fn write_table(components: &[Self]) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::new();
        write_count(&mut out, components.len(), "Record")?;
        for component in components {
            write_u2(&mut out, component.name_index);
            write_u2(&mut out, component.descriptor_index);
            write_attributes(&mut out, &component.attributes)?;
        }
        Ok(out)
    }
}

/// A single-index attribute such as `Signature`.
pub fn parse_index(data: &[u8], name: &'static str) -> Result<u16, ClassFileError> {
    let mut reader = Reader::new(data);
    let index = reader.u2()?;
    finish(&reader, name)?;
    Ok(index)
}

/// The value of an annotation element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementValue {
    /// A primitive or string constant, tagged `B C D F I J S Z s`.
    Const {
        /// The tag byte.
        tag: u8,
        /// Constant pool entry of the value.
        index: u16,
    },
    /// An enum constant.
    Enum {
        /// `Utf8` entry of the enum's field descriptor.
        type_name_index: u16,
        /// `Utf8` entry of the constant name.
        const_name_index: u16,
    },
    /// A class literal, as a return descriptor.
    Class(u16),
    /// A nested annotation.
    Annotation(Annotation),
    /// An array of values.
    Array(Vec<ElementValue>),
}

/// An annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// `Utf8` entry of the annotation's field descriptor.
    pub type_index: u16,
    /// Element name `Utf8` entries and their values.
    pub elements: Vec<(u16, ElementValue)>,
}

/// A type annotation.
///
/// The target and path are kept as raw bytes, they hold no symbol
/// references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeAnnotation {
    /// `target_type` followed by `target_info`.
    pub target: Vec<u8>,
    /// The `type_path` structure.
    pub path: Vec<u8>,
    /// The annotation itself.
    pub annotation: Annotation,
}

impl ElementValue {
    fn parse(reader: &mut Reader<'_>, depth: usize) -> Result<Self, ClassFileError> {
        if depth > 64 {
            return Err(malformed("annotation", "nesting too deep"));
        }
        let tag = reader.u1()?;
        Ok(match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
                tag,
                index: reader.u2()?,
            },
            b'e' => ElementValue::Enum {
                type_name_index: reader.u2()?,
                const_name_index: reader.u2()?,
            },
            b'c' => ElementValue::Class(reader.u2()?),
            b'@' => ElementValue::Annotation(Annotation::parse(reader, depth + 1)?),
            b'[' => {
                let count = reader.u2()?;
                let mut values = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    values.push(ElementValue::parse(reader, depth + 1)?);
                }
                ElementValue::Array(values)
            }
            _ => return Err(malformed("annotation", "unknown element tag")),
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        match self {
            ElementValue::Const { tag, index } => {
                out.push(*tag);
                write_u2(out, *index);
            }
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                out.push(b'e');
                write_u2(out, *type_name_index);
                write_u2(out, *const_name_index);
            }
            ElementValue::Class(index) => {
                out.push(b'c');
                write_u2(out, *index);
            }
            ElementValue::Annotation(annotation) => {
                out.push(b'@');
                annotation.write(out)?;
            }
            ElementValue::Array(values) => {
                out.push(b'[');
                write_count(out, values.len(), "annotation")?;
                for value in values {
                    value.write(out)?;
                }
            }
        }
        Ok(())
    }

    /// Decodes an `AnnotationDefault` body.
    pub fn parse_default(data: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = Reader::new(data);
        let value = ElementValue::parse(&mut reader, 0)?;
        finish(&reader, "AnnotationDefault")?;
        Ok(value)
    }

    /// Encodes an `AnnotationDefault` body.
    pub fn write_default(&self) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }
}

impl Annotation {
    fn parse(reader: &mut Reader<'_>, depth: usize) -> Result<Self, ClassFileError> {
        let type_index = reader.u2()?;
        let count = reader.u2()?;
        let mut elements = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let name_index = reader.u2()?;
            elements.push((name_index, ElementValue::parse(reader, depth)?));
        }
        Ok(Annotation { type_index, elements })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        write_u2(out, self.type_index);
        write_count(out, self.elements.len(), "annotation")?;
        for (name_index, value) in &self.elements {
            write_u2(out, *name_index);
            value.write(out)?;
        }
        Ok(())
    }

    fn parse_list(reader: &mut Reader<'_>) -> Result<Vec<Self>, ClassFileError> {
        let count = reader.u2()?;
        let mut annotations = Vec::with_capacity(count as usize);
        for _ in 0..count {
            annotations.push(Annotation::parse(reader, 0)?);
        }
        Ok(annotations)
    }

    fn write_list(out: &mut Vec<u8>, annotations: &[Self]) -> Result<(), ClassFileError> {
        write_count(out, annotations.len(), "annotation")?;
        for annotation in annotations {
            annotation.write(out)?;
        }
        Ok(())
    }

    /// Decodes a `Runtime(In)VisibleAnnotations` body.
    pub fn parse_table(data: &[u8]) -> Result<Vec<Self>, ClassFileError> {
        let mut reader = Reader::new(data);
        let annotations = Annotation::parse_list(&mut reader)?;
        finish(&reader, "RuntimeVisibleAnnotations")?;
        Ok(annotations)
    }

    /// Encodes a `Runtime(In)VisibleAnnotations` body.
    pub fn write_table(annotations: &[Self]) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::new();
        Annotation::write_list(&mut out, annotations)?;
        Ok(out)
    }

    /// Decodes a `Runtime(In)VisibleParameterAnnotations` body, one list per
    /// parameter slot.
    pub fn parse_parameters(data: &[u8]) -> Result<Vec<Vec<Self>>, ClassFileError> {
        let mut reader = Reader::new(data);
        let count = reader.u1()?;
        let mut parameters = Vec::with_capacity(count as usize);
        for _ in 0..count {
            parameters.push(Annotation::parse_list(&mut reader)?);
        }
        finish(&reader, "RuntimeVisibleParameterAnnotations")?;
        Ok(parameters)
    }

    /// Encodes a `Runtime(In)VisibleParameterAnnotations` body.
    pub fn write_parameters(parameters: &[Vec<Self>]) -> Result<Vec<u8>, ClassFileError> {
        let count = u8::try_from(parameters.len())
            .map_err(|_| malformed("RuntimeVisibleParameterAnnotations", "more than 255 parameters"))?;
        let mut out = vec![count];
        for annotations in parameters {
            Annotation::write_list(&mut out, annotations)?;
        }
        Ok(out)
    }
}

impl TypeAnnotation {
    fn target_info_len(reader: &Reader<'_>, target_type: u8) -> Result<usize, ClassFileError> {
        Ok(match target_type {
            0x00 | 0x01 | 0x16 => 1,
            0x10 | 0x11 | 0x12 | 0x17 | 0x42 | 0x43..=0x46 => 2,
            0x13..=0x15 => 0,
            0x47..=0x4B => 3,
            0x40 | 0x41 => {
                let bytes = reader.data.get(reader.pos..reader.pos + 2).ok_or(ClassFileError::Truncated)?;
                let count = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
                2 + count * 6
            }
            _ => return Err(malformed("RuntimeVisibleTypeAnnotations", "unknown target type")),
        })
    }

    /// Decodes a `Runtime(In)VisibleTypeAnnotations` body.
    pub fn parse_table(data: &[u8]) -> Result<Vec<Self>, ClassFileError> {
        let mut reader = Reader::new(data);
        let count = reader.u2()?;
        let mut annotations = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let target_type = reader.u1()?;
            let len = TypeAnnotation::target_info_len(&reader, target_type)?;
            let mut target = vec![target_type];
            target.extend_from_slice(reader.bytes(len)?);
            let path_len = reader.u1()? as usize;
            let mut path = vec![path_len as u8];
            path.extend_from_slice(reader.bytes(path_len * 2)?);
            let annotation = Annotation::parse(&mut reader, 0)?;
            annotations.push(TypeAnnotation {
                target,
                path,
                annotation,
            });
        }
        finish(&reader, "RuntimeVisibleTypeAnnotations")?;
        Ok(annotations)
    }

    /// Encodes a `Runtime(In)VisibleTypeAnnotations` body.
    pub fn write_table(annotations: &[Self]) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::new();
        write_count(&mut out, annotations.len(), "RuntimeVisibleTypeAnnotations")?;
        for annotation in annotations {
            out.extend_from_slice(&annotation.target);
            out.extend_from_slice(&annotation.path);
            annotation.annotation.write(&mut out)?;
        }
        Ok(out)
    }
}
