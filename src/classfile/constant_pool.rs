use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder};

use super::{ClassFileError, Reader};

/// A single constant pool entry.
///
/// Field names follow the class file format.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Constant {
    /// Slot 0 and the second slot of `Long`/`Double` entries.
    Unusable,
    /// `CONSTANT_Utf8`.
    Utf8(String),
    /// A `CONSTANT_Utf8` with unpaired surrogates, kept as its modified
    /// UTF-8 bytes. Such strings are never symbol names.
    Utf8Bytes(Vec<u8>),
    /// `CONSTANT_Integer`.
    Integer(i32),
    /// `CONSTANT_Float`.
    Float(f32),
    /// `CONSTANT_Long`.
    Long(i64),
    /// `CONSTANT_Double`.
    Double(f64),
    /// `CONSTANT_Class`.
    Class {
        name_index: u16,
    },
    /// `CONSTANT_String`.
    String {
        string_index: u16,
    },
    /// `CONSTANT_Fieldref`.
    Fieldref {
        class_index: u16,
        name_and_type_index: u16,
    },
    /// `CONSTANT_Methodref`.
    Methodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    /// `CONSTANT_InterfaceMethodref`.
    InterfaceMethodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    /// `CONSTANT_NameAndType`.
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    /// `CONSTANT_MethodHandle`.
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    /// `CONSTANT_MethodType`.
    MethodType {
        descriptor_index: u16,
    },
    /// `CONSTANT_Dynamic`.
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    /// `CONSTANT_InvokeDynamic`.
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    /// `CONSTANT_Module`.
    Module {
        name_index: u16,
    },
    /// `CONSTANT_Package`.
    Package {
        name_index: u16,
    },
}

impl Constant {
    fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// The constant pool of a class file, indexed from 1.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        ConstantPool {
            entries: vec![Constant::Unusable],
        }
    }
}

impl ConstantPool {
    pub(super) fn parse(reader: &mut Reader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.u2()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unusable);
        while entries.len() < count as usize {
            let index = entries.len() as u16;
            let tag = reader.u1()?;
            let constant = match tag {
                1 => {
                    let len = reader.u2()? as usize;
                    let bytes = reader.bytes(len)?;
                    let units = modified_utf8_units(bytes).ok_or(ClassFileError::InvalidUtf8 { index })?;
                    match String::from_utf16(&units) {
                        Ok(value) => Constant::Utf8(value),
                        Err(_) => Constant::Utf8Bytes(bytes.to_vec()),
                    }
                }
                3 => Constant::Integer(reader.u4()? as i32),
                4 => Constant::Float(f32::from_bits(reader.u4()?)),
                5 => Constant::Long(reader.u8()? as i64),
                6 => Constant::Double(f64::from_bits(reader.u8()?)),
                7 => Constant::Class {
                    name_index: reader.u2()?,
                },
                8 => Constant::String {
                    string_index: reader.u2()?,
                },
                9 => Constant::Fieldref {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                10 => Constant::Methodref {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                11 => Constant::InterfaceMethodref {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                12 => Constant::NameAndType {
                    name_index: reader.u2()?,
                    descriptor_index: reader.u2()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: reader.u1()?,
                    reference_index: reader.u2()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: reader.u2()?,
                },
                17 => Constant::Dynamic {
                    bootstrap_method_attr_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                19 => Constant::Module {
                    name_index: reader.u2()?,
                },
                20 => Constant::Package {
                    name_index: reader.u2()?,
                },
                tag => return Err(ClassFileError::InvalidConstantTag { index, tag }),
            };
            let wide = constant.is_wide();
            entries.push(constant);
            if wide {
                entries.push(Constant::Unusable);
            }
        }
        if entries.len() != count as usize {
            return Err(ClassFileError::Truncated);
        }
        Ok(ConstantPool { entries })
    }

    pub(super) fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        let count = u16::try_from(self.entries.len()).map_err(|_| ClassFileError::ConstantPoolOverflow)?;
        write_u2(out, count);
        for (index, entry) in self.entries.iter().enumerate().skip(1) {
            match entry {
                Constant::Unusable => {
                    let previous_is_wide = self.entries.get(index - 1).is_some_and(Constant::is_wide);
                    if !previous_is_wide {
                        return Err(ClassFileError::InvalidConstant {
                            index: index as u16,
                            expected: "usable entry",
                        });
                    }
                }
                Constant::Utf8(value) => {
                    let bytes = encode_modified_utf8(value);
                    let len = u16::try_from(bytes.len()).map_err(|_| ClassFileError::StringTooLong {
                        index: index as u16,
                    })?;
                    out.push(1);
                    write_u2(out, len);
                    out.extend_from_slice(&bytes);
                }
                Constant::Utf8Bytes(bytes) => {
                    let len = u16::try_from(bytes.len()).map_err(|_| ClassFileError::StringTooLong {
                        index: index as u16,
                    })?;
                    out.push(1);
                    write_u2(out, len);
                    out.extend_from_slice(bytes);
                }
                Constant::Integer(value) => {
                    out.push(3);
                    write_u4(out, *value as u32);
                }
                Constant::Float(value) => {
                    out.push(4);
                    write_u4(out, value.to_bits());
                }
                Constant::Long(value) => {
                    out.push(5);
                    write_u8(out, *value as u64);
                }
                Constant::Double(value) => {
                    out.push(6);
                    write_u8(out, value.to_bits());
                }
                Constant::Class { name_index } => {
                    out.push(7);
                    write_u2(out, *name_index);
                }
                Constant::String { string_index } => {
                    out.push(8);
                    write_u2(out, *string_index);
                }
                Constant::Fieldref {
                    class_index,
                    name_and_type_index,
                } => {
                    out.push(9);
                    write_u2(out, *class_index);
                    write_u2(out, *name_and_type_index);
                }
                Constant::Methodref {
                    class_index,
                    name_and_type_index,
                } => {
                    out.push(10);
                    write_u2(out, *class_index);
                    write_u2(out, *name_and_type_index);
                }
                Constant::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    out.push(11);
                    write_u2(out, *class_index);
                    write_u2(out, *name_and_type_index);
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    out.push(12);
                    write_u2(out, *name_index);
                    write_u2(out, *descriptor_index);
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    out.push(15);
                    out.push(*reference_kind);
                    write_u2(out, *reference_index);
                }
                Constant::MethodType { descriptor_index } => {
                    out.push(16);
                    write_u2(out, *descriptor_index);
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    out.push(17);
                    write_u2(out, *bootstrap_method_attr_index);
                    write_u2(out, *name_and_type_index);
                }
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    out.push(18);
                    write_u2(out, *bootstrap_method_attr_index);
                    write_u2(out, *name_and_type_index);
                }
                Constant::Module { name_index } => {
                    out.push(19);
                    write_u2(out, *name_index);
                }
                Constant::Package { name_index } => {
                    out.push(20);
                    write_u2(out, *name_index);
                }
            }
        }
        Ok(())
    }

    /// Number of slots, including the unusable slot 0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool holds nothing but slot 0.
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// The entry at `index`.
    pub fn get(&self, index: u16) -> Result<&Constant, ClassFileError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassFileError::InvalidConstant {
                index,
                expected: "constant",
            }),
            Some(constant) => Ok(constant),
        }
    }

    /// All entries with their indices, skipping unusable slots.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| (i as u16, c))
    }

    /// The string of a `Utf8` entry.
    pub fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value),
            Constant::Utf8Bytes(_) => Err(ClassFileError::InvalidUtf8 { index }),
            _ => Err(ClassFileError::InvalidConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// The internal name of a `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::InvalidConstant {
                index,
                expected: "Class",
            }),
        }
    }

    /// Name and descriptor of a `NameAndType` entry.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassFileError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassFileError::InvalidConstant {
                index,
                expected: "NameAndType",
            }),
        }
    }

    /// Owner, name and descriptor of a field or method reference.
    pub fn member_ref(&self, index: u16) -> Result<(&str, &str, &str), ClassFileError> {
        match self.get(index)? {
            Constant::Fieldref {
                class_index,
                name_and_type_index,
            }
            | Constant::Methodref {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => {
                let owner = self.class_name(*class_index)?;
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                Ok((owner, name, descriptor))
            }
            _ => Err(ClassFileError::InvalidConstant {
                index,
                expected: "member reference",
            }),
        }
    }
}

/// Appends entries to a constant pool, reusing equal `Utf8` and
/// `NameAndType` entries.
///
/// Existing entries keep their index. Only entries that are never modified
/// during rewriting are deduplicated against the original pool.
#[derive(Debug, Default)]
pub struct ConstantPoolBuilder {
    pool: ConstantPool,
    utf8: HashMap<String, u16>,
    class: HashMap<String, u16>,
    name_and_type: HashMap<(u16, u16), u16>,
    member_ref: HashMap<(u8, u16, u16), u16>,
}

impl ConstantPoolBuilder {
    /// Creates a builder for an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder appending to an existing pool.
    pub fn from_pool(pool: ConstantPool) -> Self {
        let mut builder = ConstantPoolBuilder::default();
        for (index, constant) in pool.iter() {
            match constant {
                Constant::Utf8(value) => {
                    builder.utf8.entry(value.clone()).or_insert(index);
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    builder
                        .name_and_type
                        .entry((*name_index, *descriptor_index))
                        .or_insert(index);
                }
                _ => {}
            }
        }
        builder.pool = pool;
        builder
    }

    /// The pool built so far.
    pub fn pool(&self) -> &ConstantPool {
        &self.pool
    }

    /// Consumes the builder and returns the pool.
    pub fn into_pool(self) -> ConstantPool {
        self.pool
    }

    /// Adds a `Utf8` entry unless an equal one exists.
    pub fn utf8(&mut self, value: &str) -> Result<u16, ClassFileError> {
        if let Some(index) = self.utf8.get(value) {
            return Ok(*index);
        }
        let index = self.push(Constant::Utf8(value.to_string()))?;
        self.utf8.insert(value.to_string(), index);
        Ok(index)
    }

    /// Adds a `Class` entry.
    pub fn class(&mut self, name: &str) -> Result<u16, ClassFileError> {
        if let Some(index) = self.class.get(name) {
            return Ok(*index);
        }
        let name_index = self.utf8(name)?;
        let index = self.push(Constant::Class { name_index })?;
        self.class.insert(name.to_string(), index);
        Ok(index)
    }

    /// Adds a `String` entry.
    pub fn string(&mut self, value: &str) -> Result<u16, ClassFileError> {
        let string_index = self.utf8(value)?;
        self.push(Constant::String { string_index })
    }

    /// Adds an `Integer` entry.
    pub fn integer(&mut self, value: i32) -> Result<u16, ClassFileError> {
        self.push(Constant::Integer(value))
    }

    /// Adds a `Long` entry, which takes two slots.
    pub fn long(&mut self, value: i64) -> Result<u16, ClassFileError> {
        let index = self.push(Constant::Long(value))?;
        self.push(Constant::Unusable)?;
        Ok(index)
    }

    /// Adds a `NameAndType` entry unless an equal one exists.
    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, ClassFileError> {
        let key = (self.utf8(name)?, self.utf8(descriptor)?);
        if let Some(index) = self.name_and_type.get(&key) {
            return Ok(*index);
        }
        let index = self.push(Constant::NameAndType {
            name_index: key.0,
            descriptor_index: key.1,
        })?;
        self.name_and_type.insert(key, index);
        Ok(index)
    }

    /// Adds a `Fieldref` entry.
    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16, ClassFileError> {
        self.member_ref(9, owner, name, descriptor)
    }

    /// Adds a `Methodref` entry.
    pub fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16, ClassFileError> {
        self.member_ref(10, owner, name, descriptor)
    }

    /// Adds an `InterfaceMethodref` entry.
    pub fn interface_method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassFileError> {
        self.member_ref(11, owner, name, descriptor)
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> Result<u16, ClassFileError> {
        let class_index = self.class(owner)?;
        let name_and_type_index = self.name_and_type(name, descriptor)?;
        let key = (tag, class_index, name_and_type_index);
        if let Some(index) = self.member_ref.get(&key) {
            return Ok(*index);
        }
        let constant = match tag {
            9 => Constant::Fieldref {
                class_index,
                name_and_type_index,
            },
            10 => Constant::Methodref {
                class_index,
                name_and_type_index,
            },
            _ => Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            },
        };
        let index = self.push(constant)?;
        self.member_ref.insert(key, index);
        Ok(index)
    }

    /// Adds a `MethodHandle` entry.
    pub fn method_handle(&mut self, reference_kind: u8, reference_index: u16) -> Result<u16, ClassFileError> {
        self.push(Constant::MethodHandle {
            reference_kind,
            reference_index,
        })
    }

    /// Adds a `MethodType` entry.
    pub fn method_type(&mut self, descriptor: &str) -> Result<u16, ClassFileError> {
        let descriptor_index = self.utf8(descriptor)?;
        self.push(Constant::MethodType { descriptor_index })
    }

    /// Adds an `InvokeDynamic` entry.
    pub fn invoke_dynamic(
        &mut self,
        bootstrap_method_attr_index: u16,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassFileError> {
        let name_and_type_index = self.name_and_type(name, descriptor)?;
        self.push(Constant::InvokeDynamic {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    /// Replaces the entry at `index` in place.
    pub fn replace(&mut self, index: u16, constant: Constant) -> Result<(), ClassFileError> {
        match self.pool.entries.get_mut(index as usize) {
            Some(slot) if !matches!(slot, Constant::Unusable) && !slot.is_wide() && !constant.is_wide() => {
                *slot = constant;
                Ok(())
            }
            _ => Err(ClassFileError::InvalidConstant {
                index,
                expected: "replaceable constant",
            }),
        }
    }

    fn push(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        let index = u16::try_from(self.pool.entries.len()).map_err(|_| ClassFileError::ConstantPoolOverflow)?;
        if index == u16::MAX {
            return Err(ClassFileError::ConstantPoolOverflow);
        }
        self.pool.entries.push(constant);
        Ok(index)
    }
}

/// Decodes the JVM's modified UTF-8 into UTF-16 code units.
///
/// Supplementary characters are stored as surrogate pairs, each encoded in
/// three bytes. Surrogates are not checked for pairing here.
fn modified_utf8_units(bytes: &[u8]) -> Option<Vec<u16>> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let a = bytes[pos] as u16;
        if a & 0x80 == 0 {
            if a == 0 {
                return None;
            }
            units.push(a);
            pos += 1;
        } else if a & 0xE0 == 0xC0 {
            let b = *bytes.get(pos + 1)? as u16;
            if b & 0xC0 != 0x80 {
                return None;
            }
            units.push(((a & 0x1F) << 6) | (b & 0x3F));
            pos += 2;
        } else if a & 0xF0 == 0xE0 {
            let b = *bytes.get(pos + 1)? as u16;
            let c = *bytes.get(pos + 2)? as u16;
            if b & 0xC0 != 0x80 || c & 0xC0 != 0x80 {
                return None;
            }
            units.push(((a & 0x0F) << 12) | ((b & 0x3F) << 6) | (c & 0x3F));
            pos += 3;
        } else {
            return None;
        }
    }
    Some(units)
}

/// Encodes a string as modified UTF-8.
pub(crate) fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push((0xC0 | (unit >> 6)) as u8);
                out.push((0x80 | (unit & 0x3F)) as u8);
            }
            _ => {
                out.push((0xE0 | (unit >> 12)) as u8);
                out.push((0x80 | ((unit >> 6) & 0x3F)) as u8);
                out.push((0x80 | (unit & 0x3F)) as u8);
            }
        }
    }
    out
}

pub(crate) fn write_u2(out: &mut Vec<u8>, value: u16) {
    let mut buf = [0; 2];
    BigEndian::write_u16(&mut buf, value);
    out.extend_from_slice(&buf);
}

pub(crate) fn write_u4(out: &mut Vec<u8>, value: u32) {
    let mut buf = [0; 4];
    BigEndian::write_u32(&mut buf, value);
    out.extend_from_slice(&buf);
}

fn write_u8(out: &mut Vec<u8>, value: u64) {
    let mut buf = [0; 8];
    BigEndian::write_u64(&mut buf, value);
    out.extend_from_slice(&buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
        String::from_utf16(&modified_utf8_units(bytes)?).ok()
    }

    #[test]
    fn test_modified_utf8() {
        assert_eq!(encode_modified_utf8("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode_modified_utf8(&[b'a', 0xC0, 0x80, b'b']).as_deref(), Some("a\0b"));

        // U+1F600 as a surrogate pair, three bytes each
        let encoded = encode_modified_utf8("\u{1F600}");
        assert_eq!(encoded, vec![0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);
        assert_eq!(decode_modified_utf8(&encoded).as_deref(), Some("\u{1F600}"));

        assert_eq!(decode_modified_utf8(&[0xED, 0xA0, 0xBD]), None);
        assert_eq!(modified_utf8_units(&[0xED, 0xA0, 0xBD]), Some(vec![0xD83D]));
        assert_eq!(modified_utf8_units(&[0x00]), None);
        assert_eq!(modified_utf8_units(&[0xC3]), None);
    }

    #[test]
    fn test_unpaired_surrogate_kept_as_bytes() {
        // Utf8 "\u{D800}" and a String pointing at it
        let bytes = [0x00, 0x03, 0x01, 0x00, 0x03, 0xED, 0xA0, 0x80, 0x08, 0x00, 0x01];
        let pool = ConstantPool::parse(&mut Reader::new(&bytes)).unwrap();
        assert_eq!(pool.get(1).unwrap(), &Constant::Utf8Bytes(vec![0xED, 0xA0, 0x80]));
        assert_eq!(pool.utf8(1), Err(ClassFileError::InvalidUtf8 { index: 1 }));

        let mut out = Vec::new();
        pool.write(&mut out).unwrap();
        assert_eq!(out, bytes);

        let mut builder = ConstantPoolBuilder::from_pool(pool);
        let a = builder.utf8("a").unwrap();
        assert_eq!(a, 3);
    }

    #[test]
    fn test_builder_dedup() {
        let mut builder = ConstantPoolBuilder::new();
        let a = builder.utf8("foo").unwrap();
        assert_eq!(builder.utf8("foo").unwrap(), a);

        let m1 = builder.method_ref("a/B", "c", "()V").unwrap();
        let m2 = builder.method_ref("a/B", "c", "()V").unwrap();
        let f = builder.field_ref("a/B", "c", "()V").unwrap();
        assert_eq!(m1, m2);
        assert_ne!(m1, f);

        let pool = builder.into_pool();
        assert_eq!(pool.member_ref(m1).unwrap(), ("a/B", "c", "()V"));
    }

    #[test]
    fn test_wide_entries() {
        let mut builder = ConstantPoolBuilder::new();
        let long = builder.long(42).unwrap();
        let next = builder.utf8("x").unwrap();
        assert_eq!(next, long + 2);
        assert!(builder.pool().get(long + 1).is_err());
        assert!(builder.replace(long, Constant::Integer(1)).is_err());
    }

    #[test]
    fn test_from_pool_appends() {
        let mut builder = ConstantPoolBuilder::new();
        let name = builder.utf8("a").unwrap();
        let nat = builder.name_and_type("a", "I").unwrap();
        let pool = builder.into_pool();
        let len = pool.len();

        let mut builder = ConstantPoolBuilder::from_pool(pool);
        assert_eq!(builder.utf8("a").unwrap(), name);
        assert_eq!(builder.name_and_type("a", "I").unwrap(), nat);
        assert_eq!(builder.utf8("b").unwrap() as usize, len);
    }

    #[test]
    fn test_accessor_errors() {
        let mut builder = ConstantPoolBuilder::new();
        let utf8 = builder.utf8("x").unwrap();
        let pool = builder.into_pool();
        assert!(matches!(
            pool.class_name(utf8),
            Err(ClassFileError::InvalidConstant { expected: "Class", .. })
        ));
        assert!(pool.utf8(0).is_err());
        assert!(pool.utf8(99).is_err());
    }
}
