//! Structural parsing and serialization of JVM class files.
//!
//! Only the layout is decoded: the constant pool, the class header, member
//! headers and attributes as raw byte blobs. The attribute structures that
//! carry symbol references can be decoded on demand through the types in
//! [`attributes`]. Writing a parsed class back without changes yields the
//! original bytes.

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

pub mod attributes;
mod constant_pool;

pub use constant_pool::{Constant, ConstantPool, ConstantPoolBuilder};
pub(crate) use constant_pool::{write_u2, write_u4};

const MAGIC: u32 = 0xCAFE_BABE;

/// Access flag `ACC_PUBLIC`.
pub const ACC_PUBLIC: u16 = 0x0001;
/// Access flag `ACC_PRIVATE`.
pub const ACC_PRIVATE: u16 = 0x0002;
/// Access flag `ACC_STATIC`.
pub const ACC_STATIC: u16 = 0x0008;
/// Access flag `ACC_INTERFACE`.
pub const ACC_INTERFACE: u16 = 0x0200;
/// Access flag `ACC_ABSTRACT`.
pub const ACC_ABSTRACT: u16 = 0x0400;
/// Access flag `ACC_ENUM`.
pub const ACC_ENUM: u16 = 0x4000;

/// Errors raised while reading or writing a class file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    /// The input ends before the structure does.
    #[error("unexpected end of class file")]
    Truncated,
    /// The file does not start with `0xCAFEBABE`.
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),
    /// Bytes are left after the last attribute.
    #[error("{0} trailing bytes after class file")]
    TrailingBytes(usize),
    /// Unknown constant pool tag.
    #[error("invalid constant pool tag {tag} at index {index}")]
    InvalidConstantTag {
        /// Pool index.
        index: u16,
        /// The offending tag.
        tag: u8,
    },
    /// A constant pool index points at the wrong kind of entry.
    #[error("constant pool index {index} is not a {expected}")]
    InvalidConstant {
        /// Pool index.
        index: u16,
        /// What the reference expects.
        expected: &'static str,
    },
    /// A `Utf8` entry is not valid modified UTF-8.
    #[error("invalid modified UTF-8 at constant pool index {index}")]
    InvalidUtf8 {
        /// Pool index.
        index: u16,
    },
    /// A string is too long for a `Utf8` entry.
    #[error("string at constant pool index {index} exceeds 65535 bytes")]
    StringTooLong {
        /// Pool index.
        index: u16,
    },
    /// Appending would exceed the 65535 entry limit.
    #[error("constant pool overflow")]
    ConstantPoolOverflow,
    /// An attribute body does not match its declared structure.
    #[error("malformed {name} attribute: {reason}")]
    InvalidAttribute {
        /// Attribute name.
        name: &'static str,
        /// What went wrong.
        reason: &'static str,
    },
}

/// A parsed class file.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassFile {
    /// Minor version.
    pub minor_version: u16,
    /// Major version.
    pub major_version: u16,
    /// The constant pool.
    pub constant_pool: ConstantPool,
    /// Class access flags.
    pub access_flags: u16,
    /// `Class` entry of this class.
    pub this_class: u16,
    /// `Class` entry of the superclass, 0 for `java/lang/Object`.
    pub super_class: u16,
    /// `Class` entries of the direct interfaces.
    pub interfaces: Vec<u16>,
    /// Field headers.
    pub fields: Vec<MemberInfo>,
    /// Method headers.
    pub methods: Vec<MemberInfo>,
    /// Class attributes.
    pub attributes: Vec<Attribute>,
}

/// A field or method header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access flags.
    pub access_flags: u16,
    /// `Utf8` entry of the name.
    pub name_index: u16,
    /// `Utf8` entry of the descriptor.
    pub descriptor_index: u16,
    /// Member attributes.
    pub attributes: Vec<Attribute>,
}

/// An attribute with its undecoded body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// `Utf8` entry of the attribute name.
    pub name_index: u16,
    /// The attribute body.
    pub data: Vec<u8>,
}

impl ClassFile {
    /// Parses a complete class file.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = Reader::new(bytes);
        let magic = reader.u4()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        let minor_version = reader.u2()?;
        let major_version = reader.u2()?;
        let constant_pool = ConstantPool::parse(&mut reader)?;
        let access_flags = reader.u2()?;
        let this_class = reader.u2()?;
        let super_class = reader.u2()?;
        let interface_count = reader.u2()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(reader.u2()?);
        }
        let fields = parse_members(&mut reader)?;
        let methods = parse_members(&mut reader)?;
        let attributes = parse_attributes(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes(reader.remaining()));
        }
        Ok(ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Serializes the class file.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::new();
        write_u4(&mut out, MAGIC);
        write_u2(&mut out, self.minor_version);
        write_u2(&mut out, self.major_version);
        self.constant_pool.write(&mut out)?;
        write_u2(&mut out, self.access_flags);
        write_u2(&mut out, self.this_class);
        write_u2(&mut out, self.super_class);
        write_count(&mut out, self.interfaces.len(), "interfaces")?;
        for interface in &self.interfaces {
            write_u2(&mut out, *interface);
        }
        for members in [&self.fields, &self.methods] {
            write_count(&mut out, members.len(), "members")?;
            for member in members {
                write_u2(&mut out, member.access_flags);
                write_u2(&mut out, member.name_index);
                write_u2(&mut out, member.descriptor_index);
                write_attributes(&mut out, &member.attributes)?;
            }
        }
        write_attributes(&mut out, &self.attributes)?;
        Ok(out)
    }

    /// Internal name of this class.
    pub fn name(&self) -> Result<&str, ClassFileError> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Internal name of the superclass, if any.
    pub fn super_name(&self) -> Result<Option<&str>, ClassFileError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    /// Internal names of the direct interfaces.
    pub fn interface_names(&self) -> Result<Vec<&str>, ClassFileError> {
        self.interfaces
            .iter()
            .map(|index| self.constant_pool.class_name(*index))
            .collect()
    }

    /// The first class attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        find_attribute(&self.constant_pool, &self.attributes, name)
    }

    /// Name and descriptor of a member header.
    pub fn member<'a>(&'a self, member: &MemberInfo) -> Result<(&'a str, &'a str), ClassFileError> {
        Ok((
            self.constant_pool.utf8(member.name_index)?,
            self.constant_pool.utf8(member.descriptor_index)?,
        ))
    }
}

/// The first attribute in `attributes` called `name`.
pub fn find_attribute<'a>(pool: &ConstantPool, attributes: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attributes
        .iter()
        .find(|attribute| pool.utf8(attribute.name_index).is_ok_and(|n| n == name))
}

fn parse_members(reader: &mut Reader<'_>) -> Result<Vec<MemberInfo>, ClassFileError> {
    let count = reader.u2()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        members.push(MemberInfo {
            access_flags: reader.u2()?,
            name_index: reader.u2()?,
            descriptor_index: reader.u2()?,
            attributes: parse_attributes(reader)?,
        });
    }
    Ok(members)
}

pub(crate) fn parse_attributes(reader: &mut Reader<'_>) -> Result<Vec<Attribute>, ClassFileError> {
    let count = reader.u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = reader.u2()?;
        let len = reader.u4()? as usize;
        attributes.push(Attribute {
            name_index,
            data: reader.bytes(len)?.to_vec(),
        });
    }
    Ok(attributes)
}

pub(crate) fn write_attributes(out: &mut Vec<u8>, attributes: &[Attribute]) -> Result<(), ClassFileError> {
    write_count(out, attributes.len(), "attributes")?;
    for attribute in attributes {
        write_u2(out, attribute.name_index);
        let len = u32::try_from(attribute.data.len()).map_err(|_| ClassFileError::InvalidAttribute {
            name: "attribute",
            reason: "body too large",
        })?;
        write_u4(out, len);
        out.extend_from_slice(&attribute.data);
    }
    Ok(())
}

pub(crate) fn write_count(out: &mut Vec<u8>, count: usize, name: &'static str) -> Result<(), ClassFileError> {
    let count = u16::try_from(count).map_err(|_| ClassFileError::InvalidAttribute {
        name,
        reason: "more than 65535 entries",
    })?;
    write_u2(out, count);
    Ok(())
}

/// Big-endian cursor over a byte slice.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self.pos.checked_add(len).ok_or(ClassFileError::Truncated)?;
        let bytes = self.data.get(self.pos..end).ok_or(ClassFileError::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn u1(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u2(&mut self) -> Result<u16, ClassFileError> {
        Ok(BigEndian::read_u16(self.bytes(2)?))
    }

    pub(crate) fn u4(&mut self) -> Result<u32, ClassFileError> {
        Ok(BigEndian::read_u32(self.bytes(4)?))
    }

    pub(crate) fn u8(&mut self) -> Result<u64, ClassFileError> {
        Ok(BigEndian::read_u64(self.bytes(8)?))
    }
}
