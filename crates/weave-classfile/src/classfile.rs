use std::borrow::Cow;

use crate::constant_pool::{ConstantPool, CpInfo};
use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::writer::Writer;

pub const MAGIC: u32 = 0xCAFE_BABE;
/// Oldest class file version the reader accepts (JDK 1.0.2).
pub const MIN_MAJOR_VERSION: u16 = 45;
/// Newest class file version the reader accepts (Java 26).
pub const MAX_MAJOR_VERSION: u16 = 70;

/// A parsed class file.
///
/// Everything the transformer does not interpret (method bodies, annotations,
/// stack maps, ...) stays as raw attribute payloads borrowed from the input, so
/// [`ClassFile::to_bytes`] reproduces untouched sections exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile<'a> {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool<'a>,
    pub access_flags: u16,
    pub this_class: u16,
    /// `0` for `java/lang/Object` and `module-info`.
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<Member<'a>>,
    pub methods: Vec<Member<'a>>,
    pub attributes: Vec<Attribute<'a>>,
}

/// A `field_info` or `method_info` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member<'a> {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name_index: u16,
    pub info: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn new(name_index: u16, info: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            name_index,
            info: info.into(),
        }
    }
}

impl<'a> ClassFile<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        check_version(major_version, minor_version)?;

        let constant_pool = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = reader.read_u2()?;
        constant_pool.get_class_name(this_class)?;
        let super_class = reader.read_u2()?;
        if super_class != 0 {
            constant_pool.get_class_name(super_class)?;
        }

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            let index = reader.read_u2()?;
            constant_pool.get_class_name(index)?;
            interfaces.push(index);
        }

        let fields = parse_members(&mut reader, &constant_pool)?;
        let methods = parse_members(&mut reader, &constant_pool)?;
        let attributes = parse_attributes(&mut reader, &constant_pool)?;

        reader.ensure_empty()?;

        Ok(Self {
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

    /// Serializes the class back into the class file format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(self.estimated_len());
        w.write_u4(MAGIC);
        w.write_u2(self.minor_version);
        w.write_u2(self.major_version);
        self.constant_pool.write(&mut w);
        w.write_u2(self.access_flags);
        w.write_u2(self.this_class);
        w.write_u2(self.super_class);
        w.write_u2(self.interfaces.len() as u16);
        for index in &self.interfaces {
            w.write_u2(*index);
        }
        write_members(&mut w, &self.fields);
        write_members(&mut w, &self.methods);
        write_attributes(&mut w, &self.attributes);
        w.into_inner()
    }

    pub fn this_class_name(&self) -> Result<Cow<'_, str>> {
        self.constant_pool.get_class_name(self.this_class)
    }

    pub fn super_class_name(&self) -> Result<Option<Cow<'_, str>>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.get_class_name(self.super_class).map(Some)
    }

    pub fn member_name(&self, member: &Member<'_>) -> Result<Cow<'_, str>> {
        self.constant_pool.get_utf8(member.name_index)
    }

    /// Class-level attributes whose name is `name`, with their positions.
    pub fn attributes_named<'s>(
        &'s self,
        name: &'s str,
    ) -> impl Iterator<Item = (usize, &'s Attribute<'a>)> + 's {
        self.attributes
            .iter()
            .enumerate()
            .filter(move |(_, attr)| self.attribute_has_name(attr, name))
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes
            .iter()
            .find(|attr| self.attribute_has_name(attr, name))
    }

    /// The value of the standard `SourceFile` attribute, e.g. `Foo.java`.
    pub fn source_file(&self) -> Result<Option<Cow<'_, str>>> {
        let Some(attr) = self.attribute("SourceFile") else {
            return Ok(None);
        };
        let index = u2_payload(attr).ok_or(Error::MalformedAttribute("SourceFile"))?;
        self.constant_pool.get_utf8(index).map(Some)
    }

    pub(crate) fn attribute_has_name(&self, attr: &Attribute<'_>, name: &str) -> bool {
        self.constant_pool
            .get_utf8(attr.name_index)
            .map(|n| n == name)
            .unwrap_or(false)
    }

    fn estimated_len(&self) -> usize {
        let attrs = |attrs: &[Attribute<'_>]| attrs.iter().map(|a| 6 + a.info.len()).sum::<usize>();
        let members = |members: &[Member<'_>]| {
            members
                .iter()
                .map(|m| 8 + attrs(&m.attributes))
                .sum::<usize>()
        };
        // The pool is not measured; the buffer grows as needed.
        24 + 2 * self.interfaces.len()
            + members(&self.fields)
            + members(&self.methods)
            + attrs(&self.attributes)
    }
}

/// Reads an attribute payload that consists of a single u2 index.
pub(crate) fn u2_payload(attr: &Attribute<'_>) -> Option<u16> {
    match &*attr.info {
        [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

fn check_version(major: u16, minor: u16) -> Result<()> {
    let unsupported = Error::UnsupportedVersion { major, minor };
    if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major) {
        return Err(unsupported);
    }
    // From Java 12 on, the minor version is either 0 or 0xFFFF (preview features).
    if major >= 56 && minor != 0 && minor != 0xFFFF {
        return Err(unsupported);
    }
    Ok(())
}

fn parse_members<'a>(reader: &mut Reader<'a>, cp: &ConstantPool<'a>) -> Result<Vec<Member<'a>>> {
    let count = reader.read_u2()? as usize;
    let mut members = Vec::with_capacity(count);
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        cp.get_utf8_bytes(name_index)?;
        let descriptor_index = reader.read_u2()?;
        cp.get_utf8_bytes(descriptor_index)?;
        let attributes = parse_attributes(reader, cp)?;
        members.push(Member {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        });
    }
    Ok(members)
}

fn parse_attributes<'a>(
    reader: &mut Reader<'a>,
    cp: &ConstantPool<'a>,
) -> Result<Vec<Attribute<'a>>> {
    let count = reader.read_u2()? as usize;
    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        match cp.get(name_index)? {
            CpInfo::Utf8(_) => {}
            other => {
                return Err(Error::ConstantPoolTypeMismatch {
                    index: name_index,
                    expected: "Utf8",
                    found: other.kind(),
                })
            }
        }
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        attributes.push(Attribute {
            name_index,
            info: Cow::Borrowed(info),
        });
    }
    Ok(attributes)
}

fn write_members(w: &mut Writer, members: &[Member<'_>]) {
    w.write_u2(members.len() as u16);
    for member in members {
        w.write_u2(member.access_flags);
        w.write_u2(member.name_index);
        w.write_u2(member.descriptor_index);
        write_attributes(w, &member.attributes);
    }
}

fn write_attributes(w: &mut Writer, attributes: &[Attribute<'_>]) {
    w.write_u2(attributes.len() as u16);
    for attr in attributes {
        w.write_u2(attr.name_index);
        w.write_u4(attr.info.len() as u32);
        w.write_bytes(&attr.info);
    }
}
