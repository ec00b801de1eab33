use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::mutf8;
use crate::reader::Reader;
use crate::writer::Writer;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// One constant pool entry.
///
/// Numeric constants keep their raw bits so serialization is byte-exact even
/// for NaN payloads. `Utf8` keeps the modified UTF-8 bytes as they appeared in
/// the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpInfo<'a> {
    Utf8(Cow<'a, [u8]>),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl<'a> CpInfo<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::Fieldref { .. } => "Fieldref",
            CpInfo::Methodref { .. } => "Methodref",
            CpInfo::InterfaceMethodref { .. } => "InterfaceMethodref",
            CpInfo::NameAndType { .. } => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::InvokeDynamic { .. } => "InvokeDynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
        }
    }

    /// `Long` and `Double` take up two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, CpInfo::Long(_) | CpInfo::Double(_))
    }

    fn parse(reader: &mut Reader<'a>) -> Result<Self> {
        let tag = reader.read_u1()?;
        let info = match tag {
            TAG_UTF8 => {
                let len = reader.read_u2()? as usize;
                CpInfo::Utf8(Cow::Borrowed(reader.read_bytes(len)?))
            }
            TAG_INTEGER => CpInfo::Integer(reader.read_u4()? as i32),
            TAG_FLOAT => CpInfo::Float(reader.read_u4()?),
            TAG_LONG => CpInfo::Long(reader.read_u8()? as i64),
            TAG_DOUBLE => CpInfo::Double(reader.read_u8()?),
            TAG_CLASS => CpInfo::Class {
                name_index: reader.read_u2()?,
            },
            TAG_STRING => CpInfo::String {
                string_index: reader.read_u2()?,
            },
            TAG_FIELDREF => CpInfo::Fieldref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            TAG_METHODREF => CpInfo::Methodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            TAG_INTERFACE_METHODREF => CpInfo::InterfaceMethodref {
                class_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            TAG_NAME_AND_TYPE => CpInfo::NameAndType {
                name_index: reader.read_u2()?,
                descriptor_index: reader.read_u2()?,
            },
            TAG_METHOD_HANDLE => CpInfo::MethodHandle {
                reference_kind: reader.read_u1()?,
                reference_index: reader.read_u2()?,
            },
            TAG_METHOD_TYPE => CpInfo::MethodType {
                descriptor_index: reader.read_u2()?,
            },
            TAG_DYNAMIC => CpInfo::Dynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            TAG_INVOKE_DYNAMIC => CpInfo::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_u2()?,
                name_and_type_index: reader.read_u2()?,
            },
            TAG_MODULE => CpInfo::Module {
                name_index: reader.read_u2()?,
            },
            TAG_PACKAGE => CpInfo::Package {
                name_index: reader.read_u2()?,
            },
            other => return Err(Error::InvalidConstantPoolTag(other)),
        };
        Ok(info)
    }

    fn write(&self, w: &mut Writer) {
        match self {
            CpInfo::Utf8(bytes) => {
                w.write_u1(TAG_UTF8);
                // Length is bounded on the way in (parse or `push_utf8`).
                w.write_u2(bytes.len() as u16);
                w.write_bytes(bytes);
            }
            CpInfo::Integer(v) => {
                w.write_u1(TAG_INTEGER);
                w.write_u4(*v as u32);
            }
            CpInfo::Float(bits) => {
                w.write_u1(TAG_FLOAT);
                w.write_u4(*bits);
            }
            CpInfo::Long(v) => {
                w.write_u1(TAG_LONG);
                w.write_u8(*v as u64);
            }
            CpInfo::Double(bits) => {
                w.write_u1(TAG_DOUBLE);
                w.write_u8(*bits);
            }
            CpInfo::Class { name_index } => {
                w.write_u1(TAG_CLASS);
                w.write_u2(*name_index);
            }
            CpInfo::String { string_index } => {
                w.write_u1(TAG_STRING);
                w.write_u2(*string_index);
            }
            CpInfo::Fieldref {
                class_index,
                name_and_type_index,
            } => {
                w.write_u1(TAG_FIELDREF);
                w.write_u2(*class_index);
                w.write_u2(*name_and_type_index);
            }
            CpInfo::Methodref {
                class_index,
                name_and_type_index,
            } => {
                w.write_u1(TAG_METHODREF);
                w.write_u2(*class_index);
                w.write_u2(*name_and_type_index);
            }
            CpInfo::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => {
                w.write_u1(TAG_INTERFACE_METHODREF);
                w.write_u2(*class_index);
                w.write_u2(*name_and_type_index);
            }
            CpInfo::NameAndType {
                name_index,
                descriptor_index,
            } => {
                w.write_u1(TAG_NAME_AND_TYPE);
                w.write_u2(*name_index);
                w.write_u2(*descriptor_index);
            }
            CpInfo::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                w.write_u1(TAG_METHOD_HANDLE);
                w.write_u1(*reference_kind);
                w.write_u2(*reference_index);
            }
            CpInfo::MethodType { descriptor_index } => {
                w.write_u1(TAG_METHOD_TYPE);
                w.write_u2(*descriptor_index);
            }
            CpInfo::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                w.write_u1(TAG_DYNAMIC);
                w.write_u2(*bootstrap_method_attr_index);
                w.write_u2(*name_and_type_index);
            }
            CpInfo::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                w.write_u1(TAG_INVOKE_DYNAMIC);
                w.write_u2(*bootstrap_method_attr_index);
                w.write_u2(*name_and_type_index);
            }
            CpInfo::Module { name_index } => {
                w.write_u1(TAG_MODULE);
                w.write_u2(*name_index);
            }
            CpInfo::Package { name_index } => {
                w.write_u1(TAG_PACKAGE);
                w.write_u2(*name_index);
            }
        }
    }
}

/// The constant pool, indexed the way the class file indexes it.
///
/// Slot 0 and the slot following each `Long`/`Double` are unusable and stored
/// as `None`, so `entries[i]` is the entry the class file calls `#i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool<'a> {
    entries: Vec<Option<CpInfo<'a>>>,
}

impl<'a> ConstantPool<'a> {
    pub(crate) fn parse(reader: &mut Reader<'a>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        if count == 0 {
            return Err(Error::InvalidConstantPoolIndex(0));
        }

        let mut entries = Vec::with_capacity(count);
        entries.push(None);
        while entries.len() < count {
            let info = CpInfo::parse(reader)?;
            let wide = info.is_wide();
            entries.push(Some(info));
            if wide {
                if entries.len() >= count {
                    // A wide constant in the last slot would spill past `constant_pool_count`.
                    return Err(Error::InvalidConstantPoolIndex(count as u16));
                }
                entries.push(None);
            }
        }

        let pool = Self { entries };
        pool.validate()?;
        Ok(pool)
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.write_u2(self.entries.len() as u16);
        for info in self.entries.iter().flatten() {
            info.write(w);
        }
    }

    /// `constant_pool_count`: one more than the highest valid index.
    pub fn len(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo<'a>> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::InvalidConstantPoolIndex(index))
    }

    pub fn get_utf8(&self, index: u16) -> Result<Cow<'_, str>> {
        mutf8::decode(self.get_utf8_bytes(index)?)
    }

    pub fn get_utf8_bytes(&self, index: u16) -> Result<&[u8]> {
        match self.get(index)? {
            CpInfo::Utf8(bytes) => Ok(bytes),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Utf8",
                found: other.kind(),
            }),
        }
    }

    pub fn get_class_name(&self, index: u16) -> Result<Cow<'_, str>> {
        match self.get(index)? {
            CpInfo::Class { name_index } => self.get_utf8(*name_index),
            other => Err(Error::ConstantPoolTypeMismatch {
                index,
                expected: "Class",
                found: other.kind(),
            }),
        }
    }

    /// Index of the first `Utf8` entry whose encoded bytes spell `text`.
    pub fn find_utf8(&self, text: &str) -> Option<u16> {
        let encoded = mutf8::encode(text);
        self.entries.iter().enumerate().find_map(|(i, e)| match e {
            Some(CpInfo::Utf8(bytes)) if **bytes == *encoded => Some(i as u16),
            _ => None,
        })
    }

    /// Appends a new `Utf8` entry, leaving every existing index untouched.
    pub fn push_utf8(&mut self, text: &str) -> Result<u16> {
        let encoded = mutf8::encode(text).into_owned();
        if encoded.len() > u16::MAX as usize {
            return Err(Error::Utf8TooLong(encoded.len()));
        }
        // `constant_pool_count` is itself a u2, so the highest usable index is 65534.
        if self.entries.len() >= u16::MAX as usize {
            return Err(Error::ConstantPoolOverflow);
        }
        let index = self.entries.len() as u16;
        self.entries.push(Some(CpInfo::Utf8(Cow::Owned(encoded))));
        Ok(index)
    }

    /// Returns the index of an existing `Utf8` for `text`, appending one if needed.
    pub fn intern_utf8(&mut self, text: &str) -> Result<u16> {
        match self.find_utf8(text) {
            Some(index) => Ok(index),
            None => self.push_utf8(text),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &CpInfo<'a>)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|info| (i as u16, info)))
    }

    fn expect(&self, index: u16, expected: &'static str, ok: fn(&CpInfo<'_>) -> bool) -> Result<()> {
        let info = self.get(index)?;
        if ok(info) {
            Ok(())
        } else {
            Err(Error::ConstantPoolTypeMismatch {
                index,
                expected,
                found: info.kind(),
            })
        }
    }

    fn expect_utf8(&self, index: u16) -> Result<()> {
        self.expect(index, "Utf8", |i| matches!(i, CpInfo::Utf8(_)))
    }

    fn expect_class(&self, index: u16) -> Result<()> {
        self.expect(index, "Class", |i| matches!(i, CpInfo::Class { .. }))
    }

    fn expect_name_and_type(&self, index: u16) -> Result<()> {
        self.expect(index, "NameAndType", |i| matches!(i, CpInfo::NameAndType { .. }))
    }

    /// Checks that every reference inside the pool lands on an entry of the
    /// right kind. Bootstrap method indices point into an attribute and are
    /// not checked here.
    fn validate(&self) -> Result<()> {
        for (index, info) in self.iter() {
            match *info {
                CpInfo::Utf8(_)
                | CpInfo::Integer(_)
                | CpInfo::Float(_)
                | CpInfo::Long(_)
                | CpInfo::Double(_) => {}
                CpInfo::Class { name_index }
                | CpInfo::Module { name_index }
                | CpInfo::Package { name_index } => self.expect_utf8(name_index)?,
                CpInfo::String { string_index } => self.expect_utf8(string_index)?,
                CpInfo::MethodType { descriptor_index } => self.expect_utf8(descriptor_index)?,
                CpInfo::Fieldref {
                    class_index,
                    name_and_type_index,
                }
                | CpInfo::Methodref {
                    class_index,
                    name_and_type_index,
                }
                | CpInfo::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    self.expect_class(class_index)?;
                    self.expect_name_and_type(name_and_type_index)?;
                }
                CpInfo::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    self.expect_utf8(name_index)?;
                    self.expect_utf8(descriptor_index)?;
                }
                CpInfo::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    if !(1..=9).contains(&reference_kind) {
                        return Err(Error::InvalidReferenceKind {
                            index,
                            kind: reference_kind,
                        });
                    }
                    self.expect(reference_index, "member reference", |i| {
                        matches!(
                            i,
                            CpInfo::Fieldref { .. }
                                | CpInfo::Methodref { .. }
                                | CpInfo::InterfaceMethodref { .. }
                        )
                    })?;
                }
                CpInfo::Dynamic {
                    name_and_type_index,
                    ..
                }
                | CpInfo::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => self.expect_name_and_type(name_and_type_index)?,
            }
        }
        Ok(())
    }
}
