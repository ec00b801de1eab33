//! Lossless reader and writer for JVM class files.
//!
//! [`ClassFile::parse`] validates the structure (magic, version, constant pool
//! references, member and attribute tables) and keeps everything it does not
//! interpret as borrowed raw bytes. [`ClassFile::to_bytes`] writes it back, so
//! `ClassFile::parse(b)?.to_bytes() == b` for every class that parses.

#![forbid(unsafe_code)]

mod classfile;
mod constant_pool;
mod error;
pub mod mutf8;
mod reader;
mod source_location;
mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

pub use crate::classfile::{
    Attribute, ClassFile, Member, MAGIC, MAX_MAJOR_VERSION, MIN_MAJOR_VERSION,
};
pub use crate::constant_pool::{ConstantPool, CpInfo};
pub use crate::error::{Error, Result};
pub use crate::source_location::{SourceLocationUpdate, SOURCE_LOCATION_ATTRIBUTE};
