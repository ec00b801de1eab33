//! The `SourceLocation` class attribute.
//!
//! Layout:
//!
//! ```text
//! SourceLocation_attribute {
//!     u2 attribute_name_index;   // CONSTANT_Utf8 "SourceLocation"
//!     u4 attribute_length;       // always 2
//!     u2 location_index;         // CONSTANT_Utf8 with the source path
//! }
//! ```
//!
//! A class carries at most one. The JVM ignores attributes it does not know, so
//! the class stays loadable; debuggers read it back through JDWP's class file
//! access or from the class bytes directly.

use std::borrow::Cow;

use crate::classfile::{u2_payload, Attribute, ClassFile};
use crate::error::{Error, Result};
use crate::mutf8;

pub const SOURCE_LOCATION_ATTRIBUTE: &str = "SourceLocation";

/// What [`ClassFile::set_source_location`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLocationUpdate {
    /// The class already carried exactly this location.
    Unchanged,
    /// No attribute existed; one was appended to the class attributes.
    Inserted,
    /// An existing attribute pointed elsewhere (or was malformed) and was rewritten.
    Replaced,
}

impl<'a> ClassFile<'a> {
    /// Reads the `SourceLocation` attribute.
    ///
    /// Fails when the class carries more than one or the payload is malformed.
    pub fn source_location(&self) -> Result<Option<Cow<'_, str>>> {
        let mut found = self.attributes_named(SOURCE_LOCATION_ATTRIBUTE);
        let Some((_, attr)) = found.next() else {
            return Ok(None);
        };
        if found.next().is_some() {
            return Err(Error::MalformedAttribute(SOURCE_LOCATION_ATTRIBUTE));
        }
        let index = u2_payload(attr).ok_or(Error::MalformedAttribute(SOURCE_LOCATION_ATTRIBUTE))?;
        self.constant_pool.get_utf8(index).map(Some)
    }

    /// Makes `path` the class's source location.
    ///
    /// New constants are appended to the pool so existing indices, and with
    /// them every member and attribute payload, stay valid and byte-identical.
    /// Duplicate `SourceLocation` attributes are collapsed into the first one.
    pub fn set_source_location(&mut self, path: &str) -> Result<SourceLocationUpdate> {
        let positions: Vec<usize> = self
            .attributes_named(SOURCE_LOCATION_ATTRIBUTE)
            .map(|(i, _)| i)
            .collect();

        if let [only] = positions.as_slice() {
            if self.points_at(&self.attributes[*only], path) {
                return Ok(SourceLocationUpdate::Unchanged);
            }
        }

        // `attributes_count` is a u2.
        if positions.is_empty() && self.attributes.len() >= u16::MAX as usize {
            return Err(Error::AttributeTableFull);
        }

        let value_index = self.constant_pool.intern_utf8(path)?;
        let payload = value_index.to_be_bytes().to_vec();

        match positions.split_first() {
            None => {
                let name_index = self.constant_pool.intern_utf8(SOURCE_LOCATION_ATTRIBUTE)?;
                self.attributes.push(Attribute::new(name_index, payload));
                Ok(SourceLocationUpdate::Inserted)
            }
            Some((&first, rest)) => {
                self.attributes[first].info = Cow::Owned(payload);
                // Remove back to front so earlier positions stay valid.
                for &extra in rest.iter().rev() {
                    self.attributes.remove(extra);
                }
                Ok(SourceLocationUpdate::Replaced)
            }
        }
    }

    fn points_at(&self, attr: &Attribute<'_>, path: &str) -> bool {
        let Some(index) = u2_payload(attr) else {
            return false;
        };
        match self.constant_pool.get_utf8_bytes(index) {
            Ok(bytes) => *bytes == *mutf8::encode(path),
            Err(_) => false,
        }
    }
}
