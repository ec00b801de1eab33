//! Modified UTF-8, the string encoding used by `CONSTANT_Utf8` entries.
//!
//! It differs from standard UTF-8 in two ways: NUL is encoded as the two-byte
//! sequence `C0 80`, and supplementary characters are encoded as a surrogate
//! pair with each half written as its own three-byte sequence.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Decodes a modified UTF-8 byte string.
///
/// Borrows when the input is plain ASCII. Unpaired surrogates (legal in class
/// files) are replaced with U+FFFD.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if bytes.iter().all(|b| (0x01..0x80).contains(b)) {
        // All bytes are ASCII, which is valid UTF-8.
        return std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|_| Error::InvalidModifiedUtf8);
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(u16::from(b0));
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                units.push((u16::from(b0 & 0x1F) << 6) | u16::from(b1));
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                units.push((u16::from(b0 & 0x0F) << 12) | (u16::from(b1) << 6) | u16::from(b2));
                i += 3;
            }
            _ => return Err(Error::InvalidModifiedUtf8),
        }
    }

    Ok(Cow::Owned(
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
    ))
}

fn continuation(bytes: &[u8], at: usize) -> Result<u8> {
    match bytes.get(at) {
        Some(b) if b & 0xC0 == 0x80 => Ok(b & 0x3F),
        _ => Err(Error::InvalidModifiedUtf8),
    }
}

/// Encodes `text` as modified UTF-8.
pub fn encode(text: &str) -> Cow<'_, [u8]> {
    if text.bytes().all(|b| (0x01..0x80).contains(&b)) {
        return Cow::Borrowed(text.as_bytes());
    }

    let mut out = Vec::with_capacity(text.len() + 8);
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    Cow::Owned(out)
}
