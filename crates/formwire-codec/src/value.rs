//! Per-type value encoders and decoders.

use std::fmt;
use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};

use crate::field_type::FieldType;

/// Lowest byte allowed in names and text values (space).
pub const PRINTABLE_MIN: u8 = 0x20;

/// Highest byte allowed in names and text values (`~`).
pub const PRINTABLE_MAX: u8 = 0x7E;

/// Returns true if `byte` may appear in a name or text value.
pub fn is_printable(byte: u8) -> bool {
    (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&byte)
}

/// Returns true if every byte of `s` may appear in a name or text value.
///
/// Any non-ASCII character has a byte of at least 0x80, so this also rejects
/// everything outside ASCII.
pub fn is_printable_str(s: &str) -> bool {
    s.bytes().all(is_printable)
}

/// A validated, typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    UInt16(u16),
    Ipv4(Ipv4Addr),
    Ignored,
}

impl FieldValue {
    /// Parse the textual form of a value according to `field_type`.
    ///
    /// Returns `None` if the text does not satisfy the type's syntax or range.
    pub fn parse(field_type: FieldType, src: &str) -> Option<Self> {
        match field_type {
            FieldType::Text => is_printable_str(src).then(|| Self::Text(src.to_string())),
            FieldType::UInt16 => parse_u16(src).map(Self::UInt16),
            FieldType::Ipv4 => parse_ipv4(src).map(Self::Ipv4),
            FieldType::Ignored => Some(Self::Ignored),
        }
    }

    /// Decode the exact value bytes of a field of type `field_type`.
    ///
    /// Fixed-width types require exactly their width; text requires every byte
    /// to be printable.
    pub fn decode(field_type: FieldType, bytes: &[u8]) -> Option<Self> {
        match field_type {
            FieldType::Text => {
                if !bytes.iter().copied().all(is_printable) {
                    return None;
                }
                Some(Self::Text(bytes.iter().map(|&b| b as char).collect()))
            }
            FieldType::UInt16 => {
                let raw: [u8; 2] = bytes.try_into().ok()?;
                Some(Self::UInt16(u16::from_le_bytes(raw)))
            }
            FieldType::Ipv4 => {
                let raw: [u8; 4] = bytes.try_into().ok()?;
                Some(Self::Ipv4(Ipv4Addr::from(raw)))
            }
            FieldType::Ignored => bytes.is_empty().then_some(Self::Ignored),
        }
    }

    /// The type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::UInt16(_) => FieldType::UInt16,
            Self::Ipv4(_) => FieldType::Ipv4,
            Self::Ignored => FieldType::Ignored,
        }
    }

    /// Number of bytes this value occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::UInt16(_) => 2,
            Self::Ipv4(_) => 4,
            Self::Ignored => 0,
        }
    }

    /// Append the wire bytes of this value.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Self::Text(text) => dst.put_slice(text.as_bytes()),
            Self::UInt16(n) => dst.put_u16_le(*n),
            Self::Ipv4(addr) => dst.put_slice(&addr.octets()),
            Self::Ignored => {}
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::UInt16(n) => write!(f, "{n}"),
            Self::Ipv4(addr) => write!(f, "{addr}"),
            Self::Ignored => Ok(()),
        }
    }
}

// Digits only: no sign, no whitespace. Leading zeros are fine.
fn parse_u16(src: &str) -> Option<u16> {
    if src.is_empty() || !src.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    src.parse().ok()
}

// Four dot-separated octets of one to three digits each, every one <= 255.
fn parse_ipv4(src: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = src.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse::<u16>().ok()?.try_into().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}
