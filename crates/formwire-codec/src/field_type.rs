//! The closed set of field types.
//!
//! Types never travel on the wire; both sides agree on them through a schema.
//! The short tags (`txt`, `u16`, `ipv4`, `ign`) are what schema files and the
//! CLI use to name them.

use std::fmt;
use std::str::FromStr;

/// How a field's value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Printable ASCII text, one byte per character.
    Text,
    /// Decimal integer in `[0, 65535]`, two bytes little-endian.
    UInt16,
    /// Dotted-quad address, four bytes in address order.
    Ipv4,
    /// Present in the form, carries no payload.
    Ignored,
}

impl FieldType {
    /// All field types, in tag order.
    pub const ALL: [FieldType; 4] = [Self::Text, Self::UInt16, Self::Ipv4, Self::Ignored];

    /// Short tag used in schema files.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::UInt16 => "u16",
            Self::Ipv4 => "ipv4",
            Self::Ignored => "ign",
        }
    }

    /// Number of value bytes for fixed-width types, `None` for Text.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Text => None,
            Self::UInt16 => Some(2),
            Self::Ipv4 => Some(4),
            Self::Ignored => Some(0),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when a type tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type {0:?} (expected one of txt, u16, ipv4, ign)")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" | "password" => Ok(Self::Text),
            "u16" | "uint16" | "port" => Ok(Self::UInt16),
            "ipv4" | "ip" => Ok(Self::Ipv4),
            "ign" | "ignored" | "button" => Ok(Self::Ignored),
            _ => Err(UnknownFieldType(s.to_string())),
        }
    }
}
