use std::fmt;

use crate::field_type::FieldType;

/// Errors that can occur during message encoding/decoding.
///
/// Every variant that can be tied to a field carries its name, and value
/// failures carry the raw value, so callers can tell the user exactly which
/// input was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The field name contains a byte outside the printable ASCII range.
    #[error("cannot encode name {name:?}: names must be printable ASCII")]
    InvalidFieldName { name: String },

    /// The value failed its type's syntax or range check.
    #[error("invalid {field_type} value {value:?} in field {name:?}")]
    InvalidValueForType {
        name: String,
        field_type: FieldType,
        value: String,
    },

    /// The buffer does not follow the message grammar.
    #[error("malformed message at field #{index}{}: {kind}", DisplayName(.name))]
    StructuralDecode {
        index: usize,
        name: Option<String>,
        kind: StructuralKind,
    },

    /// The buffer names a field the schema does not declare.
    #[error("unknown field {name:?}")]
    UnknownField { name: String },
}

/// What exactly was wrong with the structure of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    /// A field chunk ended before its name/value separator.
    MissingSeparator,
    /// A terminator appeared where a field was expected (leading, trailing or doubled).
    UnexpectedTerminator,
    /// A fixed-width value had fewer bytes than its type requires.
    TruncatedValue { expected: usize, actual: usize },
    /// A value was followed by something other than a terminator.
    ExpectedTerminator { found: u8 },
    /// The buffer exceeds the configured maximum size.
    MessageTooLarge { size: usize, max: usize },
}

impl fmt::Display for StructuralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => f.write_str("missing name/value separator"),
            Self::UnexpectedTerminator => f.write_str("unexpected field terminator"),
            Self::TruncatedValue { expected, actual } => {
                write!(f, "truncated value ({actual} bytes, expected {expected})")
            }
            Self::ExpectedTerminator { found } => {
                write!(f, "expected field terminator, found byte 0x{found:02X}")
            }
            Self::MessageTooLarge { size, max } => {
                write!(f, "message too large ({size} bytes, max {max})")
            }
        }
    }
}

struct DisplayName<'a>(&'a Option<String>);

impl fmt::Display for DisplayName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(name) => write!(f, " ({name:?})"),
            None => Ok(()),
        }
    }
}

impl WireError {
    /// Name of the field the error is about, when known.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::InvalidFieldName { name }
            | Self::InvalidValueForType { name, .. }
            | Self::UnknownField { name } => Some(name),
            Self::StructuralDecode { name, .. } => name.as_deref(),
        }
    }

    pub(crate) fn structural(index: usize, name: Option<&str>, kind: StructuralKind) -> Self {
        Self::StructuralDecode {
            index,
            name: name.map(str::to_owned),
            kind,
        }
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
