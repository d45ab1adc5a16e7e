use std::collections::{BTreeMap, HashMap};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::field_type::FieldType;
use crate::reader::MessageDecoder;
use crate::value::{is_printable_str, FieldValue};
use crate::writer::MessageEncoder;

/// Byte that ends a field (never the last byte of a message).
pub const FIELD_TERMINATOR: u8 = 0xFE;

/// Byte that separates a field name from its value.
pub const NAME_VALUE_SEPARATOR: u8 = 0xFF;

/// Default decode size cap: 64 KiB.
pub const DEFAULT_MAX_MESSAGE: usize = 64 * 1024;

/// A named field with its value in textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name, printable ASCII.
    pub name: String,
    /// How the value is encoded.
    pub field_type: FieldType,
    /// Value as the user typed it (or its canonical form after decoding).
    pub value: String,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, field_type: FieldType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            value: value.into(),
        }
    }

    /// Shorthand for a text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text, value)
    }

    /// Parse the value according to the field type.
    pub fn typed_value(&self) -> Result<FieldValue> {
        FieldValue::parse(self.field_type, &self.value).ok_or_else(|| {
            WireError::InvalidValueForType {
                name: self.name.clone(),
                field_type: self.field_type,
                value: self.value.clone(),
            }
        })
    }

    pub(crate) fn from_value(name: String, value: FieldValue) -> Self {
        Self {
            name,
            field_type: value.field_type(),
            value: value.to_string(),
        }
    }
}

/// Resolves a field name to the type both sides agreed on.
pub trait FieldLookup {
    /// The declared type of `name`, or `None` if the name is not declared.
    fn field_type(&self, name: &str) -> Option<FieldType>;
}

impl<L: FieldLookup + ?Sized> FieldLookup for &L {
    fn field_type(&self, name: &str) -> Option<FieldType> {
        (**self).field_type(name)
    }
}

impl<S: std::hash::BuildHasher> FieldLookup for HashMap<String, FieldType, S> {
    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.get(name).copied()
    }
}

impl FieldLookup for BTreeMap<String, FieldType> {
    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.get(name).copied()
    }
}

impl FieldLookup for [(&str, FieldType)] {
    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.iter()
            .find(|(declared, _)| *declared == name)
            .map(|(_, field_type)| *field_type)
    }
}

impl<const N: usize> FieldLookup for [(&str, FieldType); N] {
    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.as_slice().field_type(name)
    }
}

/// What the decoder does with a field name the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Fail with [`WireError::UnknownField`].
    #[default]
    Reject,
    /// Skip the value up to the next terminator and keep going.
    Skip,
}

/// Configuration for the message decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Handling of names missing from the schema. Default: reject.
    pub unknown_fields: UnknownFieldPolicy,
    /// Largest buffer accepted, in bytes. Default: 64 KiB.
    pub max_message_size: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Reject,
            max_message_size: DEFAULT_MAX_MESSAGE,
        }
    }
}

/// Encode a single field (`name 0xFF value`) onto `dst`.
///
/// On failure `dst` may hold a partial field; use [`MessageEncoder`] or
/// [`encode_message`] when that must not be observable.
pub fn encode_field(field: &Field, dst: &mut BytesMut) -> Result<()> {
    if !is_printable_str(&field.name) {
        return Err(WireError::InvalidFieldName {
            name: field.name.clone(),
        });
    }
    let value = field.typed_value()?;

    dst.reserve(field.name.len() + 1 + value.encoded_len());
    dst.put_slice(field.name.as_bytes());
    dst.put_u8(NAME_VALUE_SEPARATOR);
    value.encode(dst);
    Ok(())
}

/// Encode an ordered field list into a complete message.
///
/// Wire format:
/// ```text
/// message := field (0xFE field)*      empty list -> empty buffer
/// field   := name 0xFF value
/// ```
///
/// Stops at the first field that fails; no buffer is returned in that case.
pub fn encode_message<'a, I>(fields: I) -> Result<Bytes>
where
    I: IntoIterator<Item = &'a Field>,
{
    let mut encoder = MessageEncoder::new();
    for field in fields {
        encoder.push(field)?;
    }
    Ok(encoder.finish())
}

/// Decode a complete message, resolving field types through `lookup`.
pub fn decode_message<L: FieldLookup>(
    buf: &[u8],
    lookup: &L,
    config: &DecodeConfig,
) -> Result<Vec<Field>> {
    MessageDecoder::new(buf, lookup, *config)?.collect()
}
