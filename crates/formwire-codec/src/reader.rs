use tracing::{trace, warn};

use crate::codec::{DecodeConfig, Field, FieldLookup, UnknownFieldPolicy};
use crate::codec::{FIELD_TERMINATOR, NAME_VALUE_SEPARATOR};
use crate::error::{Result, StructuralKind, WireError};
use crate::field_type::FieldType;
use crate::value::FieldValue;

/// Walks a complete message field by field.
///
/// Names and text values never contain the reserved bytes, but fixed-width
/// values can (`65535` encodes as `FF FF`), so the decoder cannot blindly split
/// on them. It reads a name up to the separator, asks the lookup for the
/// field's type, and then consumes exactly that type's width (or, for text, up
/// to the next terminator).
///
/// Yields each field in wire order. The first error ends iteration.
pub struct MessageDecoder<'a, L> {
    buf: &'a [u8],
    pos: usize,
    index: usize,
    lookup: L,
    config: DecodeConfig,
    finished: bool,
}

impl<'a, L: FieldLookup> MessageDecoder<'a, L> {
    /// Create a decoder over `buf`.
    ///
    /// Fails immediately if `buf` exceeds `config.max_message_size`.
    pub fn new(buf: &'a [u8], lookup: L, config: DecodeConfig) -> Result<Self> {
        if buf.len() > config.max_message_size {
            return Err(WireError::structural(
                0,
                None,
                StructuralKind::MessageTooLarge {
                    size: buf.len(),
                    max: config.max_message_size,
                },
            ));
        }

        Ok(Self {
            buf,
            pos: 0,
            index: 0,
            lookup,
            config,
            finished: buf.is_empty(),
        })
    }

    fn next_field(&mut self) -> Result<Option<Field>> {
        while !self.finished {
            let index = self.index;
            self.index += 1;

            let buf = self.buf;
            let rest = &buf[self.pos..];
            let name_end = find_separator(rest, index)?;
            let name = decode_name(&rest[..name_end])?;
            let value_start = name_end + 1;

            let field_type = match self.lookup.field_type(&name) {
                Some(field_type) => field_type,
                None if self.config.unknown_fields == UnknownFieldPolicy::Skip => {
                    let skipped = text_len(&rest[value_start..]);
                    warn!(name = %name, bytes = skipped, "skipping unknown field");
                    self.advance(value_start + skipped, index, &name)?;
                    continue;
                }
                None => return Err(WireError::UnknownField { name }),
            };

            let available = &rest[value_start..];
            let value_len = match field_type.fixed_width() {
                None => text_len(available),
                Some(width) if available.len() < width => {
                    return Err(WireError::structural(
                        index,
                        Some(&name),
                        StructuralKind::TruncatedValue {
                            expected: width,
                            actual: available.len(),
                        },
                    ));
                }
                Some(width) => width,
            };

            let raw = &available[..value_len];
            let value = match FieldValue::decode(field_type, raw) {
                Some(value) => value,
                None => {
                    return Err(WireError::InvalidValueForType {
                        name,
                        field_type,
                        value: String::from_utf8_lossy(raw).into_owned(),
                    })
                }
            };

            trace!(name = %name, field_type = %field_type, bytes = value_len, "field decoded");
            self.advance(value_start + value_len, index, &name)?;
            return Ok(Some(Field::from_value(name, value)));
        }

        Ok(None)
    }

    // Step over a field of `consumed` bytes and the terminator after it.
    fn advance(&mut self, consumed: usize, index: usize, name: &str) -> Result<()> {
        self.pos += consumed;
        match self.buf.get(self.pos) {
            None => self.finished = true,
            Some(&FIELD_TERMINATOR) => self.pos += 1,
            Some(&found) => {
                return Err(WireError::structural(
                    index,
                    Some(name),
                    StructuralKind::ExpectedTerminator { found },
                ))
            }
        }
        Ok(())
    }
}

impl<L: FieldLookup> Iterator for MessageDecoder<'_, L> {
    type Item = Result<Field>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_field() {
            Ok(Some(field)) => Some(Ok(field)),
            Ok(None) => None,
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

// Position of the name/value separator in a field chunk.
fn find_separator(chunk: &[u8], index: usize) -> Result<usize> {
    let kind = match chunk
        .iter()
        .position(|&b| b == NAME_VALUE_SEPARATOR || b == FIELD_TERMINATOR)
    {
        Some(at) if chunk[at] == NAME_VALUE_SEPARATOR => return Ok(at),
        // Empty chunk: the buffer started, ended or doubled up on a terminator.
        Some(0) => StructuralKind::UnexpectedTerminator,
        _ if chunk.is_empty() => StructuralKind::UnexpectedTerminator,
        _ => StructuralKind::MissingSeparator,
    };
    Err(WireError::structural(index, None, kind))
}

fn decode_name(raw: &[u8]) -> Result<String> {
    match FieldValue::decode(FieldType::Text, raw) {
        Some(FieldValue::Text(name)) => Ok(name),
        _ => Err(WireError::InvalidFieldName {
            name: String::from_utf8_lossy(raw).into_owned(),
        }),
    }
}

fn text_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| b == FIELD_TERMINATOR)
        .unwrap_or(bytes.len())
}
