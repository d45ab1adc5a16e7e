//! Compact binary encoding for typed form fields.
//!
//! A message is a flat byte buffer of `name 0xFF value` pairs separated by
//! `0xFE`:
//! - Names and text values are restricted to printable ASCII (`0x20..=0x7E`),
//!   so they can never be mistaken for a delimiter
//! - Fixed-width values (u16, IPv4) have a known length and are read by width
//! - Field types are agreed out of band through a [`FieldLookup`]
//!
//! Encoding is all-or-nothing: the first bad field aborts the message.

pub mod codec;
pub mod error;
pub mod field_type;
pub mod reader;
pub mod value;
pub mod writer;

pub use codec::{
    decode_message, encode_field, encode_message, DecodeConfig, Field, FieldLookup,
    UnknownFieldPolicy, DEFAULT_MAX_MESSAGE, FIELD_TERMINATOR, NAME_VALUE_SEPARATOR,
};
pub use error::{Result, StructuralKind, WireError};
pub use field_type::{FieldType, UnknownFieldType};
pub use reader::MessageDecoder;
pub use value::{is_printable, is_printable_str, FieldValue, PRINTABLE_MAX, PRINTABLE_MIN};
pub use writer::MessageEncoder;
