//! Compact, type-checked binary encoding for form submissions.
//!
//! formwire replaces URL-encoded form bodies with a flat binary message:
//! printable-ASCII names, typed values, and two reserved delimiter bytes.
//!
//! # Crate Structure
//!
//! - [`codec`]: Wire format: field types, encoder, decoder
//! - [`schema`]: Declared forms: field lists, JSON loading, form-level checks
//! - [`submit`]: Handing an encoded form to an HTTP transport

/// Re-export codec types.
pub mod codec {
    pub use formwire_codec::*;
}

/// Re-export schema types.
pub mod schema {
    pub use formwire_schema::*;
}

pub mod submit;

pub use formwire_codec::{Field, FieldType, FieldValue, WireError};
pub use formwire_schema::{FieldSpec, FormData, FormSchema, SchemaConfig, SchemaError};
pub use submit::{submit, Request, Response, SubmitError, SubmitOutcome, Transport};
