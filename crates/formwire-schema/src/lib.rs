//! Declared form schemas for the formwire encoding.
//!
//! The wire format carries no type tags, so both sides need the same list of
//! field names and types. A [`FormSchema`] is that list. It also knows the
//! form-level rules the codec alone cannot check: every field present, no
//! duplicates, text within its declared length.

pub mod config;
pub mod error;
pub mod form;
pub mod schema;
pub mod validator;

pub use config::SchemaConfig;
pub use error::{Result, SchemaError};
pub use form::FormData;
pub use schema::{FieldSpec, FormSchema};
