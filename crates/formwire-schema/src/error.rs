use formwire_codec::WireError;

/// Errors that can occur while loading a schema or applying it to a form.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema file is not valid JSON or does not have the expected shape.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The schema declares something impossible.
    #[error("invalid schema: {0}")]
    InvalidDefinition(String),

    /// A field failed to encode or decode.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A declared field is absent from the form.
    #[error("missing field {0:?}")]
    MissingField(String),

    /// A field appears more than once.
    #[error("duplicate field {0:?}")]
    DuplicateField(String),

    /// A text value exceeds its declared maximum length.
    #[error("value of field {name:?} too long ({len} bytes, max {max})")]
    ValueTooLong { name: String, len: usize, max: usize },
}

impl SchemaError {
    /// Name of the field the error is about, when known.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Wire(err) => err.field_name(),
            Self::MissingField(name) | Self::DuplicateField(name) => Some(name),
            Self::ValueTooLong { name, .. } => Some(name),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
