use std::collections::HashSet;

use formwire_codec::Field;

use crate::error::{Result, SchemaError};
use crate::schema::{FieldSpec, FormSchema};

/// Check a text value against its declared maximum length.
pub(crate) fn check_length(spec: &FieldSpec, value: &str) -> Result<()> {
    match spec.max_len {
        Some(max) if value.len() > max => Err(SchemaError::ValueTooLong {
            name: spec.name.clone(),
            len: value.len(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Form-level checks on a decoded field list.
pub(crate) fn validate_form(schema: &FormSchema, fields: &[Field]) -> Result<()> {
    let config = schema.config();
    let mut seen = HashSet::with_capacity(fields.len());

    for field in fields {
        if !seen.insert(field.name.as_str()) && config.reject_duplicates {
            return Err(SchemaError::DuplicateField(field.name.clone()));
        }
        if let Some(spec) = schema.field(&field.name) {
            check_length(spec, &field.value)?;
        }
    }

    if config.require_all_fields {
        let missing = schema
            .fields()
            .iter()
            .find(|spec| !seen.contains(spec.name.as_str()));
        if let Some(missing) = missing {
            return Err(SchemaError::MissingField(missing.name.clone()));
        }
    }

    Ok(())
}
