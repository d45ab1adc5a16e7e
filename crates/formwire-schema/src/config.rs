use formwire_codec::UnknownFieldPolicy;

/// Controls how strictly a schema is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Names the schema does not declare: reject, or drop and carry on.
    pub unknown_fields: UnknownFieldPolicy,
    /// When true, every declared field must be present.
    pub require_all_fields: bool,
    /// When true, a decoded form may not repeat a field name.
    pub reject_duplicates: bool,
    /// Maximum bytes allowed in a schema file.
    pub max_schema_file_size: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Reject,
            require_all_fields: true,
            reject_duplicates: true,
            max_schema_file_size: 64 * 1024,
        }
    }
}

impl SchemaConfig {
    /// Lenient settings: skip unknown names, allow absent fields.
    pub fn permissive() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Skip,
            require_all_fields: false,
            ..Self::default()
        }
    }
}
