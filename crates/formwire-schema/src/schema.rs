use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use formwire_codec::{
    decode_message, is_printable_str, DecodeConfig, Field, FieldLookup, FieldType,
    MessageEncoder, UnknownFieldPolicy, WireError, DEFAULT_MAX_MESSAGE,
};
use serde::Deserialize;
use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{Result, SchemaError};
use crate::form::FormData;
use crate::validator::{check_length, validate_form};

/// One declared form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name as it appears on the wire.
    pub name: String,
    /// Encoding of the value.
    pub field_type: FieldType,
    /// Longest accepted text value, in bytes. Text only.
    pub max_len: Option<usize>,
    /// Human-readable label.
    pub title: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            max_len: None,
            title: None,
        }
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Upper bound on the encoded value size, `None` for unbounded text.
    pub fn max_value_bytes(&self) -> Option<usize> {
        match self.field_type {
            FieldType::Text => self.max_len,
            other => other.fixed_width(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default)]
    title: Option<String>,
    fields: Vec<FieldSpecFile>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldSpecFile {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    max_len: Option<usize>,
    #[serde(default)]
    title: Option<String>,
}

/// Ordered field declarations shared by encoder and decoder.
#[derive(Debug, Clone)]
pub struct FormSchema {
    title: Option<String>,
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
    config: SchemaConfig,
}

impl FormSchema {
    /// Build a schema with default config.
    pub fn new(fields: impl IntoIterator<Item = FieldSpec>) -> Result<Self> {
        Self::with_config(fields, SchemaConfig::default())
    }

    /// Build a schema with explicit config.
    pub fn with_config(
        fields: impl IntoIterator<Item = FieldSpec>,
        config: SchemaConfig,
    ) -> Result<Self> {
        let fields: Vec<FieldSpec> = fields.into_iter().collect();
        let mut index = HashMap::with_capacity(fields.len());

        for (position, spec) in fields.iter().enumerate() {
            if spec.name.is_empty() || !is_printable_str(&spec.name) {
                return Err(SchemaError::InvalidDefinition(format!(
                    "field name {:?} must be non-empty printable ASCII",
                    spec.name
                )));
            }
            if spec.max_len.is_some() && spec.field_type != FieldType::Text {
                return Err(SchemaError::InvalidDefinition(format!(
                    "field {:?}: max_len only applies to text fields",
                    spec.name
                )));
            }
            if index.insert(spec.name.clone(), position).is_some() {
                return Err(SchemaError::InvalidDefinition(format!(
                    "field {:?} declared twice",
                    spec.name
                )));
            }
        }

        Ok(Self {
            title: None,
            fields,
            index,
            config,
        })
    }

    /// Parse a schema from JSON with default config.
    ///
    /// ```json
    /// { "title": "Networking",
    ///   "fields": [ { "name": "ip", "type": "ipv4", "title": "IP-Address:" },
    ///               { "name": "ssid", "type": "txt", "max_len": 32 } ] }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_str_with_config(json, SchemaConfig::default())
    }

    /// Parse a schema from JSON with explicit config.
    pub fn from_json_str_with_config(json: &str, config: SchemaConfig) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(json)?;

        let mut specs = Vec::with_capacity(file.fields.len());
        for entry in file.fields {
            let field_type: FieldType = entry
                .field_type
                .parse()
                .map_err(|err| SchemaError::InvalidDefinition(format!("{}: {err}", entry.name)))?;
            specs.push(FieldSpec {
                name: entry.name,
                field_type,
                max_len: entry.max_len,
                title: entry.title,
            });
        }

        let mut schema = Self::with_config(specs, config)?;
        schema.title = file.title;
        debug!(
            title = schema.title.as_deref().unwrap_or(""),
            fields = schema.fields.len(),
            "loaded form schema"
        );
        Ok(schema)
    }

    /// Load a schema file with default config.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, SchemaConfig::default())
    }

    /// Load a schema file with explicit config.
    pub fn from_file_with_config(path: &Path, config: SchemaConfig) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        let max_bytes = config.max_schema_file_size;
        if metadata.len() > max_bytes as u64 {
            return Err(SchemaError::LoadFailed(format!(
                "schema file too large ({} bytes, max {max_bytes}): {}",
                metadata.len(),
                path.display()
            )));
        }

        let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > max_bytes {
            return Err(SchemaError::LoadFailed(format!(
                "schema file too large while reading: {}",
                path.display()
            )));
        }

        Self::from_json_str_with_config(&content, config)
    }

    /// Set the form title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Declaration for `name`.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&position| &self.fields[position])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Size of the largest message a complete, valid form can produce.
    ///
    /// Each field contributes its name, a separator and its largest value;
    /// fields are joined by one terminator each. `None` if any text field has
    /// no `max_len` or the bound does not fit in `usize`.
    pub fn max_message_size(&self) -> Option<usize> {
        let mut total = self.fields.len().saturating_sub(1);
        for spec in &self.fields {
            total = total
                .checked_add(spec.name.len())?
                .checked_add(1)?
                .checked_add(spec.max_value_bytes()?)?;
        }
        Some(total)
    }

    /// Decoder settings derived from this schema.
    ///
    /// The size cap never drops below [`DEFAULT_MAX_MESSAGE`]; it rises to the
    /// schema's own bound when unknown and repeated fields are both rejected.
    /// Per-field limits are checked after decoding.
    pub fn decode_config(&self) -> DecodeConfig {
        let strict = self.config.unknown_fields == UnknownFieldPolicy::Reject
            && self.config.reject_duplicates;
        let max_message_size = match self.max_message_size() {
            Some(max) if strict => max.max(DEFAULT_MAX_MESSAGE),
            _ => DEFAULT_MAX_MESSAGE,
        };
        DecodeConfig {
            unknown_fields: self.config.unknown_fields,
            max_message_size,
        }
    }

    /// Encode a submitted form.
    ///
    /// `values` are `(name, value)` pairs in any order; the message lists them
    /// in declaration order.
    pub fn encode<I, K, V>(&self, values: I) -> Result<Bytes>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let values: Vec<(K, V)> = values.into_iter().collect();
        let mut submitted: HashMap<&str, &str> = HashMap::with_capacity(values.len());

        for (name, value) in &values {
            let name = name.as_ref();
            if !self.index.contains_key(name) {
                if self.config.unknown_fields == UnknownFieldPolicy::Reject {
                    return Err(WireError::UnknownField {
                        name: name.to_string(),
                    }
                    .into());
                }
                debug!(name, "dropping undeclared field");
                continue;
            }
            if submitted.insert(name, value.as_ref()).is_some() && self.config.reject_duplicates {
                return Err(SchemaError::DuplicateField(name.to_string()));
            }
        }

        let capacity = self
            .max_message_size()
            .unwrap_or(256)
            .min(DEFAULT_MAX_MESSAGE);
        let mut encoder = MessageEncoder::with_capacity(capacity);
        for spec in &self.fields {
            let value = match submitted.get(spec.name.as_str()) {
                Some(value) => *value,
                None if self.config.require_all_fields => {
                    return Err(SchemaError::MissingField(spec.name.clone()));
                }
                None => continue,
            };
            check_length(spec, value)?;
            encoder.push(&Field::new(spec.name.clone(), spec.field_type, value))?;
        }

        debug!(fields = encoder.field_count(), bytes = encoder.len(), "form encoded");
        Ok(encoder.finish())
    }

    /// Decode and validate a submitted message.
    pub fn decode(&self, buf: &[u8]) -> Result<FormData> {
        let fields = decode_message(buf, self, &self.decode_config())?;
        validate_form(self, &fields)?;
        debug!(fields = fields.len(), bytes = buf.len(), "form decoded");
        Ok(FormData::new(fields))
    }
}

impl FieldLookup for FormSchema {
    fn field_type(&self, name: &str) -> Option<FieldType> {
        self.field(name).map(|spec| spec.field_type)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use formwire_codec::{FieldValue, StructuralKind};

    use super::*;

    const NETWORKING: &str = r#"{
        "title": "Networking",
        "fields": [
            { "name": "ip", "type": "ipv4", "title": "IP-Address:" },
            { "name": "nm", "type": "ipv4", "title": "Netmask:" },
            { "name": "gw", "type": "ipv4", "title": "Gateway:" },
            { "name": "port", "type": "u16", "title": "Port:" }
        ]
    }"#;

    fn wifi() -> FormSchema {
        FormSchema::new([
            FieldSpec::new("ssid", FieldType::Text).with_max_len(32),
            FieldSpec::new("pw", FieldType::Text).with_max_len(64),
            FieldSpec::new("save", FieldType::Ignored),
        ])
        .unwrap()
    }

    #[test]
    fn json_schema_loads_in_order() {
        let schema = FormSchema::from_json_str(NETWORKING).unwrap();
        assert_eq!(schema.title(), Some("Networking"));
        assert_eq!(schema.len(), 4);
        assert_eq!(
            schema.fields().iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            ["ip", "nm", "gw", "port"]
        );
        assert_eq!(schema.field("port").unwrap().field_type, FieldType::UInt16);
        assert_eq!(schema.field("gw").unwrap().title.as_deref(), Some("Gateway:"));
    }

    #[test]
    fn max_message_size_sums_fields() {
        let schema = FormSchema::from_json_str(NETWORKING).unwrap();
        // 3 x (2 + 1 + 4) + (4 + 1 + 2) + 3 terminators
        assert_eq!(schema.max_message_size(), Some(31));

        // 4 + 1 + 32, 2 + 1 + 64, 4 + 1 + 0, 2 terminators
        assert_eq!(wifi().max_message_size(), Some(111));

        let unbounded = FormSchema::new([FieldSpec::new("note", FieldType::Text)]).unwrap();
        assert_eq!(unbounded.max_message_size(), None);
        assert_eq!(FormSchema::new([]).unwrap().max_message_size(), Some(0));
    }

    #[test]
    fn invalid_definitions_are_rejected() {
        let cases = [
            vec![FieldSpec::new("", FieldType::Text)],
            vec![FieldSpec::new("tab\there", FieldType::Text)],
            vec![FieldSpec::new("port", FieldType::UInt16).with_max_len(2)],
            vec![
                FieldSpec::new("a", FieldType::Text),
                FieldSpec::new("a", FieldType::Ipv4),
            ],
        ];
        for fields in cases {
            assert!(matches!(
                FormSchema::new(fields),
                Err(SchemaError::InvalidDefinition(_))
            ));
        }
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let err = FormSchema::from_json_str(r#"{"fields":[{"name":"x","type":"f64"}]}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            FormSchema::from_json_str("{"),
            Err(SchemaError::InvalidJson(_))
        ));
        assert!(matches!(
            FormSchema::from_json_str(r#"{"fields":[],"extra":1}"#),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn encode_follows_declaration_order() {
        let schema = FormSchema::from_json_str(NETWORKING).unwrap();
        let buf = schema
            .encode([
                ("port", "80"),
                ("gw", "10.0.0.1"),
                ("ip", "10.0.0.2"),
                ("nm", "255.255.255.0"),
            ])
            .unwrap();
        assert_eq!(
            buf.as_ref(),
            b"ip\xFF\x0A\x00\x00\x02\xFEnm\xFF\xFF\xFF\xFF\x00\xFEgw\xFF\x0A\x00\x00\x01\xFEport\xFF\x50\x00"
        );
        assert!(buf.len() <= schema.max_message_size().unwrap());
    }

    #[test]
    fn encode_then_decode() {
        let schema = wifi();
        let buf = schema
            .encode([("ssid", "home"), ("pw", "hunter2"), ("save", "Save")])
            .unwrap();
        let form = schema.decode(&buf).unwrap();

        assert_eq!(form.len(), 3);
        assert_eq!(form.value("ssid"), Some(FieldValue::Text("home".into())));
        assert_eq!(form.value("pw"), Some(FieldValue::Text("hunter2".into())));
        assert_eq!(form.value("save"), Some(FieldValue::Ignored));
    }

    #[test]
    fn encode_rejects_undeclared_field() {
        let err = wifi()
            .encode([("ssid", "a"), ("pw", "b"), ("save", ""), ("admin", "1")])
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::Wire(WireError::UnknownField { ref name }) if name == "admin"
        ));
    }

    #[test]
    fn permissive_encode_drops_undeclared_and_absent_fields() {
        let schema = FormSchema::with_config(
            [
                FieldSpec::new("ssid", FieldType::Text),
                FieldSpec::new("pw", FieldType::Text),
            ],
            SchemaConfig::permissive(),
        )
        .unwrap();
        let buf = schema.encode([("admin", "1"), ("ssid", "x")]).unwrap();
        assert_eq!(buf.as_ref(), b"ssid\xFFx");
    }

    #[test]
    fn encode_requires_every_field() {
        let err = wifi().encode([("ssid", "a"), ("pw", "b")]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField(ref name) if name == "save"));
    }

    #[test]
    fn encode_enforces_max_len() {
        let long = "x".repeat(33);
        let err = wifi()
            .encode([("ssid", long.as_str()), ("pw", "b"), ("save", "")])
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ValueTooLong { len: 33, max: 32, .. }
        ));
        assert_eq!(err.field_name(), Some("ssid"));
    }

    #[test]
    fn encode_rejects_repeated_submission() {
        let err = wifi()
            .encode([("ssid", "a"), ("ssid", "b"), ("pw", "c"), ("save", "")])
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField(_)));
    }

    #[test]
    fn encode_reports_type_errors_with_field() {
        let schema = FormSchema::from_json_str(NETWORKING).unwrap();
        let err = schema
            .encode([
                ("ip", "10.0.0.2"),
                ("nm", "255.255.255.0"),
                ("gw", "10.0.0"),
                ("port", "80"),
            ])
            .unwrap_err();
        assert_eq!(err.field_name(), Some("gw"));
        assert!(matches!(
            err,
            SchemaError::Wire(WireError::InvalidValueForType { .. })
        ));
    }

    #[test]
    fn decode_rejects_duplicates_and_missing() {
        let schema = wifi();
        assert!(matches!(
            schema.decode(b"ssid\xFFa\xFEssid\xFFb\xFEpw\xFFc\xFEsave\xFF"),
            Err(SchemaError::DuplicateField(_))
        ));
        assert!(matches!(
            schema.decode(b"ssid\xFFa\xFEsave\xFF"),
            Err(SchemaError::MissingField(ref name)) if name == "pw"
        ));
    }

    #[test]
    fn decode_enforces_max_len() {
        let schema = FormSchema::new([
            FieldSpec::new("ssid", FieldType::Text).with_max_len(4),
            FieldSpec::new("port", FieldType::UInt16),
        ])
        .unwrap();
        // Longer than the schema bound of 17 bytes; reported against the field.
        let err = schema.decode(b"ssid\xFF123456\xFEport\xFF\x01\x00").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ValueTooLong { len: 6, max: 4, .. }
        ));
        assert_eq!(err.field_name(), Some("ssid"));

        let permissive = FormSchema::with_config(
            schema.fields().to_vec(),
            SchemaConfig {
                unknown_fields: UnknownFieldPolicy::Skip,
                ..SchemaConfig::default()
            },
        )
        .unwrap();
        assert!(matches!(
            permissive.decode(b"ssid\xFF12345\xFEport\xFF\x01\x00"),
            Err(SchemaError::ValueTooLong { len: 5, max: 4, .. })
        ));
    }

    #[test]
    fn decode_rejects_oversized_message() {
        let schema = FormSchema::from_json_str(NETWORKING).unwrap();
        assert_eq!(schema.decode_config().max_message_size, DEFAULT_MAX_MESSAGE);

        let oversized = vec![b'a'; DEFAULT_MAX_MESSAGE + 1];
        assert!(matches!(
            schema.decode(&oversized),
            Err(SchemaError::Wire(WireError::StructuralDecode {
                kind: StructuralKind::MessageTooLarge { max: DEFAULT_MAX_MESSAGE, .. },
                ..
            }))
        ));
    }

    #[test]
    fn large_schema_bound_raises_decode_cap() {
        let schema = FormSchema::new([
            FieldSpec::new("blob", FieldType::Text).with_max_len(DEFAULT_MAX_MESSAGE * 2),
        ])
        .unwrap();
        assert_eq!(
            schema.decode_config().max_message_size,
            DEFAULT_MAX_MESSAGE * 2 + 5
        );

        let value = "x".repeat(DEFAULT_MAX_MESSAGE + 10);
        let buf = schema.encode([("blob", value.as_str())]).unwrap();
        assert_eq!(schema.decode(&buf).unwrap().len(), 1);
    }

    #[test]
    fn overflowing_bound_falls_back_to_default_cap() {
        let schema = FormSchema::from_json_str(
            r#"{"fields":[
                {"name":"a","type":"txt","max_len":18446744073709551615},
                {"name":"b","type":"u16"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(schema.max_message_size(), None);
        assert_eq!(schema.decode_config().max_message_size, DEFAULT_MAX_MESSAGE);

        let form = schema.decode(b"a\xFFx\xFEb\xFF\x01\x00").unwrap();
        assert_eq!(form.value("b"), Some(FieldValue::UInt16(1)));
    }

    #[test]
    fn duplicates_allowed_are_not_capped_by_schema_bound() {
        let schema = FormSchema::with_config(
            [FieldSpec::new("p", FieldType::UInt16)],
            SchemaConfig {
                reject_duplicates: false,
                ..SchemaConfig::default()
            },
        )
        .unwrap();
        assert_eq!(schema.max_message_size(), Some(4));
        assert_eq!(schema.decode_config().max_message_size, DEFAULT_MAX_MESSAGE);

        let form = schema.decode(b"p\xFF\x01\x00\xFEp\xFF\x02\x00").unwrap();
        assert_eq!(form.len(), 2);
        assert_eq!(
            form.iter().map(|f| f.value.as_str()).collect::<Vec<_>>(),
            ["1", "2"]
        );
    }

    #[test]
    fn permissive_decode_skips_unknown_fields() {
        let schema = FormSchema::with_config(
            [FieldSpec::new("ssid", FieldType::Text)],
            SchemaConfig::permissive(),
        )
        .unwrap();
        let form = schema.decode(b"copy\xFF\xFEssid\xFFnet").unwrap();
        assert_eq!(form.into_fields(), vec![Field::text("ssid", "net")]);
    }

    #[test]
    fn from_file_loads_and_enforces_size_cap() {
        let dir = make_temp_schema_dir("from-file");
        let path = dir.join("networking.json");
        std::fs::write(&path, NETWORKING).unwrap();

        let schema = FormSchema::from_file(&path).unwrap();
        assert_eq!(schema.len(), 4);

        let tiny = SchemaConfig {
            max_schema_file_size: 16,
            ..SchemaConfig::default()
        };
        assert!(matches!(
            FormSchema::from_file_with_config(&path, tiny),
            Err(SchemaError::LoadFailed(_))
        ));

        assert!(matches!(
            FormSchema::from_file(&dir.join("missing.json")),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "formwire-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
