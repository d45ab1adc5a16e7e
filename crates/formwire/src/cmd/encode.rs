use std::fs;

use bytes::Bytes;
use formwire_codec::{decode_message, DecodeConfig};
use formwire_schema::FormSchema;
use serde::Serialize;

use crate::cmd::{load_schema, EncodeArgs};
use crate::exit::{io_error, schema_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{hex, print_json, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    size: usize,
    fields: usize,
    hex: String,
}

/// Where one field sits inside the encoded message.
#[derive(Debug, PartialEq, Eq)]
struct FieldSpan {
    name: String,
    field_type: &'static str,
    offset: usize,
    len: usize,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_schema(&args.schema, args.permissive)?;
    let values = args
        .fields
        .iter()
        .map(|field| parse_assignment(field))
        .collect::<CliResult<Vec<_>>>()?;

    let body = schema
        .encode(values)
        .map_err(|err| schema_error("encode failed", err))?;

    if let Some(path) = &args.out {
        fs::write(path, &body)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
    }

    let spans = match format {
        OutputFormat::Json | OutputFormat::Table => field_spans(&schema, &body)?,
        OutputFormat::Raw | OutputFormat::Pretty => Vec::new(),
    };

    match format {
        OutputFormat::Raw => {
            if args.out.is_none() {
                print_raw(&body).map_err(|err| io_error("failed writing stdout", err))?;
            }
        }
        OutputFormat::Pretty => println!("{}", hex(&body)),
        OutputFormat::Json => print_json(&EncodeOutput {
            size: body.len(),
            fields: spans.len(),
            hex: hex(&body),
        }),
        OutputFormat::Table => {
            print_table(
                &["FIELD", "TYPE", "OFFSET", "BYTES", "HEX"],
                spans.iter().map(|span| {
                    vec![
                        span.name.clone(),
                        span.field_type.to_string(),
                        span.offset.to_string(),
                        span.len.to_string(),
                        hex(&body[span.offset..span.offset + span.len]),
                    ]
                }),
            );
        }
    }

    Ok(SUCCESS)
}

fn parse_assignment(input: &str) -> CliResult<(String, String)> {
    match input.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(CliError::new(
            USAGE,
            format!("--field expects NAME=VALUE, got {input:?}"),
        )),
    }
}

// Walk our own output to find each field's byte range. The body was just
// built from this schema, so no size cap applies.
fn field_spans(schema: &FormSchema, body: &Bytes) -> CliResult<Vec<FieldSpan>> {
    let config = DecodeConfig {
        max_message_size: body.len(),
        ..schema.decode_config()
    };
    let fields = decode_message(body, schema, &config)
        .map_err(|err| schema_error("encoded message does not decode", err.into()))?;

    let mut spans = Vec::with_capacity(fields.len());
    let mut offset = 0usize;
    for field in &fields {
        let value = field
            .typed_value()
            .map_err(|err| schema_error("encoded message does not decode", err.into()))?;
        let len = field.name.len() + 1 + value.encoded_len();
        spans.push(FieldSpan {
            name: field.name.clone(),
            field_type: field.field_type.tag(),
            offset,
            len,
        });
        offset += len + 1;
    }
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use formwire_codec::FieldType;
    use formwire_schema::FieldSpec;

    use super::*;

    #[test]
    fn parse_assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("pw=a=b").unwrap(),
            ("pw".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("save=").unwrap(),
            ("save".to_string(), String::new())
        );
    }

    #[test]
    fn parse_assignment_rejects_bad_syntax() {
        assert_eq!(parse_assignment("novalue").unwrap_err().code, USAGE);
        assert_eq!(parse_assignment("=x").unwrap_err().code, USAGE);
    }

    #[test]
    fn spans_cover_message_between_terminators() {
        let schema = FormSchema::new([
            FieldSpec::new("ssid", FieldType::Text),
            FieldSpec::new("port", FieldType::UInt16),
        ])
        .unwrap();
        let body = schema.encode([("ssid", "abc"), ("port", "1")]).unwrap();

        let spans = field_spans(&schema, &body).unwrap();
        assert_eq!(
            spans,
            vec![
                FieldSpan {
                    name: "ssid".to_string(),
                    field_type: "txt",
                    offset: 0,
                    len: 8,
                },
                FieldSpan {
                    name: "port".to_string(),
                    field_type: "u16",
                    offset: 9,
                    len: 7,
                },
            ]
        );
        assert_eq!(body.len(), 16);
    }

    #[test]
    fn spans_cover_bodies_past_default_cap() {
        let schema = FormSchema::new([
            FieldSpec::new("note", FieldType::Text),
            FieldSpec::new("port", FieldType::UInt16),
        ])
        .unwrap();
        let note = "n".repeat(formwire_codec::DEFAULT_MAX_MESSAGE);
        let body = schema
            .encode([("note", note.as_str()), ("port", "8080")])
            .unwrap();

        let spans = field_spans(&schema, &body).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].offset + spans[1].len, body.len());
    }
}
