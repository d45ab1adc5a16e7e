use formwire_schema::FormSchema;
use serde::Serialize;

use crate::cmd::{load_schema, SchemaArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct FieldInfo<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: &'static str,
    max_bytes: Option<usize>,
    title: Option<&'a str>,
}

#[derive(Serialize)]
struct SchemaInfo<'a> {
    title: Option<&'a str>,
    max_message_size: Option<usize>,
    fields: Vec<FieldInfo<'a>>,
}

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_schema(&args.path, false)?;
    print_schema(&describe(&schema), format);
    Ok(SUCCESS)
}

fn describe(schema: &FormSchema) -> SchemaInfo<'_> {
    SchemaInfo {
        title: schema.title(),
        max_message_size: schema.max_message_size(),
        fields: schema
            .fields()
            .iter()
            .map(|spec| FieldInfo {
                name: &spec.name,
                field_type: spec.field_type.tag(),
                max_bytes: spec.max_value_bytes(),
                title: spec.title.as_deref(),
            })
            .collect(),
    }
}

fn print_schema(info: &SchemaInfo<'_>, format: OutputFormat) {
    let bound = |value: Option<usize>| {
        value.map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    };

    match format {
        OutputFormat::Json => print_json(info),
        OutputFormat::Table => {
            print_table(
                &["FIELD", "TYPE", "MAX BYTES", "TITLE"],
                info.fields.iter().map(|field| {
                    vec![
                        field.name.to_string(),
                        field.field_type.to_string(),
                        bound(field.max_bytes),
                        field.title.unwrap_or("").to_string(),
                    ]
                }),
            );
            println!("max message size: {}", bound(info.max_message_size));
        }
        OutputFormat::Pretty => {
            println!("Form: {}", info.title.unwrap_or("(untitled)"));
            for field in &info.fields {
                println!(
                    "  {:<16} {:<5} max {}",
                    field.name,
                    field.field_type,
                    bound(field.max_bytes)
                );
            }
            println!("Max message size: {}", bound(info.max_message_size));
        }
        OutputFormat::Raw => {
            for field in &info.fields {
                println!("{}", field.name);
            }
        }
    }
}
