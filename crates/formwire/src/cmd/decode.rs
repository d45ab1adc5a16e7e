use std::io::Read;
use std::path::Path;

use formwire_schema::FormData;
use serde::Serialize;

use crate::cmd::{load_schema, DecodeArgs};
use crate::exit::{io_error, schema_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: &'static str,
    value: &'a str,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = load_schema(&args.schema, args.permissive)?;
    let body = read_input(args.input.as_deref())?;

    let form = schema
        .decode(&body)
        .map_err(|err| schema_error("decode failed", err))?;

    print_form(&form, format);
    Ok(SUCCESS)
}

fn read_input(path: Option<&Path>) -> CliResult<Vec<u8>> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err)),
        _ => {
            let mut body = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut body)
                .map_err(|err| io_error("failed reading stdin", err))?;
            Ok(body)
        }
    }
}

fn print_form(form: &FormData, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<FieldOutput<'_>> = form
                .iter()
                .map(|field| FieldOutput {
                    name: &field.name,
                    field_type: field.field_type.tag(),
                    value: &field.value,
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => print_table(
            &["FIELD", "TYPE", "VALUE"],
            form.iter().map(|field| {
                vec![
                    field.name.clone(),
                    field.field_type.tag().to_string(),
                    field.value.clone(),
                ]
            }),
        ),
        OutputFormat::Pretty => {
            for field in form {
                println!("{}={}", field.name, field.value);
            }
        }
        OutputFormat::Raw => {
            for field in form {
                println!("{}", field.value);
            }
        }
    }
}
