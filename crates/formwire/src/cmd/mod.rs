use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use formwire_schema::{FormSchema, SchemaConfig};

use crate::exit::{schema_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod schema;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode form values into a binary message.
    Encode(EncodeArgs),
    /// Decode a binary message and print its fields.
    Decode(DecodeArgs),
    /// Validate a schema file and describe it.
    Schema(SchemaArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Schema(args) => schema::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Form schema (JSON).
    #[arg(long, short = 's', value_name = "FILE")]
    pub schema: PathBuf,
    /// Field value as NAME=VALUE. Repeat for each field.
    #[arg(long = "field", short = 'f', value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
    /// Also write the encoded message to a file.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,
    /// Drop undeclared fields and allow absent ones.
    #[arg(long)]
    pub permissive: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Form schema (JSON).
    #[arg(long, short = 's', value_name = "FILE")]
    pub schema: PathBuf,
    /// Encoded message. Reads stdin when omitted or "-".
    pub input: Option<PathBuf>,
    /// Skip undeclared fields and allow absent ones.
    #[arg(long)]
    pub permissive: bool,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema file to check.
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn load_schema(path: &Path, permissive: bool) -> CliResult<FormSchema> {
    let config = if permissive {
        SchemaConfig::permissive()
    } else {
        SchemaConfig::default()
    };
    FormSchema::from_file_with_config(path, config)
        .map_err(|err| schema_error(&format!("failed loading {}", path.display()), err))
}
