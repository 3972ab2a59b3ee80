//! Class-diagram CLI library
//!
//! This module contains the core CLI logic: read a diagram file, run the
//! lexer and parser over it, and print the tokens or the class diagram.

pub mod error_adapter;

mod args;
mod config;
mod error;

pub use args::{Args, Emit};
pub use config::OutputFormat;
pub use error::CliError;

use std::{
    fmt::Debug,
    fs,
    io::{self, Write},
};

use log::{debug, info};
use serde::Serialize;

use classdiagram_parser::{parse_with_config, tokenize};

/// Run the class-diagram CLI application
///
/// This function tokenizes the input file, parses it unless only tokens were
/// requested, and writes the result to the output file or stdout.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors, one diagnostic per malformed statement
/// - JSON serialization errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path:? = args.output;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let format = args.format.unwrap_or(app_config.output.format);
    debug!(format:?, emit:? = args.emit; "Output settings");

    let source = fs::read_to_string(&args.input)?;
    let tokens = tokenize(&source);

    let rendered = match args.emit {
        Emit::Tokens => render(&tokens, format)?,
        Emit::Ast => {
            let diagram = parse_with_config(&tokens, &app_config.parser)
                .map_err(|err| CliError::new_parse_error(err, source.as_str()))?;
            info!(statements = diagram.statements.len(); "Diagram parsed");
            render(&diagram, format)?
        }
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(output_file = path; "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{rendered}")?;
        }
    }

    Ok(())
}

fn render<T>(value: &T, format: OutputFormat) -> Result<String, CliError>
where
    T: Debug + Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Debug => format!("{value:#?}"),
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
    })
}
