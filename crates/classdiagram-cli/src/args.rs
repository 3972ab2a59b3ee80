//! Command-line argument definitions for the class-diagram CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, what gets printed,
//! configuration file selection, and logging verbosity.

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use crate::config::OutputFormat;

/// Which stage of the pipeline to print
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// The parsed class diagram
    #[default]
    Ast,
    /// The token stream produced by the lexer
    Tokens,
}

/// Command-line arguments for the class-diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// What to print
    #[arg(long, value_enum, default_value_t = Emit::Ast)]
    pub emit: Emit,

    /// Output format, overriding the configuration file
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The `--log-level` value as a filter, or `None` when it names no level.
    pub fn log_filter(&self) -> Option<LevelFilter> {
        self.log_level.parse().ok()
    }
}
