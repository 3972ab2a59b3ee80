//! Error type for the CLI.

use std::io;

use thiserror::Error;

use classdiagram_parser::ParseError;

use crate::config::ConfigError;

/// Errors returned by [`run`](crate::run)
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CliError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
