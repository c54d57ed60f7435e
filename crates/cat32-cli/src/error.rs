//! CLI error type and exit-code mapping.

use cat32_core::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid categorizer settings.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Input file could not be read.
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
    /// Stdin could not be read.
    #[error("failed to read stdin: {0}")]
    Stdin(#[from] std::io::Error),
    /// Input or output JSON handling failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Configuration problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            _ => 1,
        }
    }
}
