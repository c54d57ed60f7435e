//! Canonicalize command implementation.

use cat32_canonical::{stable_stringify, Value};
use serde_json::json;
use tracing::debug;

use crate::error::CliError;
use crate::input;
use crate::output::{self, OutputFormat};

pub fn run(path: Option<String>, format: OutputFormat) -> Result<(), CliError> {
    let document: serde_json::Value = serde_json::from_str(&input::read_source(path)?)?;
    let key = stable_stringify(&Value::from(document));
    debug!(bytes = key.len(), "canonicalized document");
    println!("{}", output::render(&json!({ "key": key }), format)?);
    Ok(())
}
