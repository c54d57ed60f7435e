//! Assign command implementation.

use cat32_canonical::Value;
use cat32_core::{Categorizer, CategorizerConfig, NormalizeMode};
use tracing::debug;

use crate::error::CliError;
use crate::input;
use crate::output::{self, OutputFormat};

pub fn run(
    key: Vec<String>,
    salt: Option<String>,
    namespace: String,
    normalize: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    let normalize: NormalizeMode = normalize.parse()?;
    let categorizer = Categorizer::new(CategorizerConfig {
        salt,
        namespace: Some(namespace),
        normalize,
        ..Default::default()
    })?;

    let text = if key.is_empty() {
        input::read_stdin_line()?
    } else {
        key.join(" ")
    };

    let assignment = categorizer.assign(&Value::from(text));
    debug!(index = assignment.index, hash = %assignment.hash, "assigned");
    println!("{}", output::render(&assignment, format)?);
    Ok(())
}
