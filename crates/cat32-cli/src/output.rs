//! Output formatting utilities.

use clap::{ArgAction, Args, ValueEnum};
use serde::Serialize;

/// JSON rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single line.
    Compact,
    /// Indented.
    Pretty,
}

/// `--json[=compact|pretty]` and `--pretty[=true|false]` flags.
#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Output format; a bare --json means compact
    #[arg(
        long,
        value_enum,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "compact"
    )]
    json: Option<OutputFormat>,
    /// Pretty-print output
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pretty: Option<bool>,
}

impl FormatArgs {
    /// Final format for the given flags.
    pub fn resolve(&self) -> OutputFormat {
        resolve_format(self.json, self.pretty.unwrap_or(false))
    }
}

/// An explicit `--json` value is used as given unless `--pretty` is true;
/// without `--json`, `--pretty` alone decides.
pub fn resolve_format(json: Option<OutputFormat>, pretty: bool) -> OutputFormat {
    match json {
        Some(_) if pretty => OutputFormat::Pretty,
        Some(format) => format,
        None if pretty => OutputFormat::Pretty,
        None => OutputFormat::Compact,
    }
}

/// Renders `value` as JSON in the requested style.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Compact => serde_json::to_string(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_resolution_table() {
        use OutputFormat::*;
        assert_eq!(resolve_format(Some(Compact), true), Pretty);
        assert_eq!(resolve_format(Some(Compact), false), Compact);
        assert_eq!(resolve_format(Some(Pretty), false), Pretty);
        assert_eq!(resolve_format(None, true), Pretty);
        assert_eq!(resolve_format(None, false), Compact);
    }
}
