//! Input acquisition for CLI commands.

use std::io::{self, Read};

use crate::error::CliError;

/// Reads all of stdin, dropping one trailing `\n` or `\r\n`.
pub fn read_stdin_line() -> Result<String, CliError> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(strip_trailing_newline(buffer))
}

/// Reads a file, or stdin when no path is given.
pub fn read_source(path: Option<String>) -> Result<String, CliError> {
    match path {
        Some(path) => std::fs::read_to_string(&path).map_err(|source| CliError::ReadFile {
            path,
            source,
        }),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with("\r\n") {
        text.truncate(text.len() - 2);
    } else if text.ends_with('\n') {
        text.truncate(text.len() - 1);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::strip_trailing_newline;

    #[test]
    fn strips_exactly_one_line_ending() {
        assert_eq!(strip_trailing_newline("a\n".into()), "a");
        assert_eq!(strip_trailing_newline("a\r\n".into()), "a");
        assert_eq!(strip_trailing_newline("a\n\n".into()), "a\n");
        assert_eq!(strip_trailing_newline("a".into()), "a");
    }
}
