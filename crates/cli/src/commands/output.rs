//! Terminal output. Logs go to stderr through tracing; results go here.

#![allow(clippy::print_stdout)]

use serde::Serialize;

use super::CliError;

pub fn line(text: &str) {
    println!("{text}");
}

/// Pretty-print a value as JSON.
///
/// # Errors
///
/// Returns `CliError::Output` if the value cannot be serialized.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
