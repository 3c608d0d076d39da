//! GitHub Actions runner conventions: workflow commands on stdout and
//! step outputs through the `GITHUB_OUTPUT` file.

use colored::Colorize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Name of the single step output.
pub const CAPTURED_CONTENT: &str = "capturedContent";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write step output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Unexpected input: {field} should not contain the delimiter \"{delimiter}\"")]
    DelimiterCollision { field: &'static str, delimiter: String },

    #[error("Failed to encode output value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Escape message data of a workflow command.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a `key=value` property of a workflow command.
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Format `::command key=value,...::message`.
pub fn command(name: &str, properties: &[(&str, &str)], message: &str) -> String {
    let mut line = format!("::{name}");
    if !properties.is_empty() {
        let props: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("{key}={}", escape_property(value)))
            .collect();
        line.push(' ');
        line.push_str(&props.join(","));
    }
    line.push_str("::");
    line.push_str(&escape_data(message));
    line
}

pub fn warning(message: &str) {
    println!("{}", command("warning", &[], message));
}

/// Annotate the step as failed. The caller sets the exit code.
pub fn error(message: &str) {
    println!("{}", command("error", &[], message));
}

/// Log the extracted value the way it will be consumed downstream.
pub fn print_extracted(content: &str) -> Result<(), OutputError> {
    println!("{} {}", "Extracted content:".bold(), serde_json::to_string(content)?);
    Ok(())
}

/// Set a step output: appended to `GITHUB_OUTPUT` when the runner provides
/// one, otherwise emitted as the legacy `set-output` command.
pub fn set_output(name: &str, value: &str) -> Result<(), OutputError> {
    match std::env::var_os("GITHUB_OUTPUT") {
        Some(path) if !path.is_empty() => append_output(Path::new(&path), name, value),
        _ => {
            println!("{}", command("set-output", &[("name", name)], value));
            Ok(())
        }
    }
}

pub fn append_output(path: &Path, name: &str, value: &str) -> Result<(), OutputError> {
    debug!(path = %path.display(), name, "writing step output");
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    write_output(&mut file, name, value, &delimiter)
}

/// Write one `name<<delimiter` block, safe for multi-line values.
pub fn write_output<W: Write>(
    writer: &mut W,
    name: &str,
    value: &str,
    delimiter: &str,
) -> Result<(), OutputError> {
    if name.contains(delimiter) {
        return Err(OutputError::DelimiterCollision {
            field: "name",
            delimiter: delimiter.to_string(),
        });
    }
    if value.contains(delimiter) {
        return Err(OutputError::DelimiterCollision {
            field: "value",
            delimiter: delimiter.to_string(),
        });
    }
    writeln!(writer, "{name}<<{delimiter}")?;
    writeln!(writer, "{value}")?;
    writeln!(writer, "{delimiter}")?;
    Ok(())
}
