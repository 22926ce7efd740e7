//! Output format selection for message listings.
//!
//! These types don't depend on CLI frameworks, so library callers can pick a
//! format from a file extension or a string and hand the rest to
//! [`write_to_format`] / [`to_format_string`].
//!
//! # Example
//!
//! ```rust
//! # #[cfg(all(feature = "csv-output", feature = "json-output"))]
//! # fn example() -> chatzip::Result<()> {
//! use chatzip::format::{OutputFormat, to_format_string};
//! use chatzip::output::OutputConfig;
//! use chatzip::TranscriptParser;
//!
//! let messages = TranscriptParser::new().parse_str("15/01/2024, 10:30 - Alice: Hello!");
//!
//! let format = OutputFormat::from_path("listing.jsonl")?;
//! assert_eq!(format, OutputFormat::Jsonl);
//!
//! let text = to_format_string(&messages, OutputFormat::Text, &OutputConfig::new())?;
//! assert_eq!(text, "15/01/2024, 10:30 - Alice: Hello!\n");
//! # Ok(())
//! # }
//! ```

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{ChatzipError, Result};
use crate::message::Message;
use crate::output::OutputConfig;

/// Output format for message listings.
///
/// - [`Text`](OutputFormat::Text) - transcript lines in their original syntax
/// - [`Csv`](OutputFormat::Csv) - semicolon separated, one row per message
/// - [`Json`](OutputFormat::Json) - structured array
/// - [`Jsonl`](OutputFormat::Jsonl) - one JSON object per line
///
/// # Example
///
/// ```rust
/// use chatzip::format::OutputFormat;
/// use std::str::FromStr;
///
/// let format = OutputFormat::from_str("jsonl").unwrap();
/// assert_eq!(format, OutputFormat::Jsonl);
/// assert_eq!(format.extension(), "jsonl");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OutputFormat {
    /// Transcript lines, re-rendered exactly as they appeared in the export
    #[default]
    Text,

    /// CSV with semicolon delimiter
    Csv,

    /// JSON array of messages
    Json,

    /// JSON Lines - one JSON object per line (also known as NDJSON)
    Jsonl,
}

impl OutputFormat {
    /// Returns the file extension for this format (without dot).
    ///
    /// ```rust
    /// use chatzip::format::OutputFormat;
    ///
    /// assert_eq!(OutputFormat::Text.extension(), "txt");
    /// assert_eq!(OutputFormat::Csv.extension(), "csv");
    /// ```
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }

    /// Returns all supported format names.
    pub fn all_names() -> &'static [&'static str] {
        &["text", "txt", "csv", "json", "jsonl", "ndjson"]
    }

    /// Returns all available formats.
    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::Text,
            OutputFormat::Csv,
            OutputFormat::Json,
            OutputFormat::Jsonl,
        ]
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text/plain",
            OutputFormat::Csv => "text/csv",
            OutputFormat::Json => "application/json",
            OutputFormat::Jsonl => "application/x-ndjson",
        }
    }

    /// Detects format from a file path based on extension.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::InvalidFormat`] for unknown extensions.
    pub fn from_path(path: &str) -> Result<Self> {
        let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();

        match ext.as_str() {
            "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(ChatzipError::invalid_format(
                "output",
                format!("Unknown file extension: '.{ext}'. Expected one of: txt, csv, json, jsonl"),
            )),
        }
    }

    fn feature(self) -> &'static str {
        match self {
            OutputFormat::Text => "default",
            OutputFormat::Csv => "csv-output",
            OutputFormat::Json | OutputFormat::Jsonl => "json-output",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "Text"),
            OutputFormat::Csv => write!(f, "CSV"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Jsonl => write!(f, "JSONL"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(format!(
                "Unknown format: '{}'. Expected one of: {}",
                s,
                OutputFormat::all_names().join(", ")
            )),
        }
    }
}

/// Renders messages as transcript lines, one message per line.
///
/// Multi-line messages keep their continuation lines.
pub fn to_text(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        let _ = writeln!(out, "{}", msg.to_line());
    }
    out
}

/// Writes messages to a file in the specified format.
///
/// # Errors
///
/// Returns an error if:
/// - The required feature for the format is not enabled
/// - The file cannot be written
#[allow(unused_variables)]
pub fn write_to_format(
    messages: &[Message],
    path: &str,
    format: OutputFormat,
    config: &OutputConfig,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            std::fs::write(path, to_text(messages))?;
            Ok(())
        }
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::output::write_csv(messages, path, config),
        #[cfg(feature = "json-output")]
        OutputFormat::Json => crate::output::write_json(messages, path, config),
        #[cfg(feature = "json-output")]
        OutputFormat::Jsonl => crate::output::write_jsonl(messages, path, config),
        #[allow(unreachable_patterns)]
        _ => Err(missing_feature(format)),
    }
}

/// Converts messages to a string in the specified format.
///
/// # Errors
///
/// Returns an error if the required feature is disabled or serialization fails.
#[allow(unused_variables)]
pub fn to_format_string(
    messages: &[Message],
    format: OutputFormat,
    config: &OutputConfig,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(to_text(messages)),
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::output::to_csv(messages, config),
        #[cfg(feature = "json-output")]
        OutputFormat::Json => crate::output::to_json(messages, config),
        #[cfg(feature = "json-output")]
        OutputFormat::Jsonl => crate::output::to_jsonl(messages, config),
        #[allow(unreachable_patterns)]
        _ => Err(missing_feature(format)),
    }
}

#[allow(dead_code)]
fn missing_feature(format: OutputFormat) -> ChatzipError {
    ChatzipError::invalid_format(
        "output",
        format!(
            "Output format {format:?} requires the '{}' feature to be enabled",
            format.feature()
        ),
    )
}
