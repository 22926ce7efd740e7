//! Message listing writers.
//!
//! This module provides writers for the listing formats:
//! - [`write_csv`] / [`to_csv`] - CSV with semicolon delimiter - requires `csv-output` feature
//! - [`write_json`] / [`to_json`] - JSON array of messages - requires `json-output` feature
//! - [`write_jsonl`] / [`to_jsonl`] - JSON Lines, one message per line - requires `json-output` feature
//!
//! Which optional columns appear is controlled by [`OutputConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "csv-output", feature = "json-output"))]
//! # fn main() -> chatzip::Result<()> {
//! use chatzip::output::{write_csv, to_jsonl, OutputConfig};
//! use chatzip::TranscriptParser;
//!
//! let messages = TranscriptParser::new().parse_str("15/01/2024, 10:30 - Alice: Hello!");
//! let config = OutputConfig::new().with_timestamps().with_attachments();
//!
//! write_csv(&messages, "listing.csv", &config)?;
//! let lines = to_jsonl(&messages, &config)?;
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "csv-output", feature = "json-output")))]
//! # fn main() {}
//! ```

use serde::{Deserialize, Serialize};

#[cfg(feature = "json-output")]
use crate::message::Message;

#[cfg(feature = "csv-output")]
mod csv_writer;
#[cfg(feature = "json-output")]
mod json_writer;
#[cfg(feature = "json-output")]
mod jsonl_writer;

#[cfg(feature = "csv-output")]
pub use csv_writer::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use json_writer::{to_json, write_json};
#[cfg(feature = "json-output")]
pub use jsonl_writer::{to_jsonl, write_jsonl};

/// Timestamp layout shared by every writer.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Optional columns for message listings.
///
/// Sender and text are always written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Include the parsed timestamp (empty for invalid stamps)
    pub include_timestamps: bool,
    /// Include resolved attachment names
    pub include_attachments: bool,
    /// Include the transcript each message came from
    pub include_source: bool,
}

impl OutputConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every optional column enabled.
    pub fn all() -> Self {
        Self {
            include_timestamps: true,
            include_attachments: true,
            include_source: true,
        }
    }

    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.include_timestamps = true;
        self
    }

    #[must_use]
    pub fn with_attachments(mut self) -> Self {
        self.include_attachments = true;
        self
    }

    #[must_use]
    pub fn with_source(mut self) -> Self {
        self.include_source = true;
        self
    }
}

/// Record shape used by the JSON writers.
/// Only includes fields enabled in `OutputConfig`.
#[cfg(feature = "json-output")]
#[derive(Serialize)]
struct JsonRecord<'a> {
    sender: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[cfg(feature = "json-output")]
impl<'a> JsonRecord<'a> {
    fn new(msg: &'a Message, config: &OutputConfig) -> Self {
        Self {
            sender: msg.sender(),
            text: msg.text(),
            timestamp: if config.include_timestamps {
                msg.datetime()
                    .as_datetime()
                    .map(|ts| ts.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            } else {
                None
            },
            attachments: config
                .include_attachments
                .then(|| msg.attachments().iter().map(|a| a.filename.as_str()).collect()),
            source: if config.include_source {
                msg.source_file()
            } else {
                None
            },
        }
    }
}
