//! JSON Lines (JSONL) output writer.
//!
//! One message per line, suitable for streaming into other tools.

use std::fs::File;
use std::io::{BufWriter, Write};

use super::{JsonRecord, OutputConfig};
use crate::error::Result;
use crate::message::Message;

/// Writes messages to JSONL (JSON Lines) format.
///
/// # Format
/// ```text
/// {"sender":"Alice","text":"Hello"}
/// {"sender":"Bob","text":"Hi"}
/// ```
pub fn write_jsonl(messages: &[Message], output_path: &str, config: &OutputConfig) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write_lines(messages, &mut writer, config)?;
    writer.flush()?;
    Ok(())
}

/// Converts messages to a JSONL string.
pub fn to_jsonl(messages: &[Message], config: &OutputConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_lines(messages, &mut buffer, config)?;
    Ok(String::from_utf8(buffer)?)
}

fn write_lines<W: Write>(messages: &[Message], writer: &mut W, config: &OutputConfig) -> Result<()> {
    for msg in messages {
        let line = serde_json::to_string(&JsonRecord::new(msg, config))?;
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
