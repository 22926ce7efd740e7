//! JSON output writer.

use std::fs::File;
use std::io::Write;

use super::{JsonRecord, OutputConfig};
use crate::error::Result;
use crate::message::Message;

/// Writes messages to a JSON file as an array.
///
/// # Format
/// ```json
/// [
///   {"sender": "Alice", "text": "Hello"},
///   {"sender": "Bob", "text": "Hi"}
/// ]
/// ```
pub fn write_json(messages: &[Message], output_path: &str, config: &OutputConfig) -> Result<()> {
    let json = to_json(messages, config)?;
    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Converts messages to a pretty-printed JSON array.
pub fn to_json(messages: &[Message], config: &OutputConfig) -> Result<String> {
    let records: Vec<JsonRecord<'_>> = messages
        .iter()
        .map(|msg| JsonRecord::new(msg, config))
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AttachmentRef, Timestamp};
    use crate::transcript::LineSyntax;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn msg(sender: &str, text: &str) -> Message {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
        Message::new(LineSyntax::Bracketed, "15/06/2024, 12:30:00", Timestamp::Valid(ts), sender, text)
    }

    #[test]
    fn test_write_json_basic() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        write_json(&[msg("Alice", "Hello"), msg("Bob", "Hi")], path, &OutputConfig::new()).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["sender"], "Alice");
        assert_eq!(parsed[1]["text"], "Hi");
        assert!(parsed[0].get("timestamp").is_none());
    }

    #[test]
    fn test_json_optional_fields() {
        let message = msg("Alice", "<attached: 00000001-PHOTO-2024-06-15-12-30-00.jpg>")
            .with_source_file("_chat.txt")
            .with_attachments(vec![AttachmentRef::new("00000001-PHOTO-2024-06-15-12-30-00.jpg")]);

        let json = to_json(&[message], &OutputConfig::all()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed[0]["timestamp"], "2024-06-15T12:30:00Z");
        assert_eq!(parsed[0]["source"], "_chat.txt");
        assert_eq!(parsed[0]["attachments"][0], "00000001-PHOTO-2024-06-15-12-30-00.jpg");
    }

    #[test]
    fn test_json_empty() {
        assert_eq!(to_json(&[], &OutputConfig::new()).unwrap(), "[]");
    }
}
