//! CSV output writer.

use std::fs::File;
use std::io::Write;

use super::{OutputConfig, TIMESTAMP_FORMAT};
use crate::error::Result;
use crate::message::Message;

/// Writes messages to CSV with semicolon delimiter.
///
/// # Format
/// - Delimiter: `;`
/// - Columns: depend on [`OutputConfig`]
///   - Basic: `Sender`, `Text`
///   - With timestamps: `Timestamp`, `Sender`, `Text`
///   - With attachments: `Sender`, `Text`, `Attachments` (comma separated)
///   - With source: `Source`, ... first column
/// - Encoding: UTF-8
pub fn write_csv(messages: &[Message], output_path: &str, config: &OutputConfig) -> Result<()> {
    let file = File::create(output_path)?;
    write_records(messages, file, config)
}

/// Converts messages to a CSV string.
pub fn to_csv(messages: &[Message], config: &OutputConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_records(messages, &mut buffer, config)?;
    Ok(String::from_utf8(buffer)?)
}

fn write_records<W: Write>(messages: &[Message], sink: W, config: &OutputConfig) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(sink);

    writer.write_record(build_header(config))?;
    for msg in messages {
        writer.write_record(build_record(msg, config))?;
    }

    writer.flush()?;
    Ok(())
}

fn build_header(config: &OutputConfig) -> Vec<&'static str> {
    let mut header = Vec::new();

    if config.include_source {
        header.push("Source");
    }
    if config.include_timestamps {
        header.push("Timestamp");
    }

    header.push("Sender");
    header.push("Text");

    if config.include_attachments {
        header.push("Attachments");
    }

    header
}

fn build_record(msg: &Message, config: &OutputConfig) -> Vec<String> {
    let mut record = Vec::new();

    if config.include_source {
        record.push(msg.source_file().unwrap_or_default().to_string());
    }
    if config.include_timestamps {
        record.push(
            msg.datetime()
                .as_datetime()
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        );
    }

    record.push(msg.sender().to_string());
    record.push(msg.text().to_string());

    if config.include_attachments {
        let names: Vec<&str> = msg.attachments().iter().map(|a| a.filename.as_str()).collect();
        record.push(names.join(","));
    }

    record
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
        Message::new(LineSyntax::Dashed, "15/06/2024, 12:30", Timestamp::Valid(ts), sender, text)
    }

    #[test]
    fn test_write_csv_basic() {
        let messages = vec![msg("Alice", "Hello"), msg("Bob", "Hi there")];

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        write_csv(&messages, path, &OutputConfig::new()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();

        assert!(content.contains("Sender;Text"));
        assert!(content.contains("Alice;Hello"));
        assert!(content.contains("Bob;Hi there"));
    }

    #[test]
    fn test_csv_with_timestamps_and_attachments() {
        let message = msg("Alice", "IMG-20240615-WA0001.jpg (file attached)")
            .with_attachments(vec![AttachmentRef::new("IMG-20240615-WA0001.jpg")]);

        let config = OutputConfig::new().with_timestamps().with_attachments();
        let content = to_csv(&[message], &config).unwrap();

        assert!(content.starts_with("Timestamp;Sender;Text;Attachments\n"));
        assert!(content.contains("2024-06-15 12:30:00;Alice;"));
        assert!(content.ends_with(";IMG-20240615-WA0001.jpg\n"));
    }

    #[test]
    fn test_csv_invalid_timestamp_is_empty() {
        let message = Message::new(LineSyntax::Dashed, "32/01/2024, 10:00", Timestamp::Invalid, "A", "x")
            .with_source_file("_chat.txt");
        let config = OutputConfig::new().with_timestamps().with_source();
        let content = to_csv(&[message], &config).unwrap();
        assert!(content.contains("_chat.txt;;A;x"));
    }

    #[test]
    fn test_csv_quotes_multiline_text() {
        let content = to_csv(&[msg("A", "line one\nline two")], &OutputConfig::new()).unwrap();
        assert!(content.contains("\"line one\nline two\""));
    }
}
