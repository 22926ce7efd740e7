//! Transcript parsing.
//!
//! Converts the text of one transcript file into [`Message`] records. Two
//! line syntaxes are supported (see [`LineSyntax`]):
//!
//! ```text
//! [15/1/24 10:30:05] Jane: <attached file: IMG-001.jpg>
//! 15/01/2024, 10:30 - John Doe: Hey there
//! ```
//!
//! Lines that match neither syntax never become messages. Depending on
//! [`ContinuationPolicy`] they are appended to the previous message (the
//! default, which keeps multi-line messages intact) or dropped.
//!
//! Parsing is pure: the same input always yields the same output and the
//! parser keeps no state between calls.
//!
//! # Example
//!
//! ```
//! use chatzip::transcript::TranscriptParser;
//!
//! let content = "\
//! 15/01/2024, 10:30 - Alice: Hello
//! 15/01/2024, 10:31 - Bob: Hi!
//! second line of Bob's message";
//!
//! let messages = TranscriptParser::new().parse_str(content);
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[1].text(), "Hi!\nsecond line of Bob's message");
//! ```

mod stamp;
mod syntax;

pub use stamp::{detect_date_order, expand_year, parse_stamp, stamp_vote, DateOrder};
pub use syntax::{LineSyntax, SenderPart, Separator, StampedLine};

pub use crate::config::{ContinuationPolicy, TranscriptConfig};
use crate::message::Message;

/// UTF-8 byte order mark some exporters prepend.
const BOM: char = '\u{feff}';

/// Parser for transcript text.
#[derive(Debug, Clone, Default)]
pub struct TranscriptParser {
    config: TranscriptConfig,
}

/// Where the previous line left the parser.
enum Tail {
    /// Nothing seen yet, or the previous stamped line was a system line.
    Detached,
    /// The last pushed message accepts continuation lines.
    Message,
}

impl TranscriptParser {
    /// Creates a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom configuration.
    pub fn with_config(config: TranscriptConfig) -> Self {
        Self { config }
    }

    /// Returns the parser configuration.
    pub fn config(&self) -> &TranscriptConfig {
        &self.config
    }

    /// Parses a single line with the configured date order.
    ///
    /// Returns `None` for lines that match no syntax and for system lines
    /// without a `Sender:` part.
    pub fn parse_line(&self, line: &str) -> Option<Message> {
        let line = line.trim_start_matches(BOM).trim_end_matches('\r');
        let stamped = LineSyntax::detect(line)?;
        build_message(&stamped, self.config.date_order)
    }

    /// Parses the full text of a transcript.
    pub fn parse_str(&self, content: &str) -> Vec<Message> {
        self.parse_lines(content, None)
    }

    /// Parses a transcript and tags every message with its source file.
    pub fn parse_named(&self, source_file: &str, content: &str) -> Vec<Message> {
        self.parse_lines(content, Some(source_file))
    }

    /// Decides the date order for `content`.
    ///
    /// When detection is enabled the first `sample_size` decisive stamps vote.
    /// Stamps that fit both orders are skipped, however many there are. An
    /// undecided vote keeps the configured order.
    pub fn date_order_for(&self, content: &str) -> DateOrder {
        if !self.config.detect_date_order {
            return self.config.date_order;
        }
        let stamps = lines(content)
            .filter_map(LineSyntax::detect)
            .map(|stamped| stamped.stamp)
            .filter(|stamp| stamp_vote(stamp).is_some())
            .take(self.config.sample_size);
        detect_date_order(stamps).unwrap_or(self.config.date_order)
    }

    fn parse_lines(&self, content: &str, source_file: Option<&str>) -> Vec<Message> {
        let order = self.date_order_for(content);
        let append = self.config.continuation == ContinuationPolicy::Append;

        let mut messages: Vec<Message> = Vec::new();
        let mut tail = Tail::Detached;
        let mut system_lines = 0usize;
        let mut dropped_lines = 0usize;

        for line in lines(content) {
            if let Some(stamped) = LineSyntax::detect(line) {
                if let Some(mut msg) = build_message(&stamped, order) {
                    if let Some(source) = source_file {
                        msg.source_file = Some(source.to_string());
                    }
                    messages.push(msg);
                    tail = Tail::Message;
                } else {
                    system_lines += 1;
                    tail = Tail::Detached;
                }
                continue;
            }

            match (&tail, messages.last_mut()) {
                (Tail::Message, Some(last)) if append => {
                    last.text.push('\n');
                    last.text.push_str(line);
                }
                _ => dropped_lines += 1,
            }
        }

        let invalid = messages.iter().filter(|m| !m.has_valid_timestamp()).count();
        if invalid > 0 {
            tracing::warn!(
                source = source_file.unwrap_or("<text>"),
                invalid,
                "messages with out-of-range timestamps kept as invalid"
            );
        }
        tracing::debug!(
            source = source_file.unwrap_or("<text>"),
            messages = messages.len(),
            system_lines,
            dropped_lines,
            ?order,
            "parsed transcript"
        );

        messages
    }
}

fn lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .trim_start_matches(BOM)
        .lines()
        .map(|line| line.trim_end_matches('\r'))
}

fn build_message(stamped: &StampedLine<'_>, order: DateOrder) -> Option<Message> {
    let part = stamped.sender_part()?;
    let datetime = parse_stamp(stamped.stamp, order);
    let msg = Message::new(stamped.syntax, stamped.stamp, datetime, part.sender, part.text);
    Some(msg.with_separator(part.separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // =========================================================================
    // Single lines
    // =========================================================================

    #[test]
    fn test_dashed_line() {
        let msg = TranscriptParser::new()
            .parse_line("15/01/2024, 10:30 - John Doe: Hey there")
            .unwrap();
        assert_eq!(msg.sender(), "John Doe");
        assert_eq!(msg.text(), "Hey there");
        assert_eq!(
            msg.datetime().as_datetime(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(msg.syntax, LineSyntax::Dashed);
    }

    #[test]
    fn test_bracketed_line() {
        let msg = TranscriptParser::new()
            .parse_line("[15/1/24 10:30:05] Jane: <attached file: IMG-001.jpg>")
            .unwrap();
        assert_eq!(msg.sender(), "Jane");
        assert!(msg.text().contains("<attached file: IMG-001.jpg>"));
        assert_eq!(
            msg.datetime().as_datetime(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap())
        );
    }

    #[test]
    fn test_unparseable_date_is_rejected() {
        let parser = TranscriptParser::new();
        assert!(parser.parse_line("xx/01/2024, 10:30 - John: hi").is_none());
        assert!(parser.parse_line("").is_none());
        assert!(parser.parse_line("hello world").is_none());
    }

    #[test]
    fn test_out_of_range_date_is_kept_invalid() {
        let msg = TranscriptParser::new()
            .parse_line("31/02/2024, 10:30 - John: still here")
            .unwrap();
        assert!(!msg.has_valid_timestamp());
        assert_eq!(msg.datetime().to_string(), "Invalid Date");
        assert_eq!(msg.text(), "still here");
    }

    #[test]
    fn test_line_round_trip() {
        let parser = TranscriptParser::new();
        for line in [
            "15/01/2024, 10:30 - John Doe: Hey there",
            "[15/1/24 10:30:05] Jane: <attached file: IMG-001.jpg>",
            "[1/15/24, 10:30:45 AM] Alice: Hello: with colon",
            "26.10.2025, 20:40 - Bob:",
            "15/01/2024, 10:30 - Bob: ",
            "[15/1/24 10:30:05] Jane: ",
            "15/01/2024, 10:30 - Bob: \ncontinued",
        ] {
            assert_eq!(parser.parse_line(line).unwrap().to_line(), line);
        }
    }

    // =========================================================================
    // Whole transcripts
    // =========================================================================

    #[test]
    fn test_continuation_appended_by_default() {
        let content = "15/01/2024, 10:30 - Alice: first\nsecond\n\nfourth\n15/01/2024, 10:31 - Bob: ok";
        let messages = TranscriptParser::new().parse_str(content);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text(), "first\nsecond\n\nfourth");
        assert_eq!(messages[0].to_line(), "15/01/2024, 10:30 - Alice: first\nsecond\n\nfourth");
    }

    #[test]
    fn test_continuation_dropped_when_configured() {
        let config = TranscriptConfig::new().with_continuation(ContinuationPolicy::Drop);
        let content = "15/01/2024, 10:30 - Alice: first\nsecond";
        let messages = TranscriptParser::with_config(config).parse_str(content);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "first");
    }

    #[test]
    fn test_system_lines_and_their_continuations_dropped() {
        let content = "\
15/01/2024, 10:00 - Messages and calls are end-to-end encrypted.
Tap to learn more.
15/01/2024, 10:30 - Alice: hi";
        let messages = TranscriptParser::new().parse_str(content);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "hi");
    }

    #[test]
    fn test_leading_orphan_lines_dropped() {
        let content = "header line\n15/01/2024, 10:30 - Alice: hi";
        let messages = TranscriptParser::new().parse_str(content);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "hi");
    }

    #[test]
    fn test_bom_and_crlf_stripped() {
        let content = "\u{feff}15/01/2024, 10:30 - Alice: hi\r\n15/01/2024, 10:31 - Bob: yo\r\n";
        let messages = TranscriptParser::new().parse_str(content);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender(), "Alice");
        assert_eq!(messages[1].text(), "yo");
    }

    #[test]
    fn test_month_first_detected() {
        let content = "\
[1/15/24, 10:30:45 AM] Alice: Hello
[1/16/24, 9:00:00 PM] Bob: Hi";
        let messages = TranscriptParser::new().parse_str(content);
        assert_eq!(
            messages[0].datetime().as_datetime(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap())
        );
        assert_eq!(
            messages[1].datetime().as_datetime(),
            Some(Utc.with_ymd_and_hms(2024, 1, 16, 21, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_month_first_decided_after_many_ambiguous_lines() {
        let mut content = "1/5/24, 10:00 - A: hi\n".repeat(25);
        content.push_str("1/13/24, 10:00 - A: later");
        let messages = TranscriptParser::new().parse_str(&content);

        assert_eq!(messages.len(), 26);
        assert_eq!(
            messages[0].datetime().as_datetime(),
            Some(Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap())
        );
        assert_eq!(
            messages[25].datetime().as_datetime(),
            Some(Utc.with_ymd_and_hms(2024, 1, 13, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_detection_disabled_uses_configured_order() {
        let config = TranscriptConfig::new()
            .with_date_order(DateOrder::DayFirst)
            .with_detect_date_order(false);
        let messages =
            TranscriptParser::with_config(config).parse_str("[1/15/24, 10:30:45 AM] Alice: Hello");
        assert!(!messages[0].has_valid_timestamp());
    }

    #[test]
    fn test_parse_named_sets_source() {
        let messages =
            TranscriptParser::new().parse_named("chat/_chat.txt", "15/01/2024, 10:30 - A: b");
        assert_eq!(messages[0].source_file(), Some("chat/_chat.txt"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let content = "15/01/2024, 10:30 - A: b\nmore\n16/01/2024, 11:00 - C: d";
        let parser = TranscriptParser::new();
        assert_eq!(parser.parse_str(content), parser.parse_str(content));
    }
}
