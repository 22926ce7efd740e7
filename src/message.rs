//! Message type produced by the transcript parser.
//!
//! This module provides [`Message`], one accepted transcript entry, together
//! with [`Timestamp`] (a point in time or the displayable invalid state) and
//! [`AttachmentRef`] (a resolved link to a media entry in the archive).
//!
//! # Overview
//!
//! A message keeps enough of its source line to be re-emitted verbatim:
//! the [`LineSyntax`] it was written in, the original stamp text and the
//! separator after the sender. The parsed [`Timestamp`] is derived from that
//! stamp and is only used for ordering and range checks.
//!
//! # Examples
//!
//! ```
//! use chatzip::transcript::TranscriptParser;
//!
//! let parser = TranscriptParser::new();
//! let msg = parser.parse_line("15/01/2024, 10:30 - John Doe: Hey there").unwrap();
//!
//! assert_eq!(msg.sender(), "John Doe");
//! assert_eq!(msg.text(), "Hey there");
//! assert_eq!(msg.to_line(), "15/01/2024, 10:30 - John Doe: Hey there");
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaKind;
use crate::transcript::{LineSyntax, Separator};

/// Text rendered in place of a timestamp that could not be constructed.
pub const INVALID_DATE: &str = "Invalid Date";

/// The parsed time of a message.
///
/// A transcript line can carry a stamp whose digits don't form a real point
/// in time (month 13, February 30, hour 25). Such messages are kept and
/// marked [`Timestamp::Invalid`] instead of being dropped; an invalid
/// timestamp never satisfies a date bound.
///
/// Serializes as an RFC 3339 string, or `null` when invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<DateTime<Utc>>", into = "Option<DateTime<Utc>>")]
pub enum Timestamp {
    /// A valid point in time.
    Valid(DateTime<Utc>),
    /// The stamp matched the line syntax but its components were out of range.
    Invalid,
}

impl Timestamp {
    /// Returns `true` for a valid point in time.
    pub fn is_valid(&self) -> bool {
        matches!(self, Timestamp::Valid(_))
    }

    /// Returns the datetime, if valid.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Valid(dt) => Some(*dt),
            Timestamp::Invalid => None,
        }
    }

    /// Returns `true` if the timestamp lies in `[start, end]`.
    ///
    /// Always `false` for [`Timestamp::Invalid`].
    pub fn within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.as_datetime()
            .is_some_and(|dt| dt >= start && dt <= end)
    }
}

impl From<Option<DateTime<Utc>>> for Timestamp {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Timestamp::Invalid, Timestamp::Valid)
    }
}

impl From<Timestamp> for Option<DateTime<Utc>> {
    fn from(value: Timestamp) -> Self {
        value.as_datetime()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp::Valid(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Valid(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Timestamp::Invalid => f.write_str(INVALID_DATE),
        }
    }
}

/// A resolved link from a message to a media entry in the archive.
///
/// Holds no bytes: payloads are fetched from the
/// [`ArchiveIndex`](crate::archive::ArchiveIndex) on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Archive basename of the media entry.
    pub filename: String,
    /// Coarse media kind derived from the filename.
    pub kind: MediaKind,
}

impl AttachmentRef {
    /// Creates a reference, classifying the filename.
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let kind = crate::media::classify(&filename);
        Self { filename, kind }
    }

    /// Returns the lowercase extension of the referenced file, if any.
    pub fn extension(&self) -> Option<String> {
        crate::media::extension_of(&self.filename)
    }
}

/// One accepted transcript entry.
///
/// Only lines matching a supported [`LineSyntax`] produce messages. The
/// `text` may contain newlines when continuation lines were appended, and
/// keeps attachment markers verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Parsed time of the message.
    pub datetime: Timestamp,

    /// Display name of the author. Never empty.
    pub sender: String,

    /// Message body, possibly empty.
    pub text: String,

    /// Line syntax the message was written in.
    pub syntax: LineSyntax,

    /// Stamp text exactly as it appeared in the source line.
    pub stamp: String,

    /// Separator written after the sender name.
    #[serde(skip_serializing_if = "Separator::is_spaced")]
    #[serde(default)]
    pub separator: Separator,

    /// Transcript file the message came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub source_file: Option<String>,

    /// Resolved attachments, in order of discovery in `text`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

impl Message {
    /// Creates a message from its parsed parts.
    ///
    /// The separator defaults to a bare `:` when the body is empty or starts
    /// with a newline, and to `": "` otherwise.
    pub fn new(
        syntax: LineSyntax,
        stamp: impl Into<String>,
        datetime: Timestamp,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let separator = if text.is_empty() || text.starts_with('\n') {
            Separator::Bare
        } else {
            Separator::Spaced
        };
        Self {
            datetime,
            sender: sender.into(),
            text,
            syntax,
            stamp: stamp.into(),
            separator,
            source_file: None,
            attachments: Vec::new(),
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Builder method to set the separator after the sender name.
    #[must_use]
    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    /// Builder method to set the source transcript.
    #[must_use]
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    /// Builder method to replace the attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<AttachmentRef>) -> Self {
        self.attachments = attachments;
        self
    }

    // =========================================================================
    // Accessor methods
    // =========================================================================

    /// Returns the sender name.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns the message body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the parsed timestamp.
    pub fn datetime(&self) -> Timestamp {
        self.datetime
    }

    /// Returns the source transcript, if known.
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Returns the resolved attachments.
    pub fn attachments(&self) -> &[AttachmentRef] {
        &self.attachments
    }

    // =========================================================================
    // Utility methods
    // =========================================================================

    /// Returns `true` if the timestamp is a valid point in time.
    pub fn has_valid_timestamp(&self) -> bool {
        self.datetime.is_valid()
    }

    /// Returns `true` if at least one attachment was resolved.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Re-serializes the message in its original line syntax.
    ///
    /// For any accepted line, `parse_line(line).to_line() == line`.
    /// Appended continuation lines are reproduced after the first line.
    pub fn to_line(&self) -> String {
        self.syntax
            .render(&self.stamp, &self.sender, self.separator, &self.text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.datetime, self.sender, self.text)
    }
}
