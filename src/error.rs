//! Unified error types for chatzip.
//!
//! This module provides a single [`ChatzipError`] enum that covers every
//! failure the library can report.
//!
//! # Error Handling Philosophy
//!
//! - **Archive-level and range-level errors** abort the operation and reach
//!   the caller with a readable cause ([`ChatzipError::ArchiveRead`],
//!   [`ChatzipError::InvalidRange`]).
//! - **Per-attachment errors** ([`ChatzipError::MediaRead`]) are returned by
//!   single-entry reads so callers can mark that attachment unavailable and
//!   keep going.
//! - **Per-message timestamp problems** are not errors at all: the message is
//!   kept with [`Timestamp::Invalid`](crate::message::Timestamp::Invalid).

use std::io;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A specialized [`Result`] type for chatzip operations.
///
/// # Example
///
/// ```rust
/// use chatzip::error::Result;
/// use chatzip::Message;
///
/// fn my_function() -> Result<Vec<Message>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatzipError>;

/// The error type for all chatzip operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatzipError {
    /// An I/O error occurred.
    ///
    /// This typically happens when the input archive doesn't exist or the
    /// output file cannot be written.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The supplied input cannot be opened as a valid archive.
    ///
    /// No partial state is retained when this is returned.
    #[error("Cannot read archive: {source}")]
    ArchiveRead {
        /// The underlying ZIP error
        #[source]
        source: zip::result::ZipError,
    },

    /// The output archive could not be assembled.
    #[error("Cannot write archive: {source}")]
    ArchiveWrite {
        /// The underlying ZIP error
        #[source]
        source: zip::result::ZipError,
    },

    /// The end of a time range precedes its start.
    #[error("Invalid range: end {end} precedes start {start}")]
    InvalidRange {
        /// Requested range start
        start: DateTime<Utc>,
        /// Requested range end
        end: DateTime<Utc>,
    },

    /// A single media entry could not be read.
    ///
    /// Callers treat the attachment as unavailable instead of aborting.
    #[error("Cannot read media '{name}': {source}")]
    MediaRead {
        /// Archive entry name
        name: String,
        /// The underlying ZIP error
        #[source]
        source: zip::result::ZipError,
    },

    /// A session operation needs a loaded archive but none is loaded.
    #[error("No archive loaded")]
    NotLoaded,

    /// A load finished after a newer load had started; its result was discarded.
    #[error("Load of '{name}' was superseded by a newer load")]
    Superseded {
        /// Name of the discarded archive
        name: String,
    },

    /// Invalid date or datetime supplied by the user.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// The content doesn't match the expected structure.
    #[error("Invalid {format} format: {message}")]
    InvalidFormat {
        /// The format that was expected
        format: &'static str,
        /// Description of what's wrong
        message: String,
    },

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[cfg(feature = "json-output")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error in {context}: {source}")]
    Utf8 {
        /// Description of where the error occurred
        context: String,
        /// The underlying UTF-8 error
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl From<std::string::FromUtf8Error> for ChatzipError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ChatzipError::Utf8 {
            context: "output conversion".to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatzipError {
    /// Creates an archive read error.
    pub fn archive_read(source: zip::result::ZipError) -> Self {
        ChatzipError::ArchiveRead { source }
    }

    /// Creates an archive write error.
    pub fn archive_write(source: zip::result::ZipError) -> Self {
        ChatzipError::ArchiveWrite { source }
    }

    /// Creates a media read error for a single entry.
    pub fn media_read(name: impl Into<String>, source: zip::result::ZipError) -> Self {
        ChatzipError::MediaRead {
            name: name.into(),
            source,
        }
    }

    /// Creates an invalid range error.
    pub fn invalid_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        ChatzipError::InvalidRange { start, end }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        ChatzipError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD, YYYY-MM-DDTHH:MM[:SS] or YYYY-MM-DD HH:MM[:SS]",
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(format: &'static str, message: impl Into<String>) -> Self {
        ChatzipError::InvalidFormat {
            format,
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatzipError::Io(_))
    }

    /// Returns `true` if the archive itself could not be opened.
    pub fn is_archive_read(&self) -> bool {
        matches!(self, ChatzipError::ArchiveRead { .. })
    }

    /// Returns `true` if the output archive could not be written.
    pub fn is_archive_write(&self) -> bool {
        matches!(self, ChatzipError::ArchiveWrite { .. })
    }

    /// Returns `true` if this is a range error.
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, ChatzipError::InvalidRange { .. })
    }

    /// Returns `true` if no archive was loaded.
    pub fn is_not_loaded(&self) -> bool {
        matches!(self, ChatzipError::NotLoaded)
    }

    /// Returns `true` if a load was superseded by a newer one.
    pub fn is_superseded(&self) -> bool {
        matches!(self, ChatzipError::Superseded { .. })
    }

    /// Returns `true` if a single media entry failed to read.
    pub fn is_media_read(&self) -> bool {
        matches!(self, ChatzipError::MediaRead { .. })
    }

    /// Returns `true` if this is a date-related error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, ChatzipError::InvalidDate { .. })
    }

    /// Returns `true` if this is an invalid format error.
    pub fn is_invalid_format(&self) -> bool {
        matches!(self, ChatzipError::InvalidFormat { .. })
    }
}
