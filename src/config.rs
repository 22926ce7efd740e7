//! Configuration types for parsing, indexing and viewing.
//!
//! Plain builder structs for library usage, without any CLI framework
//! dependencies. All of them are serde-derivable so callers can keep them in
//! their own settings files.
//!
//! - [`TranscriptConfig`] - date order and continuation-line handling
//! - [`ArchiveConfig`] - which archive entries count as transcripts
//! - [`ViewerConfig`] - everything a [`ChatSession`](crate::session::ChatSession) needs
//!
//! # Example
//!
//! ```rust
//! use chatzip::config::{ContinuationPolicy, TranscriptConfig, ViewerConfig};
//! use chatzip::transcript::DateOrder;
//!
//! let transcript = TranscriptConfig::new()
//!     .with_date_order(DateOrder::MonthFirst)
//!     .with_continuation(ContinuationPolicy::Drop);
//!
//! let config = ViewerConfig::new()
//!     .with_transcript(transcript)
//!     .with_owner_name("Alice");
//! ```

use serde::{Deserialize, Serialize};

use crate::media::extension_of;
use crate::transcript::DateOrder;

/// What to do with lines that don't start a new message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContinuationPolicy {
    /// Append to the previous message body, separated by `\n` (default)
    #[default]
    Append,
    /// Drop the line
    Drop,
}

/// Configuration for transcript parsing.
///
/// # Example
///
/// ```rust
/// use chatzip::config::TranscriptConfig;
/// use chatzip::transcript::DateOrder;
///
/// let config = TranscriptConfig::new()
///     .with_date_order(DateOrder::MonthFirst)
///     .with_detect_date_order(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Date order used when detection is off or undecided (default: day-first)
    pub date_order: DateOrder,

    /// Detect the date order from the transcript itself (default: true)
    pub detect_date_order: bool,

    /// Number of decisive stamps that vote during detection (default: 20)
    pub sample_size: usize,

    /// Handling of non-matching lines (default: append)
    pub continuation: ContinuationPolicy,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            date_order: DateOrder::DayFirst,
            detect_date_order: true,
            sample_size: 20,
            continuation: ContinuationPolicy::Append,
        }
    }
}

impl TranscriptConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback date order.
    #[must_use]
    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    /// Enables or disables date order detection.
    #[must_use]
    pub fn with_detect_date_order(mut self, enabled: bool) -> Self {
        self.detect_date_order = enabled;
        self
    }

    /// Sets how many decisive stamps vote during detection.
    #[must_use]
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    /// Sets the continuation line policy.
    #[must_use]
    pub fn with_continuation(mut self, policy: ContinuationPolicy) -> Self {
        self.continuation = policy;
        self
    }
}

/// Configuration for archive indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Lowercase extensions of transcript entries (default: `["txt"]`)
    pub transcript_extensions: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            transcript_extensions: vec!["txt".to_string()],
        }
    }
}

impl ArchiveConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the transcript extensions. Leading dots and case are ignored.
    #[must_use]
    pub fn with_transcript_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.transcript_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    /// Returns `true` if the entry name has a transcript extension.
    pub fn is_transcript(&self, name: &str) -> bool {
        extension_of(name).is_some_and(|ext| self.transcript_extensions.contains(&ext))
    }
}

/// Configuration for a viewing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Transcript parsing settings
    pub transcript: TranscriptConfig,

    /// Archive indexing settings
    pub archive: ArchiveConfig,

    /// Name of the device owner, used to tell own messages apart.
    /// When `None` the most frequent sender is assumed (best effort).
    pub owner_name: Option<String>,
}

impl ViewerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transcript parsing settings.
    #[must_use]
    pub fn with_transcript(mut self, transcript: TranscriptConfig) -> Self {
        self.transcript = transcript;
        self
    }

    /// Sets the archive indexing settings.
    #[must_use]
    pub fn with_archive(mut self, archive: ArchiveConfig) -> Self {
        self.archive = archive;
        self
    }

    /// Sets the owner name explicitly.
    #[must_use]
    pub fn with_owner_name(mut self, name: impl Into<String>) -> Self {
        self.owner_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_config_default() {
        let config = TranscriptConfig::default();
        assert_eq!(config.date_order, DateOrder::DayFirst);
        assert!(config.detect_date_order);
        assert_eq!(config.sample_size, 20);
        assert_eq!(config.continuation, ContinuationPolicy::Append);
    }

    #[test]
    fn test_transcript_config_builder() {
        let config = TranscriptConfig::new()
            .with_date_order(DateOrder::MonthFirst)
            .with_sample_size(5)
            .with_continuation(ContinuationPolicy::Drop);

        assert_eq!(config.date_order, DateOrder::MonthFirst);
        assert_eq!(config.sample_size, 5);
        assert_eq!(config.continuation, ContinuationPolicy::Drop);
    }

    #[test]
    fn test_archive_config_transcripts() {
        let config = ArchiveConfig::default();
        assert!(config.is_transcript("_chat.txt"));
        assert!(config.is_transcript("nested/WhatsApp Chat with Bob.TXT"));
        assert!(!config.is_transcript("IMG-001.jpg"));
        assert!(!config.is_transcript("txt"));
    }

    #[test]
    fn test_archive_config_custom_extensions() {
        let config = ArchiveConfig::new().with_transcript_extensions([".LOG", " txt ", ""]);
        assert_eq!(config.transcript_extensions, vec!["log", "txt"]);
        assert!(config.is_transcript("chat.log"));
    }

    #[test]
    fn test_viewer_config() {
        let config = ViewerConfig::new().with_owner_name("Alice");
        assert_eq!(config.owner_name.as_deref(), Some("Alice"));
        assert_eq!(config.archive, ArchiveConfig::default());
    }

    #[test]
    fn test_config_serde() {
        let json = serde_json::to_string(&TranscriptConfig::default()).unwrap();
        assert!(json.contains("\"continuation\":\"append\""));
        assert!(json.contains("\"date_order\":\"day_first\""));
    }
}
