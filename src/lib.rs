//! # chatzip
//!
//! A Rust library for browsing, searching and splitting WhatsApp-style chat
//! export archives: a ZIP holding one or more plain-text transcripts plus the
//! media files the chat referenced.
//!
//! ## Overview
//!
//! - **Transcript parsing** for the two line syntaxes exports use
//!   (`[stamp] Sender: text` and `stamp - Sender: text`), with day/month
//!   order detection and lossless re-rendering of every accepted line
//! - **Media classification** by filename (image, sticker, document, audio, video)
//! - **Archive indexing** without decompressing media up front
//! - **Linking** attachment markers in message text to archive entries
//! - **Filtering** by text, sender and date range
//! - **Splitting** an archive into a smaller one limited to a time range
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatzip::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut session = ChatSession::new();
//!     session.load_file("WhatsApp Chat with Bob.zip")?;
//!
//!     let filter = FilterConfig::new()
//!         .with_search("holiday")
//!         .with_date_from("2024-01-01")?;
//!     for msg in session.filter(&filter) {
//!         println!("{}", msg.to_line());
//!     }
//!
//!     let options = SplitOptions::from_inputs("2024-01-10", "2024-01-20")?;
//!     let outcome = session.split(&options)?;
//!     if let Some(name) = session.split_file_name(&options) {
//!         std::fs::write(name, outcome.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Working Without an Archive
//!
//! The transcript parser works on plain strings:
//!
//! ```rust
//! use chatzip::TranscriptParser;
//!
//! let line = "[15/01/2024, 10:30:00] Alice: Hello";
//! let messages = TranscriptParser::new().parse_str(line);
//! assert_eq!(messages[0].sender(), "Alice");
//! assert_eq!(messages[0].to_line(), line);
//! ```
//!
//! ## Module Structure
//!
//! - [`transcript`] - line syntaxes, stamp parsing, [`TranscriptParser`]
//! - [`media`] - [`MediaKind`](media::MediaKind) and filename classification
//! - [`archive`] - [`ArchiveIndex`](archive::ArchiveIndex) over the ZIP
//! - [`linker`] - attachment reference extraction and resolution
//! - [`filter`] - [`FilterConfig`](filter::FilterConfig), [`apply_filters`](filter::apply_filters)
//! - [`split`] - [`SplitOptions`](split::SplitOptions), [`split_archive`](split::split_archive)
//! - [`session`] - [`ChatSession`](session::ChatSession) owning the loaded archive
//! - `async_session` - tokio wrapper (feature `async`)
//! - [`config`] - parser, archive and viewer configuration
//! - [`format`] / [`output`] - listing formats (text, CSV, JSON, JSONL)
//! - [`progress`] - progress callbacks for splits
//! - [`error`] - [`ChatzipError`], [`Result`]
//! - [`prelude`] - convenient re-exports

pub mod archive;
#[cfg(feature = "async")]
pub mod async_session;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod linker;
pub mod media;
pub mod message;
pub mod output;
pub mod progress;
pub mod session;
pub mod split;
pub mod transcript;

// Re-export the main types at the crate root for convenience
pub use error::{ChatzipError, Result};
pub use message::{AttachmentRef, Message, Timestamp};
pub use transcript::TranscriptParser;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatzip::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::message::{AttachmentRef, Message, Timestamp};
    pub use crate::media::MediaKind;

    // Error types
    pub use crate::error::{ChatzipError, Result};

    // Parsing
    pub use crate::transcript::{DateOrder, LineSyntax, TranscriptParser};

    // Configuration
    pub use crate::config::{ArchiveConfig, ContinuationPolicy, TranscriptConfig, ViewerConfig};

    // Archive access
    pub use crate::archive::{ArchiveEntry, ArchiveIndex};
    pub use crate::linker::link_messages;

    // Filtering
    pub use crate::filter::{FilterConfig, apply_filters, filter_messages};

    // Splitting
    pub use crate::split::{MediaPolicy, SplitOptions, SplitOutcome, SplitStats, split_archive};

    // Sessions
    pub use crate::session::{ChatSession, LoadedArchive};
    #[cfg(feature = "async")]
    pub use crate::async_session::AsyncChatSession;

    // Output
    pub use crate::format::OutputFormat;
    pub use crate::output::OutputConfig;
    #[cfg(feature = "csv-output")]
    pub use crate::output::{to_csv, write_csv};
    #[cfg(feature = "json-output")]
    pub use crate::output::{to_json, to_jsonl, write_json, write_jsonl};
}
