//! Viewing session over one loaded archive.
//!
//! A [`ChatSession`] owns at most one [`LoadedArchive`]: the archive index
//! (and with it the archive bytes) plus the parsed and linked messages.
//! Loading a new archive releases the previous one first, and
//! [`ChatSession::release`] drops it explicitly. Nothing is shared between
//! sessions.
//!
//! # Example
//!
//! ```no_run
//! use chatzip::filter::FilterConfig;
//! use chatzip::session::ChatSession;
//! use chatzip::split::SplitOptions;
//!
//! # fn main() -> chatzip::Result<()> {
//! let mut session = ChatSession::new();
//! session.load_file("WhatsApp Chat with Bob.zip")?;
//!
//! for msg in session.filter(&FilterConfig::new().with_search("holiday")) {
//!     let side = if session.is_own(msg) { ">" } else { "<" };
//!     println!("{side} {}: {}", msg.sender(), msg.text());
//! }
//!
//! let options = SplitOptions::from_inputs("2024-01-10", "2024-01-20")?;
//! let outcome = session.split(&options)?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::archive::ArchiveIndex;
use crate::config::ViewerConfig;
use crate::error::{ChatzipError, Result};
use crate::filter::{filter_messages, FilterConfig};
use crate::linker::link_messages;
use crate::message::{AttachmentRef, Message};
use crate::progress::ProgressCallback;
use crate::split::{output_file_name, split_index_with_progress, SplitOptions, SplitOutcome};
use crate::transcript::TranscriptParser;

/// An indexed archive with its parsed, linked messages.
///
/// Immutable once built; cloning shares the archive bytes.
#[derive(Debug, Clone)]
pub struct LoadedArchive {
    name: String,
    index: ArchiveIndex,
    messages: Vec<Message>,
    likely_owner: Option<String>,
}

impl LoadedArchive {
    /// Indexes, parses and links an archive.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::ArchiveRead`] if the archive or one of its
    /// transcripts cannot be read.
    pub fn build(
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        config: &ViewerConfig,
    ) -> Result<Self> {
        let name = name.into();
        let index = ArchiveIndex::open_with_config(bytes, &config.archive)?;
        let parser = TranscriptParser::with_config(config.transcript.clone());
        let messages = link_messages(index.parse_messages(&parser)?, &index);
        let likely_owner = rank_senders(&messages)
            .first()
            .map(|(sender, _)| (*sender).to_string());

        tracing::info!(
            archive = name.as_str(),
            messages = messages.len(),
            media = index.len(),
            "loaded archive"
        );
        Ok(Self {
            name,
            index,
            messages,
            likely_owner,
        })
    }

    /// Returns the archive's file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the archive index.
    pub fn index(&self) -> &ArchiveIndex {
        &self.index
    }

    /// Returns all messages in transcript order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most frequent sender, ranked once at build time.
    pub fn likely_owner(&self) -> Option<&str> {
        self.likely_owner.as_deref()
    }
}

/// Ranks senders by message count, most active first.
///
/// Ties keep order of first appearance.
fn rank_senders(messages: &[Message]) -> Vec<(&str, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for msg in messages {
        let count = counts.entry(msg.sender()).or_insert_with(|| {
            order.push(msg.sender());
            0
        });
        *count += 1;
    }
    let mut ranked: Vec<(&str, usize)> = order
        .into_iter()
        .map(|sender| (sender, counts[sender]))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Session owning the currently loaded archive.
#[derive(Debug, Default)]
pub struct ChatSession {
    config: ViewerConfig,
    loaded: Option<LoadedArchive>,
}

impl ChatSession {
    /// Creates an empty session with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty session with custom configuration.
    pub fn with_config(config: ViewerConfig) -> Self {
        Self {
            config,
            loaded: None,
        }
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Loads an archive, releasing the previous one first.
    ///
    /// On failure the session is left empty.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::ArchiveRead`] if the archive cannot be read.
    pub fn load(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<&LoadedArchive> {
        self.release();
        let loaded = LoadedArchive::build(name, bytes, &self.config)?;
        Ok(&*self.loaded.insert(loaded))
    }

    /// Reads an archive from disk and loads it.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::Io`] if the file cannot be read and
    /// [`ChatzipError::ArchiveRead`] if it is not a readable archive.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&LoadedArchive> {
        let path = path.as_ref();
        self.release();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.load(name, bytes)
    }

    /// Installs an archive built elsewhere, releasing the previous one.
    pub fn replace(&mut self, loaded: LoadedArchive) -> &LoadedArchive {
        self.release();
        &*self.loaded.insert(loaded)
    }

    /// Drops the loaded archive and its bytes.
    pub fn release(&mut self) {
        if let Some(previous) = self.loaded.take() {
            tracing::debug!(archive = previous.name(), "released archive");
        }
    }

    /// Returns `true` if an archive is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Returns the loaded archive, if any.
    pub fn archive(&self) -> Option<&LoadedArchive> {
        self.loaded.as_ref()
    }

    fn require(&self) -> Result<&LoadedArchive> {
        self.loaded.as_ref().ok_or(ChatzipError::NotLoaded)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns all messages, or an empty slice when nothing is loaded.
    pub fn messages(&self) -> &[Message] {
        match &self.loaded {
            Some(loaded) => &loaded.messages,
            None => &[],
        }
    }

    /// Returns the messages passing `config`, in transcript order.
    pub fn filter(&self, config: &FilterConfig) -> Vec<&Message> {
        filter_messages(self.messages(), config)
    }

    /// Returns senders with their message counts, most active first.
    ///
    /// Ties keep order of first appearance.
    pub fn sender_counts(&self) -> Vec<(&str, usize)> {
        rank_senders(self.messages())
    }

    /// Returns the distinct senders in order of first appearance.
    pub fn senders(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for msg in self.messages() {
            if !seen.contains(&msg.sender()) {
                seen.push(msg.sender());
            }
        }
        seen
    }

    /// Returns the device owner's name.
    ///
    /// The configured name wins. Otherwise the most frequent sender is
    /// assumed; this is a guess, not something the export records.
    pub fn owner_name(&self) -> Option<&str> {
        if let Some(name) = self.config.owner_name.as_deref() {
            return Some(name);
        }
        self.loaded.as_ref().and_then(LoadedArchive::likely_owner)
    }

    /// Returns `true` if `message` was sent by the owner.
    pub fn is_own(&self, message: &Message) -> bool {
        self.owner_name()
            .is_some_and(|owner| owner == message.sender())
    }

    /// Reads the bytes of one attachment.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::NotLoaded`] without an archive and
    /// [`ChatzipError::MediaRead`] if this attachment is unavailable. Other
    /// attachments are unaffected.
    pub fn attachment_bytes(&self, attachment: &AttachmentRef) -> Result<Vec<u8>> {
        self.require()?.index.read(&attachment.filename)
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Splits the loaded archive.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::NotLoaded`] without an archive and
    /// [`ChatzipError::ArchiveWrite`] if the output cannot be assembled.
    pub fn split(&self, options: &SplitOptions) -> Result<SplitOutcome> {
        self.split_with_progress(options, None)
    }

    /// Splits the loaded archive, reporting progress per written entry.
    ///
    /// # Errors
    ///
    /// Same as [`split`](Self::split).
    pub fn split_with_progress(
        &self,
        options: &SplitOptions,
        progress: Option<&ProgressCallback>,
    ) -> Result<SplitOutcome> {
        let loaded = self.require()?;
        split_index_with_progress(&loaded.index, &loaded.messages, options, progress)
    }

    /// Returns the download name for a split of the loaded archive.
    pub fn split_file_name(&self, options: &SplitOptions) -> Option<String> {
        self.loaded
            .as_ref()
            .map(|loaded| output_file_name(loaded.name(), options.start(), options.end()))
    }
}
