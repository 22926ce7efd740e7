//! Time-bounded archive splitting.
//!
//! Rebuilds a new ZIP archive holding only the messages of a time range,
//! their media, or both. Selected transcript lines are re-emitted in their
//! original syntax; media bytes are copied unmodified.
//!
//! # Example
//!
//! ```no_run
//! use chatzip::split::{output_file_name, split_archive, SplitOptions};
//! use chatzip::filter::{parse_datetime_input, Bound};
//!
//! # fn main() -> chatzip::Result<()> {
//! let bytes = std::fs::read("WhatsApp Chat with Bob.zip")?;
//!
//! let options = SplitOptions::new(
//!     parse_datetime_input("2024-01-10", Bound::Start)?,
//!     parse_datetime_input("2024-01-20", Bound::End)?,
//! )?
//! .with_media_extensions(["jpg", "png"]);
//!
//! let outcome = split_archive(bytes, &options)?;
//! if outcome.stats.is_empty_selection() {
//!     eprintln!("no messages in range");
//! }
//! let name = output_file_name("WhatsApp Chat with Bob.zip", options.start(), options.end());
//! std::fs::write(name, outcome.bytes)?;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::io::{Cursor, Seek, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::{ArchiveEntry, ArchiveIndex};
use crate::error::{ChatzipError, Result};
use crate::filter::{parse_datetime_input, Bound};
use crate::linker::link_messages;
use crate::media::{basename, embedded_time_span, extension_of};
use crate::message::Message;
use crate::progress::{Progress, ProgressCallback};
use crate::transcript::TranscriptParser;

/// Transcript path used for messages that carry no source file.
pub const DEFAULT_TRANSCRIPT_NAME: &str = "_chat.txt";

/// Which media go into a split when media are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaPolicy {
    /// Only media referenced by a selected message (default)
    #[default]
    Linked,
    /// Linked media plus media whose filename date falls in the range
    InRange,
    /// Every media entry in the archive
    All,
}

/// Parses a comma-separated extension list.
///
/// Entries are trimmed, lowercased and stripped of a leading dot. Empty
/// entries are dropped; an empty result means no restriction.
///
/// ```
/// use chatzip::split::parse_extension_list;
///
/// let exts = parse_extension_list("jpg, .PNG,,mp4").unwrap();
/// assert_eq!(exts.into_iter().collect::<Vec<_>>(), vec!["jpg", "mp4", "png"]);
/// assert!(parse_extension_list(" , ").is_none());
/// ```
pub fn parse_extension_list(input: &str) -> Option<BTreeSet<String>> {
    normalize_extensions(input.split(','))
}

fn normalize_extensions<I, S>(extensions: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = extensions
        .into_iter()
        .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    (!set.is_empty()).then_some(set)
}

/// Options for one split operation.
///
/// The range is validated on construction, so an instance always satisfies
/// `start <= end`. Fields are private; builders return modified copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    include_chat_text: bool,
    include_media: bool,
    media_extensions: Option<BTreeSet<String>>,
    media_policy: MediaPolicy,
}

impl SplitOptions {
    /// Creates options for the inclusive range `[start, end]`.
    ///
    /// Chat text and media are both included by default.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::InvalidRange`] if `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(ChatzipError::invalid_range(start, end));
        }
        Ok(Self {
            start,
            end,
            include_chat_text: true,
            include_media: true,
            media_extensions: None,
            media_policy: MediaPolicy::default(),
        })
    }

    /// Creates options from user input such as `2024-01-10` or `2024-01-10T08:00`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::InvalidDate`] for unparseable input and
    /// [`ChatzipError::InvalidRange`] if the end precedes the start.
    pub fn from_inputs(start: &str, end: &str) -> Result<Self> {
        Self::new(
            parse_datetime_input(start, Bound::Start)?,
            parse_datetime_input(end, Bound::End)?,
        )
    }

    /// Includes or excludes the chat transcript.
    #[must_use]
    pub fn with_chat_text(mut self, include: bool) -> Self {
        self.include_chat_text = include;
        self
    }

    /// Includes or excludes media.
    #[must_use]
    pub fn with_media(mut self, include: bool) -> Self {
        self.include_media = include;
        self
    }

    /// Restricts media to these extensions. An empty list removes the restriction.
    #[must_use]
    pub fn with_media_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.media_extensions = normalize_extensions(extensions);
        self
    }

    /// Sets which media are eligible.
    #[must_use]
    pub fn with_media_policy(mut self, policy: MediaPolicy) -> Self {
        self.media_policy = policy;
        self
    }

    /// Returns the inclusive start of the range.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the inclusive end of the range.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` if the transcript is written.
    pub fn include_chat_text(&self) -> bool {
        self.include_chat_text
    }

    /// Returns `true` if media are written.
    pub fn include_media(&self) -> bool {
        self.include_media
    }

    /// Returns the extension allow-list, if any.
    pub fn media_extensions(&self) -> Option<&BTreeSet<String>> {
        self.media_extensions.as_ref()
    }

    /// Returns the media policy.
    pub fn media_policy(&self) -> MediaPolicy {
        self.media_policy
    }

    /// Returns `true` if the allow-list admits this filename.
    pub fn allows_extension(&self, filename: &str) -> bool {
        match &self.media_extensions {
            None => true,
            Some(allowed) => extension_of(filename).is_some_and(|ext| allowed.contains(&ext)),
        }
    }

    /// Returns `true` if `message` falls inside the range.
    pub fn selects(&self, message: &Message) -> bool {
        message.datetime.within(self.start, self.end)
    }
}

/// Why a media entry was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    /// The extension is not in the allow-list.
    ExtensionNotAllowed,
    /// The payload could not be read; carries the error text.
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExtensionNotAllowed => f.write_str("extension not allowed"),
            SkipReason::Unreadable(err) => write!(f, "unreadable ({err})"),
        }
    }
}

/// A media entry that was eligible but not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMedia {
    /// Media basename
    pub name: String,
    /// Why it was skipped
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Summary of a split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitStats {
    /// Messages inside the range
    pub selected_messages: usize,
    /// Transcript entries written
    pub transcripts_written: usize,
    /// Media entries written
    pub media_written: usize,
    /// Uncompressed bytes written across all entries
    pub bytes_written: u64,
    /// Eligible media that were left out
    pub skipped_media: Vec<SkippedMedia>,
}

impl SplitStats {
    /// Returns `true` if no message fell inside the range.
    ///
    /// The archive is still valid; callers may want to warn the user.
    pub fn is_empty_selection(&self) -> bool {
        self.selected_messages == 0
    }

    /// Returns the number of entries in the output archive.
    pub fn entries_written(&self) -> usize {
        self.transcripts_written + self.media_written
    }
}

/// The output archive and what went into it.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// Bytes of the new ZIP archive
    pub bytes: Vec<u8>,
    /// Summary of the split
    pub stats: SplitStats,
}

/// Builds the download name `<base>-split-<YYYYMMDDHHMM>-<YYYYMMDDHHMM>.zip`.
///
/// ```
/// use chatzip::split::output_file_name;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2024, 1, 20, 23, 59, 59).unwrap();
/// assert_eq!(
///     output_file_name("exports/Chat with Bob.ZIP", start, end),
///     "Chat with Bob-split-202401100000-202401202359.zip"
/// );
/// ```
pub fn output_file_name(original: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let name = basename(original);
    let base = match name.len().checked_sub(4) {
        Some(split) if name.get(split..).is_some_and(|ext| ext.eq_ignore_ascii_case(".zip")) => {
            &name[..split]
        }
        _ => name,
    };
    format!(
        "{base}-split-{}-{}.zip",
        start.format("%Y%m%d%H%M"),
        end.format("%Y%m%d%H%M")
    )
}

/// Splits an archive held in memory.
///
/// Transcripts are parsed with default settings and linked against the
/// archive's own media.
///
/// # Errors
///
/// Returns [`ChatzipError::ArchiveRead`] if the source archive cannot be
/// opened or a transcript cannot be read.
pub fn split_archive(bytes: impl Into<Arc<[u8]>>, options: &SplitOptions) -> Result<SplitOutcome> {
    let index = ArchiveIndex::open(bytes)?;
    let messages = index.parse_messages(&TranscriptParser::new())?;
    let messages = link_messages(messages, &index);
    split_index(&index, &messages, options)
}

/// Splits an already indexed and linked archive.
///
/// # Errors
///
/// Returns [`ChatzipError::ArchiveWrite`] if the output archive cannot be
/// assembled. Unreadable media are skipped and reported in the stats.
pub fn split_index(
    index: &ArchiveIndex,
    messages: &[Message],
    options: &SplitOptions,
) -> Result<SplitOutcome> {
    split_index_with_progress(index, messages, options, None)
}

/// Like [`split_index`], reporting progress after each written entry.
///
/// # Errors
///
/// Returns [`ChatzipError::ArchiveWrite`] if the output archive cannot be
/// assembled.
pub fn split_index_with_progress(
    index: &ArchiveIndex,
    messages: &[Message],
    options: &SplitOptions,
    progress: Option<&ProgressCallback>,
) -> Result<SplitOutcome> {
    let selected: Vec<&Message> = messages.iter().filter(|m| options.selects(m)).collect();
    let mut stats = SplitStats {
        selected_messages: selected.len(),
        ..SplitStats::default()
    };

    let transcripts = if options.include_chat_text {
        group_by_transcript(&selected)
    } else {
        Vec::new()
    };
    let media = if options.include_media {
        plan_media(index, &selected, options, &mut stats)
    } else {
        Vec::new()
    };

    let total_items = transcripts.len() + media.len();
    let report = |stats: &SplitStats| {
        if let Some(callback) = progress {
            callback(
                Progress::new(stats.bytes_written, None, stats.entries_written())
                    .with_items(total_items),
            );
        }
    };

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let text_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let media_options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (path, lines) in &transcripts {
        let content = lines.join("\n");
        write_entry(&mut writer, path, text_options, content.as_bytes())?;
        stats.transcripts_written += 1;
        stats.bytes_written += content.len() as u64;
        tracing::debug!(path = path.as_str(), lines = lines.len(), "wrote transcript");
        report(&stats);
    }

    for entry in media {
        let data = match index.read_entry(entry) {
            Ok(data) => data,
            Err(err) => {
                let err = ChatzipError::media_read(entry.basename(), err);
                tracing::warn!(%err, "skipping unreadable media");
                stats.skipped_media.push(SkippedMedia {
                    name: entry.basename().to_string(),
                    reason: SkipReason::Unreadable(err.to_string()),
                });
                continue;
            }
        };
        write_entry(&mut writer, &entry.path, media_options, &data)?;
        stats.media_written += 1;
        stats.bytes_written += data.len() as u64;
        tracing::debug!(path = entry.path.as_str(), size = data.len(), "copied media");
        report(&stats);
    }

    let bytes = writer
        .finish()
        .map_err(ChatzipError::archive_write)?
        .into_inner();

    tracing::info!(
        selected = stats.selected_messages,
        transcripts = stats.transcripts_written,
        media = stats.media_written,
        skipped = stats.skipped_media.len(),
        size = bytes.len(),
        "split archive"
    );

    Ok(SplitOutcome { bytes, stats })
}

/// Adds one entry to the output archive.
///
/// Every failure maps to [`ChatzipError::ArchiveWrite`].
fn write_entry<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    path: &str,
    options: SimpleFileOptions,
    data: &[u8],
) -> Result<()> {
    writer
        .start_file(path, options)
        .map_err(ChatzipError::archive_write)?;
    writer
        .write_all(data)
        .map_err(|err| ChatzipError::archive_write(err.into()))
}

/// Groups selected lines by transcript, in order of first appearance.
fn group_by_transcript(selected: &[&Message]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for message in selected {
        let path = message.source_file().unwrap_or(DEFAULT_TRANSCRIPT_NAME);
        let line = message.to_line();
        match groups.iter_mut().find(|(p, _)| p == path) {
            Some((_, lines)) => lines.push(line),
            None => groups.push((path.to_string(), vec![line])),
        }
    }
    groups
}

/// Decides which media entries to copy, recording allow-list rejections.
fn plan_media<'i>(
    index: &'i ArchiveIndex,
    selected: &[&Message],
    options: &SplitOptions,
    stats: &mut SplitStats,
) -> Vec<&'i ArchiveEntry> {
    let linked = selected
        .iter()
        .flat_map(|m| m.attachments())
        .filter_map(|attachment| index.entry(&attachment.filename));

    let candidates: Vec<&ArchiveEntry> = match options.media_policy {
        MediaPolicy::Linked => linked.collect(),
        MediaPolicy::InRange => {
            let dated = index.media().iter().filter(|entry| {
                embedded_time_span(&entry.path)
                    .is_some_and(|(from, to)| from <= options.end && to >= options.start)
            });
            linked.chain(dated).collect()
        }
        MediaPolicy::All => index.media().iter().collect(),
    };

    let mut seen = HashSet::new();
    let mut planned = Vec::new();
    for entry in candidates {
        if !seen.insert(entry.index) {
            continue;
        }
        if options.allows_extension(entry.basename()) {
            planned.push(entry);
        } else {
            stats.skipped_media.push(SkippedMedia {
                name: entry.basename().to_string(),
                reason: SkipReason::ExtensionNotAllowed,
            });
        }
    }
    planned
}
