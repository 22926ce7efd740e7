//! Archive indexing.
//!
//! [`ArchiveIndex`] opens a ZIP chat export held in memory and sorts its
//! entries into transcripts and media. Only the central directory is read
//! while indexing; entry payloads are decompressed on first access.
//!
//! Media are keyed by basename. Two entries with the same basename in
//! different folders collide and the later one wins.
//!
//! # Example
//!
//! ```no_run
//! use chatzip::archive::ArchiveIndex;
//!
//! # fn main() -> chatzip::Result<()> {
//! let bytes = std::fs::read("WhatsApp Chat with Bob.zip")?;
//! let index = ArchiveIndex::open(bytes)?;
//!
//! for name in index.media_names() {
//!     println!("{name}");
//! }
//! let photo = index.read("IMG-20240115-WA0001.jpg")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::config::ArchiveConfig;
use crate::error::{ChatzipError, Result};
use crate::media::{basename, classify, stem_of, MediaKind};
use crate::message::Message;
use crate::transcript::TranscriptParser;

/// Folder macOS adds to archives it creates.
const MACOS_RESOURCE_DIR: &str = "__MACOSX";

/// Handle to one entry of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full path inside the archive
    pub path: String,
    /// Position in the central directory
    pub index: usize,
}

impl ArchiveEntry {
    /// Returns the entry name without directory components.
    pub fn basename(&self) -> &str {
        basename(&self.path)
    }

    /// Returns the media kind of this entry.
    pub fn kind(&self) -> MediaKind {
        classify(&self.path)
    }
}

/// Lazy index over a chat export archive.
///
/// Cloning is cheap: the archive bytes and central directory are shared.
#[derive(Clone)]
pub struct ArchiveIndex {
    archive: ZipArchive<Cursor<Arc<[u8]>>>,
    transcripts: Vec<ArchiveEntry>,
    media: Vec<ArchiveEntry>,
    by_name: HashMap<String, usize>,
    by_stem: HashMap<String, usize>,
    size: usize,
}

impl fmt::Debug for ArchiveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveIndex")
            .field("size", &self.size)
            .field("transcripts", &self.transcripts)
            .field("media", &self.media.len())
            .finish_non_exhaustive()
    }
}

impl ArchiveIndex {
    /// Opens an archive with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::ArchiveRead`] if the bytes are not a readable
    /// ZIP archive.
    pub fn open(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::open_with_config(bytes, &ArchiveConfig::default())
    }

    /// Reads and opens an archive from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::Io`] if the file cannot be read and
    /// [`ChatzipError::ArchiveRead`] if it is not a readable archive.
    pub fn open_file(path: impl AsRef<Path>, config: &ArchiveConfig) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open_with_config(bytes, config)
    }

    /// Opens an archive, classifying entries with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::ArchiveRead`] if the bytes are not a readable
    /// ZIP archive.
    pub fn open_with_config(bytes: impl Into<Arc<[u8]>>, config: &ArchiveConfig) -> Result<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let size = bytes.len();
        let archive = ZipArchive::new(Cursor::new(bytes)).map_err(ChatzipError::archive_read)?;

        let mut transcripts = Vec::new();
        let mut media: Vec<ArchiveEntry> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut by_stem: HashMap<String, usize> = HashMap::new();

        for path in archive.file_names() {
            if is_ignored(path) {
                continue;
            }
            let Some(index) = archive.index_for_name(path) else {
                continue;
            };
            let entry = ArchiveEntry {
                path: path.to_string(),
                index,
            };

            if config.is_transcript(path) {
                tracing::debug!(path, "transcript entry");
                transcripts.push(entry);
                continue;
            }

            let name = entry.basename().to_string();
            let stem = stem_of(&name).to_string();
            let slot = if let Some(&slot) = by_name.get(&name) {
                tracing::debug!(
                    path,
                    replaced = media[slot].path.as_str(),
                    "basename collision, later entry wins"
                );
                media[slot] = entry;
                slot
            } else {
                media.push(entry);
                media.len() - 1
            };
            by_name.insert(name, slot);
            by_stem.insert(stem, slot);
        }

        // zip keeps names in central directory order
        transcripts.sort_by_key(|e| e.index);

        tracing::debug!(
            size,
            transcripts = transcripts.len(),
            media = media.len(),
            "indexed archive"
        );

        Ok(Self {
            archive,
            transcripts,
            media,
            by_name,
            by_stem,
            size,
        })
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the transcript entries in archive order.
    pub fn transcripts(&self) -> &[ArchiveEntry] {
        &self.transcripts
    }

    /// Returns the media entries in archive order.
    pub fn media(&self) -> &[ArchiveEntry] {
        &self.media
    }

    /// Returns the media basenames in archive order.
    pub fn media_names(&self) -> impl Iterator<Item = &str> {
        self.media.iter().map(ArchiveEntry::basename)
    }

    /// Returns the number of indexed media entries.
    pub fn len(&self) -> usize {
        self.media.len()
    }

    /// Returns `true` if the archive holds no media.
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    /// Returns the size of the archive in bytes.
    pub fn archive_size(&self) -> usize {
        self.size
    }

    /// Returns the media entry with this exact basename.
    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.by_name.get(name).map(|&slot| &self.media[slot])
    }

    /// Resolves a referenced filename to a media basename.
    ///
    /// Directory components are dropped first. An exact basename match wins;
    /// otherwise an entry whose name without extension equals the candidate
    /// without extension is returned.
    pub fn resolve(&self, candidate: &str) -> Option<&str> {
        let name = basename(candidate.trim());
        if name.is_empty() {
            return None;
        }
        let slot = self
            .by_name
            .get(name)
            .or_else(|| self.by_stem.get(stem_of(name)))?;
        Some(self.media[*slot].basename())
    }

    // =========================================================================
    // Payload access
    // =========================================================================

    /// Reads the raw bytes of a media entry.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::MediaRead`] if the entry is unknown or its
    /// payload cannot be decompressed. The error concerns only this entry.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry(name)
            .ok_or_else(|| ChatzipError::media_read(name, ZipError::FileNotFound))?;
        self.read_entry(entry)
            .map_err(|source| ChatzipError::media_read(name, source))
    }

    /// Reads and decodes a transcript entry.
    ///
    /// A leading byte order mark is removed. Invalid UTF-8 is replaced
    /// rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::ArchiveRead`] if the payload cannot be read.
    pub fn read_transcript(&self, entry: &ArchiveEntry) -> Result<String> {
        let bytes = self.read_entry(entry).map_err(ChatzipError::archive_read)?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);
        Ok(match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(err) => {
                tracing::warn!(path = entry.path.as_str(), %err, "transcript is not valid UTF-8");
                String::from_utf8_lossy(bytes).into_owned()
            }
        })
    }

    /// Parses every transcript in archive order into one message list.
    ///
    /// Messages carry their transcript path as source file.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::ArchiveRead`] if a transcript cannot be read.
    pub fn parse_messages(&self, parser: &TranscriptParser) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        for entry in &self.transcripts {
            let content = self.read_transcript(entry)?;
            messages.extend(parser.parse_named(&entry.path, &content));
        }
        Ok(messages)
    }

    /// Reads the raw (decompressed) bytes of any entry.
    pub(crate) fn read_entry(&self, entry: &ArchiveEntry) -> std::result::Result<Vec<u8>, ZipError> {
        let mut archive = self.archive.clone();
        let mut file = archive.by_index(entry.index)?;
        let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

fn is_ignored(path: &str) -> bool {
    if path.ends_with('/') || path.ends_with('\\') {
        return true;
    }
    if path
        .split(['/', '\\'])
        .any(|component| component == MACOS_RESOURCE_DIR)
    {
        return true;
    }
    basename(path).starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_open_invalid_bytes() {
        let err = ArchiveIndex::open(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(err.is_archive_read());
    }

    #[test]
    fn test_index_splits_transcripts_and_media() {
        let bytes = build_zip(&[
            ("_chat.txt", b"15/01/2024, 10:30 - A: hi"),
            ("media/", b""),
            ("media/IMG-001.jpg", b"jpeg"),
            ("VID-002.mp4", b"mp4"),
        ]);
        let index = ArchiveIndex::open(bytes).unwrap();
        assert_eq!(index.transcripts().len(), 1);
        assert_eq!(index.transcripts()[0].path, "_chat.txt");
        assert_eq!(index.len(), 2);
        let names: Vec<_> = index.media_names().collect();
        assert_eq!(names, vec!["IMG-001.jpg", "VID-002.mp4"]);
        assert_eq!(index.entry("IMG-001.jpg").unwrap().kind(), MediaKind::Image);
    }

    #[test]
    fn test_ignored_entries() {
        let bytes = build_zip(&[
            ("__MACOSX/._IMG-001.jpg", b"junk"),
            (".DS_Store", b"junk"),
            ("IMG-001.jpg", b"jpeg"),
        ]);
        let index = ArchiveIndex::open(bytes).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.transcripts().is_empty());
    }

    #[test]
    fn test_basename_collision_last_wins() {
        let bytes = build_zip(&[("a/IMG-001.jpg", b"first"), ("b/IMG-001.jpg", b"second")]);
        let index = ArchiveIndex::open(bytes).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.entry("IMG-001.jpg").unwrap().path, "b/IMG-001.jpg");
        assert_eq!(index.read("IMG-001.jpg").unwrap(), b"second");
    }

    #[test]
    fn test_resolve_exact_then_stem() {
        let bytes = build_zip(&[("IMG-001.jpg", b"x"), ("PTT-002.opus", b"y")]);
        let index = ArchiveIndex::open(bytes).unwrap();
        assert_eq!(index.resolve("IMG-001.jpg"), Some("IMG-001.jpg"));
        assert_eq!(index.resolve("some/dir/IMG-001.jpg"), Some("IMG-001.jpg"));
        assert_eq!(index.resolve("IMG-001.jpeg"), Some("IMG-001.jpg"));
        assert_eq!(index.resolve("PTT-002"), Some("PTT-002.opus"));
        assert_eq!(index.resolve("missing.png"), None);
        assert_eq!(index.resolve(""), None);
    }

    #[test]
    fn test_read_missing_is_media_error() {
        let index = ArchiveIndex::open(build_zip(&[("IMG-001.jpg", b"x")])).unwrap();
        let err = index.read("nope.jpg").unwrap_err();
        assert!(err.is_media_read());
    }

    #[test]
    fn test_read_transcript_strips_bom() {
        let bytes = build_zip(&[("_chat.txt", "\u{feff}15/01/2024, 10:30 - A: hi".as_bytes())]);
        let index = ArchiveIndex::open(bytes).unwrap();
        let text = index.read_transcript(&index.transcripts()[0]).unwrap();
        assert!(text.starts_with("15/01/2024"));
    }

    #[test]
    fn test_read_transcript_lossy() {
        let bytes = build_zip(&[("_chat.txt", b"15/01/2024, 10:30 - A: \xff ok")]);
        let index = ArchiveIndex::open(bytes).unwrap();
        let text = index.read_transcript(&index.transcripts()[0]).unwrap();
        assert!(text.ends_with("ok"));
    }

    #[test]
    fn test_parse_messages_concatenates_transcripts() {
        let bytes = build_zip(&[
            ("one.txt", b"15/01/2024, 10:30 - A: first"),
            ("two.txt", b"14/01/2024, 09:00 - B: second"),
        ]);
        let index = ArchiveIndex::open(bytes).unwrap();
        let messages = index.parse_messages(&TranscriptParser::new()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].source_file(), Some("one.txt"));
        assert_eq!(messages[1].source_file(), Some("two.txt"));
    }

    #[test]
    fn test_clone_shares_archive() {
        let index = ArchiveIndex::open(build_zip(&[("IMG-001.jpg", b"x")])).unwrap();
        let copy = index.clone();
        assert_eq!(copy.read("IMG-001.jpg").unwrap(), b"x");
        assert_eq!(index.archive_size(), copy.archive_size());
    }
}
