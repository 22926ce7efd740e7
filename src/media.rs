//! Media type classification by filename.
//!
//! [`classify`] is a total function: every filename maps to exactly one
//! [`MediaKind`]. Unknown extensions are documents.
//!
//! ```
//! use chatzip::media::{classify, MediaKind};
//!
//! assert_eq!(classify("IMG-20240115-WA0001.jpg"), MediaKind::Image);
//! assert_eq!(classify("STK-20240115-WA0003.webp"), MediaKind::Sticker);
//! assert_eq!(classify("PTT-20240115-WA0002.opus"), MediaKind::Audio);
//! assert_eq!(classify("notes.xyz"), MediaKind::Document);
//! ```

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse kind of a media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Sticker,
    Document,
    Audio,
    Video,
}

impl MediaKind {
    /// Returns the lowercase name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Sticker => "sticker",
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "heic", "heif", "webp"];
const AUDIO_EXTENSIONS: &[&str] = &["opus", "ogg", "mp3", "m4a", "aac", "amr", "wav", "flac"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "3gp", "avi", "mkv", "webm", "m4v"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "csv", "vcf",
    "zip", "rar", "7z", "apk", "epub",
];

/// Extensions a sticker can have. They overlap with images.
const STICKER_EXTENSIONS: &[&str] = &["webp", "png", "gif"];

/// Substrings that mark a file as a sticker (compared lowercase).
const STICKER_MARKERS: &[&str] = &["stk-", "-sticker-", "sticker"];

/// Returns the lowercase extension of a filename, if any.
///
/// ```
/// use chatzip::media::extension_of;
///
/// assert_eq!(extension_of("photo.JPG"), Some("jpg".to_string()));
/// assert_eq!(extension_of("README"), None);
/// assert_eq!(extension_of(".hidden"), None);
/// ```
pub fn extension_of(filename: &str) -> Option<String> {
    let base = basename(filename);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}

/// Strips every directory component (`/` or `\`) from a path.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Returns the basename without its extension.
pub fn stem_of(filename: &str) -> &str {
    let base = basename(filename);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

/// Returns `true` if `ext` (without dot, any case) is a recognised media extension.
pub fn is_media_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    [
        IMAGE_EXTENSIONS,
        AUDIO_EXTENSIONS,
        VIDEO_EXTENSIONS,
        DOCUMENT_EXTENSIONS,
    ]
    .iter()
    .any(|list| list.contains(&ext.as_str()))
}

/// Maps a filename to its [`MediaKind`].
///
/// Extension matching is case-insensitive. A file with an image-like
/// extension is a sticker only if its name also carries a sticker marker.
pub fn classify(filename: &str) -> MediaKind {
    let Some(ext) = extension_of(filename) else {
        return MediaKind::Document;
    };
    let ext = ext.as_str();

    if STICKER_EXTENSIONS.contains(&ext) && has_sticker_marker(filename) {
        return MediaKind::Sticker;
    }
    if IMAGE_EXTENSIONS.contains(&ext) {
        MediaKind::Image
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        MediaKind::Audio
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        MediaKind::Video
    } else {
        MediaKind::Document
    }
}

fn has_sticker_marker(filename: &str) -> bool {
    let lower = basename(filename).to_lowercase();
    STICKER_MARKERS.iter().any(|marker| lower.contains(marker))
}

// IMG-20240115-WA0001.jpg
static ANDROID_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:IMG|VID|AUD|PTT|STK|DOC)-(\d{4})(\d{2})(\d{2})-WA\d+")
        .expect("android media name pattern is valid")
});

// 00000012-PHOTO-2024-01-15-10-30-05.jpg
static IOS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d{8}-[A-Z]+-(\d{4})-(\d{2})-(\d{2})-(\d{2})-(\d{2})-(\d{2})")
        .expect("ios media name pattern is valid")
});

/// Returns the time span encoded in an exported media filename.
///
/// Android names carry a day (`IMG-20240115-WA0001`), giving the span
/// 00:00:00 to 23:59:59 of that day. iOS names carry a second
/// (`00000012-PHOTO-2024-01-15-10-30-05`), giving a zero-length span.
/// Other names carry no time and return `None`.
///
/// ```
/// use chatzip::media::embedded_time_span;
///
/// let (from, to) = embedded_time_span("IMG-20240115-WA0001.jpg").unwrap();
/// assert_eq!(from.to_rfc3339(), "2024-01-15T00:00:00+00:00");
/// assert_eq!(to.to_rfc3339(), "2024-01-15T23:59:59+00:00");
/// assert!(embedded_time_span("holiday.jpg").is_none());
/// ```
pub fn embedded_time_span(filename: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let name = basename(filename);
    let num = |m: Option<regex::Match<'_>>| m?.as_str().parse::<u32>().ok();

    if let Some(caps) = ANDROID_NAME.captures(name) {
        let year = i32::try_from(num(caps.get(1))?).ok()?;
        let date = NaiveDate::from_ymd_opt(year, num(caps.get(2))?, num(caps.get(3))?)?;
        let last = NaiveTime::from_hms_opt(23, 59, 59)?;
        return Some((
            date.and_time(NaiveTime::MIN).and_utc(),
            date.and_time(last).and_utc(),
        ));
    }

    let caps = IOS_NAME.captures(name)?;
    let year = i32::try_from(num(caps.get(1))?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, num(caps.get(2))?, num(caps.get(3))?)?;
    let time = NaiveTime::from_hms_opt(num(caps.get(4))?, num(caps.get(5))?, num(caps.get(6))?)?;
    let at = date.and_time(time).and_utc();
    Some((at, at))
}
