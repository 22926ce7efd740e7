//! Message-to-media linking.
//!
//! Scans message bodies for attachment references and resolves them against
//! an [`ArchiveIndex`]. Recognised references, found left to right in one
//! pass:
//!
//! - tags: `<attached: NAME>` and `<attached file: NAME>`
//! - annotations: `NAME (file attached)` at the start of a line
//! - export naming conventions: `IMG-20240115-WA0001`,
//!   `00000012-PHOTO-2024-01-15-10-30-05`, with or without extension
//! - any other token ending in a recognised media extension
//!
//! Message text is never modified; only `attachments` is filled in.
//!
//! # Example
//!
//! ```
//! use chatzip::linker::extract_references;
//!
//! let refs = extract_references("<attached: 00000012-PHOTO-2024-01-15-10-30-05.jpg> and clip.mp4");
//! assert_eq!(refs, vec!["00000012-PHOTO-2024-01-15-10-30-05.jpg", "clip.mp4"]);
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::archive::ArchiveIndex;
use crate::media::{basename, is_media_extension};
use crate::message::{AttachmentRef, Message};

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    let suffixes: Vec<String> = ANNOTATION_SUFFIXES.iter().map(|s| regex::escape(s)).collect();
    let annotated = format!(r"|^(?P<annotated>[^\n]+? (?:{}))", suffixes.join("|"));
    Regex::new(&[
        r"(?mi)",
        r"<attached(?: file)?:\s*(?P<tag>[^>]+?)\s*>",
        annotated.as_str(),
        r"|\b(?P<named>(?:IMG|VID|AUD|PTT|STK|DOC)-\d{8}-WA\d{4,}(?:\.[A-Za-z0-9]{1,5})?",
        r"|\d{8}-(?:PHOTO|VIDEO|AUDIO|STICKER|GIF|DOCUMENT)-\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}(?:\.[A-Za-z0-9]{1,5})?)\b",
        r#"|(?P<token>[^\s<>"'()\[\]{},;:]+\.(?P<ext>[A-Za-z0-9]{2,5}))\b"#,
    ]
    .concat())
    .expect("reference pattern is valid")
});

/// Annotation suffixes some exporters append after a filename.
const ANNOTATION_SUFFIXES: &[&str] = &["(file attached)", "(archivo adjunto)", "(arquivo anexado)"];

/// Removes a trailing annotation such as `(file attached)`.
pub fn strip_annotation(candidate: &str) -> &str {
    let trimmed = candidate.trim();
    for suffix in ANNOTATION_SUFFIXES {
        let Some(split) = trimmed.len().checked_sub(suffix.len()) else {
            continue;
        };
        if trimmed
            .get(split..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
        {
            return trimmed[..split].trim_end();
        }
    }
    trimmed
}

fn candidate_of<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    if let Some(m) = caps.name("tag").or_else(|| caps.name("named")) {
        return Some(m.as_str());
    }
    if let Some(m) = caps.name("annotated") {
        return Some(strip_annotation(m.as_str()));
    }
    let token = caps.name("token")?;
    let ext = caps.name("ext")?;
    is_media_extension(ext.as_str()).then_some(token.as_str())
}

/// Returns every attachment reference in `text`, in order of appearance.
///
/// Candidates are stripped of annotations but not resolved; the same name
/// can appear more than once.
pub fn extract_references(text: &str) -> Vec<&str> {
    REFERENCE
        .captures_iter(text)
        .filter_map(|caps| candidate_of(&caps))
        .filter(|candidate| !candidate.is_empty())
        .collect()
}

/// Resolves the references of one message.
///
/// Repeated references to the same archive entry yield one attachment.
/// References that don't resolve are skipped.
pub fn resolve_attachments(text: &str, index: &ArchiveIndex) -> Vec<AttachmentRef> {
    let mut seen = HashSet::new();
    let mut attachments = Vec::new();

    for candidate in extract_references(text) {
        let resolved = index.resolve(candidate).or_else(|| {
            // annotated captures may carry leading words
            let last = candidate.split_whitespace().last()?;
            (last != candidate).then(|| index.resolve(last)).flatten()
        });
        match resolved {
            Some(name) => {
                if seen.insert(name.to_string()) {
                    attachments.push(AttachmentRef::new(name));
                }
            }
            None => tracing::debug!(candidate = basename(candidate), "unresolved attachment reference"),
        }
    }

    attachments
}

/// Links one message, replacing its attachments.
pub fn link_message(mut message: Message, index: &ArchiveIndex) -> Message {
    message.attachments = resolve_attachments(&message.text, index);
    message
}

/// Links every message against the index.
///
/// Order and text are preserved; messages without resolvable references
/// come back with no attachments.
pub fn link_messages(messages: Vec<Message>, index: &ArchiveIndex) -> Vec<Message> {
    let linked: Vec<Message> = messages
        .into_iter()
        .map(|message| link_message(message, index))
        .collect();

    tracing::debug!(
        messages = linked.len(),
        with_attachments = linked.iter().filter(|m| m.has_attachments()).count(),
        "linked messages to media"
    );
    linked
}
