//! Supported transcript line syntaxes.
//!
//! Each [`LineSyntax`] variant owns an anchored matcher for its stamp prefix
//! and a renderer that rebuilds the line. Adding a transcript dialect means
//! adding one variant here.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stamp grammar shared by all syntaxes: date, optional comma, time,
/// optional seconds and optional 12-hour suffix.
const STAMP: &str = r"\d{1,2}[/.]\d{1,2}[/.]\d{2,4},? \d{1,2}:\d{2}(?::\d{2})?(?:\s?[AaPp][Mm])?";

// [15/1/24 10:30:05] Sender: Body
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\[(?P<stamp>{STAMP})\] (?P<rest>.*)$"))
        .expect("bracketed line pattern is valid")
});

// 15/01/2024, 10:30 - Sender: Body
static DASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?P<stamp>{STAMP}) - (?P<rest>.*)$"))
        .expect("dashed line pattern is valid")
});

// Sender (no colon) followed by ": body" or a bare ":".
static SENDER_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sender>[^:]+)(?:: (?P<text>.*)|:)$").expect("sender pattern is valid")
});

/// A transcript line dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSyntax {
    /// `[D/M/Y H:MM:SS] Sender: Body` (iOS exports; a comma after the date is allowed)
    Bracketed,
    /// `D/M/Y, H:MM - Sender: Body` (Android exports)
    Dashed,
}

/// What follows the sender name on the first line of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// `Sender: body`, also `Sender: ` with an empty body
    #[default]
    Spaced,
    /// `Sender:` with nothing after the colon
    Bare,
}

impl Separator {
    /// Returns the separator text.
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Spaced => ": ",
            Separator::Bare => ":",
        }
    }

    /// Returns `true` for `": "`.
    pub fn is_spaced(&self) -> bool {
        *self == Separator::Spaced
    }
}

/// Sender, separator and body of a stamped line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderPart<'a> {
    pub sender: &'a str,
    pub separator: Separator,
    pub text: &'a str,
}

/// The stamp and remainder of a line that starts like a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampedLine<'a> {
    /// Syntax that matched
    pub syntax: LineSyntax,
    /// Stamp text, verbatim
    pub stamp: &'a str,
    /// Everything after the stamp delimiter
    pub rest: &'a str,
}

impl StampedLine<'_> {
    /// Splits the remainder into sender, separator and body.
    ///
    /// Returns `None` for system lines that carry no `Sender:` part, or
    /// whose sender is blank.
    pub fn sender_part(&self) -> Option<SenderPart<'_>> {
        let caps = SENDER_BODY.captures(self.rest)?;
        let sender = caps.name("sender")?.as_str();
        if sender.trim().is_empty() {
            return None;
        }
        let (separator, text) = match caps.name("text") {
            Some(m) => (Separator::Spaced, m.as_str()),
            None => (Separator::Bare, ""),
        };
        Some(SenderPart {
            sender,
            separator,
            text,
        })
    }

    /// Splits the remainder into sender and body.
    pub fn sender_and_text(&self) -> Option<(&str, &str)> {
        self.sender_part().map(|part| (part.sender, part.text))
    }
}

impl LineSyntax {
    /// Returns all syntaxes in matching order.
    pub fn all() -> &'static [LineSyntax] {
        &[LineSyntax::Bracketed, LineSyntax::Dashed]
    }

    fn regex(self) -> &'static Regex {
        match self {
            LineSyntax::Bracketed => &BRACKETED,
            LineSyntax::Dashed => &DASHED,
        }
    }

    /// Matches the stamp prefix of `line` against this syntax.
    pub fn match_line(self, line: &str) -> Option<StampedLine<'_>> {
        let caps = self.regex().captures(line)?;
        Some(StampedLine {
            syntax: self,
            stamp: caps.name("stamp")?.as_str(),
            rest: caps.name("rest")?.as_str(),
        })
    }

    /// Tries every syntax in order and returns the first match.
    pub fn detect(line: &str) -> Option<StampedLine<'_>> {
        Self::all().iter().find_map(|syntax| syntax.match_line(line))
    }

    /// Rebuilds a line in this syntax.
    pub fn render(self, stamp: &str, sender: &str, separator: Separator, text: &str) -> String {
        let body = format!("{sender}{}{text}", separator.as_str());
        match self {
            LineSyntax::Bracketed => format!("[{stamp}] {body}"),
            LineSyntax::Dashed => format!("{stamp} - {body}"),
        }
    }
}

impl fmt::Display for LineSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSyntax::Bracketed => write!(f, "bracketed"),
            LineSyntax::Dashed => write!(f, "dashed"),
        }
    }
}
