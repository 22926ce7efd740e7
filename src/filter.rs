//! Filter messages by text, sender and date range.
//!
//! This module provides [`FilterConfig`] for defining filter criteria and
//! [`apply_filters`] / [`filter_messages`] for narrowing message lists.
//!
//! # Filter Types
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Search | [`with_search`](FilterConfig::with_search) | Substring of sender or text, any case |
//! | Sender | [`with_sender`](FilterConfig::with_sender) | Messages from a specific sender |
//! | Date from | [`with_date_from`](FilterConfig::with_date_from) | Messages on or after date |
//! | Date to | [`with_date_to`](FilterConfig::with_date_to) | Messages on or before date |
//!
//! # Example
//!
//! ```
//! use chatzip::filter::{apply_filters, FilterConfig};
//! use chatzip::transcript::TranscriptParser;
//!
//! # fn main() -> chatzip::Result<()> {
//! let messages = TranscriptParser::new().parse_str(
//!     "05/01/2024, 10:00 - Alice: Lunch?\n\
//!      15/01/2024, 10:30 - Bob: LUNCH sounds good\n\
//!      15/01/2024, 11:00 - Alice: see you",
//! );
//!
//! let config = FilterConfig::new()
//!     .with_search("lunch")
//!     .with_date_from("2024-01-10")?;
//!
//! let filtered = apply_filters(messages, &config);
//! assert_eq!(filtered.len(), 1);
//! assert_eq!(filtered[0].sender(), "Bob");
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - Messages with an invalid timestamp are **excluded** when date filters are active
//! - Bounds are inclusive
//! - Multiple filters are combined with AND logic
//! - Relative order is preserved

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChatzipError, Result};
use crate::message::Message;

/// Which end of a range a user-supplied date describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// Missing components are filled with their smallest value.
    Start,
    /// Missing components are filled with their largest value, so a bare
    /// date covers the whole day.
    End,
}

/// Parses a user-supplied date or datetime.
///
/// Accepted forms: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]` and
/// `YYYY-MM-DD HH:MM[:SS]`. For [`Bound::End`] a bare date means 23:59:59
/// and a time without seconds means second 59 of that minute.
///
/// # Errors
///
/// Returns [`ChatzipError::InvalidDate`] for any other input.
///
/// # Example
///
/// ```
/// use chatzip::filter::{parse_datetime_input, Bound};
///
/// # fn main() -> chatzip::Result<()> {
/// let end = parse_datetime_input("2024-01-20", Bound::End)?;
/// assert_eq!(end.to_rfc3339(), "2024-01-20T23:59:59+00:00");
///
/// let start = parse_datetime_input("2024-01-10T08:15", Bound::Start)?;
/// assert_eq!(start.to_rfc3339(), "2024-01-10T08:15:00+00:00");
/// # Ok(())
/// # }
/// ```
pub fn parse_datetime_input(input: &str, bound: Bound) -> Result<DateTime<Utc>> {
    let input = input.trim();

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    let last_second = match bound {
        Bound::Start => 0,
        Bound::End => 59,
    };
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok((naive + chrono::Duration::seconds(last_second)).and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ChatzipError::invalid_date(input))?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
    };
    Ok(date.and_time(time).and_utc())
}

/// Configuration for filtering messages.
///
/// Filters are combined with AND logic: a message must match all active
/// filters to be included in the result. An empty configuration passes
/// everything through.
///
/// # Examples
///
/// ```
/// use chatzip::filter::FilterConfig;
///
/// # fn main() -> chatzip::Result<()> {
/// let by_text = FilterConfig::new().with_search("holiday");
///
/// let by_date = FilterConfig::new()
///     .with_date_from("2024-01-01")?
///     .with_date_to("2024-12-31")?;
///
/// let combined = FilterConfig::new()
///     .with_sender("Alice")
///     .with_date_from("2024-06-01")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Case-insensitive substring matched against sender or text.
    pub search: Option<String>,

    /// Include only messages from this sender (case-insensitive).
    pub from: Option<String>,

    /// Include only messages on or after this timestamp.
    pub after: Option<DateTime<Utc>>,

    /// Include only messages on or before this timestamp.
    pub before: Option<DateTime<Utc>>,
}

impl FilterConfig {
    /// Creates a new empty filter configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search term. An empty term disables the search filter.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.is_empty()).then_some(term);
        self
    }

    /// Sets the sender filter.
    ///
    /// Matching is exact apart from letter case.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.from = Some(sender.into());
        self
    }

    /// Sets the start bound from user input (inclusive).
    ///
    /// A bare date starts at 00:00:00.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::InvalidDate`] if the format is invalid.
    pub fn with_date_from(mut self, input: &str) -> Result<Self> {
        self.after = Some(parse_datetime_input(input, Bound::Start)?);
        Ok(self)
    }

    /// Sets the end bound from user input (inclusive).
    ///
    /// A bare date ends at 23:59:59.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::InvalidDate`] if the format is invalid.
    pub fn with_date_to(mut self, input: &str) -> Result<Self> {
        self.before = Some(parse_datetime_input(input, Bound::End)?);
        Ok(self)
    }

    /// Sets the start timestamp directly.
    #[must_use]
    pub fn with_after(mut self, dt: DateTime<Utc>) -> Self {
        self.after = Some(dt);
        self
    }

    /// Sets the end timestamp directly.
    #[must_use]
    pub fn with_before(mut self, dt: DateTime<Utc>) -> Self {
        self.before = Some(dt);
        self
    }

    /// Returns `true` if any filter is active.
    pub fn is_active(&self) -> bool {
        self.search.is_some() || self.from.is_some() || self.has_date_filter()
    }

    /// Returns `true` if date filters are active.
    pub fn has_date_filter(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    /// Returns `true` if the sender filter is active.
    pub fn has_sender_filter(&self) -> bool {
        self.from.is_some()
    }

    /// Returns `true` if `message` passes every active filter.
    pub fn matches(&self, message: &Message) -> bool {
        Matcher::new(self).matches(message)
    }
}

/// Filter criteria with search terms lowercased once.
struct Matcher<'a> {
    config: &'a FilterConfig,
    search: Option<String>,
    from: Option<String>,
}

impl<'a> Matcher<'a> {
    fn new(config: &'a FilterConfig) -> Self {
        Self {
            config,
            search: config.search.as_deref().map(str::to_lowercase),
            from: config.from.as_deref().map(str::to_lowercase),
        }
    }

    fn matches(&self, msg: &Message) -> bool {
        if let Some(ref from) = self.from {
            if msg.sender.to_lowercase() != *from {
                return false;
            }
        }

        if let Some(ref term) = self.search {
            if !msg.sender.to_lowercase().contains(term.as_str())
                && !msg.text.to_lowercase().contains(term.as_str())
            {
                return false;
            }
        }

        if self.config.has_date_filter() {
            // invalid timestamps can never satisfy a bound
            let Some(ts) = msg.datetime.as_datetime() else {
                return false;
            };
            if self.config.after.is_some_and(|after| ts < after) {
                return false;
            }
            if self.config.before.is_some_and(|before| ts > before) {
                return false;
            }
        }

        true
    }
}

/// Filters a collection of messages, consuming it.
///
/// If no filters are active, returns the original messages unchanged.
pub fn apply_filters(messages: Vec<Message>, config: &FilterConfig) -> Vec<Message> {
    if !config.is_active() {
        return messages;
    }
    let matcher = Matcher::new(config);
    messages.into_iter().filter(|msg| matcher.matches(msg)).collect()
}

/// Filters a borrowed message list, returning references in original order.
pub fn filter_messages<'m>(messages: &'m [Message], config: &FilterConfig) -> Vec<&'m Message> {
    let matcher = Matcher::new(config);
    messages.iter().filter(|msg| matcher.matches(msg)).collect()
}
