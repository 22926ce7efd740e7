//! Stamp-to-timestamp conversion.
//!
//! Stamps vary by locale: the order of day and month, two or four digit
//! years, 24-hour or 12-hour clocks. Conversion never fails loudly; digits
//! that don't form a real point in time give [`Timestamp::Invalid`].

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::message::Timestamp;

static STAMP_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{1,2})[/.](\d{1,2})[/.](\d{2,4}),? (\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s?([AaPp])[Mm])?$",
    )
    .expect("stamp pattern is valid")
});

/// Order of the first two date components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `D/M/Y` (default)
    #[default]
    DayFirst,
    /// `M/D/Y` (US locale)
    MonthFirst,
}

/// Raw numeric components of a stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StampParts {
    first: u32,
    second: u32,
    year: i32,
    hour: u32,
    minute: u32,
    second_of_minute: u32,
    meridiem: Option<Meridiem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

fn split_stamp(stamp: &str) -> Option<StampParts> {
    let caps = STAMP_PARTS.captures(stamp.trim())?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year_str = caps.get(3)?.as_str();
    let year = expand_year(year_str.parse::<i32>().ok()?, year_str.len());

    Some(StampParts {
        first: num(1)?,
        second: num(2)?,
        year,
        hour: num(4)?,
        minute: num(5)?,
        second_of_minute: num(6).unwrap_or(0),
        meridiem: caps.get(7).map(|m| {
            if m.as_str().eq_ignore_ascii_case("a") {
                Meridiem::Am
            } else {
                Meridiem::Pm
            }
        }),
    })
}

/// Expands a two-digit year: below 50 is 20xx, 50 and above is 19xx.
///
/// Years written with three or four digits are taken literally.
pub fn expand_year(year: i32, digits: usize) -> i32 {
    if digits != 2 {
        return year;
    }
    if year < 50 { 2000 + year } else { 1900 + year }
}

fn to_24_hour(hour: u32, meridiem: Option<Meridiem>) -> Option<u32> {
    match meridiem {
        None => Some(hour),
        Some(_) if !(1..=12).contains(&hour) => None,
        Some(Meridiem::Am) => Some(hour % 12),
        Some(Meridiem::Pm) => Some(hour % 12 + 12),
    }
}

/// Converts a stamp into a [`Timestamp`] using the given date order.
///
/// # Example
///
/// ```
/// use chatzip::transcript::{parse_stamp, DateOrder};
///
/// let ts = parse_stamp("15/1/24 10:30:05", DateOrder::DayFirst);
/// assert_eq!(ts.to_string(), "2024-01-15 10:30:05");
///
/// let bad = parse_stamp("31/02/2024, 10:30", DateOrder::DayFirst);
/// assert!(!bad.is_valid());
/// ```
pub fn parse_stamp(stamp: &str, order: DateOrder) -> Timestamp {
    let Some(parts) = split_stamp(stamp) else {
        return Timestamp::Invalid;
    };

    let (day, month) = match order {
        DateOrder::MonthFirst => (parts.second, parts.first),
        DateOrder::DayFirst => (parts.first, parts.second),
    };

    let date = NaiveDate::from_ymd_opt(parts.year, month, day);
    let time = to_24_hour(parts.hour, parts.meridiem)
        .and_then(|hour| NaiveTime::from_hms_opt(hour, parts.minute, parts.second_of_minute));

    match (date, time) {
        (Some(date), Some(time)) => Timestamp::Valid(date.and_time(time).and_utc()),
        _ => Timestamp::Invalid,
    }
}

/// Returns the date order a single stamp proves, if any.
///
/// A first component above 12 means day-first, a second component above 12
/// means month-first. Stamps like `1/5/24` prove nothing.
pub fn stamp_vote(stamp: &str) -> Option<DateOrder> {
    let parts = split_stamp(stamp)?;
    if parts.first > 12 && parts.second <= 12 {
        Some(DateOrder::DayFirst)
    } else if parts.second > 12 && parts.first <= 12 {
        Some(DateOrder::MonthFirst)
    } else {
        None
    }
}

/// Decides the date order from sample stamps by majority of [`stamp_vote`].
///
/// Returns `None` when the samples are ambiguous.
pub fn detect_date_order<'a>(stamps: impl IntoIterator<Item = &'a str>) -> Option<DateOrder> {
    let mut day_first = 0usize;
    let mut month_first = 0usize;

    for vote in stamps.into_iter().filter_map(stamp_vote) {
        match vote {
            DateOrder::DayFirst => day_first += 1,
            DateOrder::MonthFirst => month_first += 1,
        }
    }

    match day_first.cmp(&month_first) {
        std::cmp::Ordering::Greater => Some(DateOrder::DayFirst),
        std::cmp::Ordering::Less => Some(DateOrder::MonthFirst),
        std::cmp::Ordering::Equal => None,
    }
}
