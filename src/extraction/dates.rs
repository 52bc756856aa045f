//! Lenient calendar-date parsing for dictated dates
//!
//! Accepts month names ("15th of january 2025"), numeric day-first dates
//! ("15/01/2025", "15 1 25") and ISO dates ("2025-01-15").

use chrono::{Datelike, NaiveDate, Utc};

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Year (value, digit count), month, day
type Resolved = (Option<(u32, usize)>, u32, u32);

/// Filler words that may appear inside a spoken date
const SKIP_WORDS: [&str; 7] = ["of", "the", "on", "at", "and", "date", "dated"];

/// Parse free text into an ISO `YYYY-MM-DD` date, day-first.
///
/// A missing year falls back to the current year. Anything without a
/// recognizable day and month returns `None`.
pub fn normalize_date(text: &str) -> Option<String> {
    parse_date(text, Utc::now().year()).map(|d| d.format("%Y-%m-%d").to_string())
}

pub(crate) fn parse_date(text: &str, current_year: i32) -> Option<NaiveDate> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || matches!(c, '/' | '-' | ',' | '.'))
        .filter(|t| !t.is_empty())
        .collect();

    let mut month: Option<u32> = None;
    let mut numbers: Vec<(u32, usize)> = Vec::new();

    for token in tokens {
        if SKIP_WORDS.contains(&token) || weekday(token) {
            continue;
        }
        if let Some(m) = month_number(token) {
            if month.is_some() {
                return None;
            }
            month = Some(m);
            continue;
        }
        let (digits, suffix) = split_ordinal(token)?;
        if !suffix.is_empty() && !matches!(suffix, "st" | "nd" | "rd" | "th") {
            return None;
        }
        let value = digits.parse::<u32>().ok()?;
        numbers.push((value, digits.len()));
    }

    let (year, month, day) = match month {
        Some(m) => resolve_with_month(&numbers, m)?,
        None => resolve_numeric(&numbers)?,
    };

    let year = match year {
        Some((y, width)) => expand_year(y, width, current_year)?,
        None => current_year,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn resolve_with_month(numbers: &[(u32, usize)], month: u32) -> Option<Resolved> {
    match numbers {
        [(d, w)] if *w <= 2 => Some((None, month, *d)),
        [(y, 4), (d, _)] => Some((Some((*y, 4)), month, *d)),
        [(d, _), y] => Some((Some(*y), month, *d)),
        _ => None,
    }
}

fn resolve_numeric(numbers: &[(u32, usize)]) -> Option<Resolved> {
    match numbers {
        // ISO: 2025-01-15
        [(y, 4), (m, _), (d, _)] => Some((Some((*y, 4)), *m, *d)),
        // Day-first, swapping when the first value cannot be a day-first month
        [(a, _), (b, _), y] => {
            if *b > 12 && *a <= 12 {
                Some((Some(*y), *a, *b))
            } else {
                Some((Some(*y), *b, *a))
            }
        }
        [(a, _), (b, _)] => {
            if *b > 12 && *a <= 12 {
                Some((None, *a, *b))
            } else {
                Some((None, *b, *a))
            }
        }
        _ => None,
    }
}

/// Four-digit calendar year, or `None` outside 1..=9999
fn expand_year(year: u32, width: usize, current_year: i32) -> Option<i32> {
    let year = i32::try_from(year).ok()?;
    if width > 2 {
        return (1..=9999).contains(&year).then_some(year);
    }
    // Two-digit years land within fifty years of today
    let century = current_year - current_year % 100;
    let candidate = century + year;
    let expanded = if candidate >= current_year + 50 {
        candidate - 100
    } else if candidate < current_year - 50 {
        candidate + 100
    } else {
        candidate
    };
    Some(expanded)
}

fn month_number(token: &str) -> Option<u32> {
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| *m == token || (token.len() <= 4 && m.starts_with(token)))
        .map(|i| i as u32 + 1)
}

fn weekday(token: &str) -> bool {
    token.len() >= 3 && WEEKDAYS.iter().any(|d| *d == token || d.starts_with(token))
}

fn split_ordinal(token: &str) -> Option<(&str, &str)> {
    let split = token
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len());
    if split == 0 {
        return None;
    }
    Some(token.split_at(split))
}
