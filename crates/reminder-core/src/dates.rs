//! Calendar date keys (`YYYY-MM-DD`) and related helpers.

use chrono::{Datelike, NaiveDate};

/// Format used for every stored date key.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

const WEEKDAY_LABELS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// Parse a date key. Malformed keys yield `None`.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT).ok()
}

/// Format a date as a key.
pub fn format_date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Weekday index with 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Short Korean weekday label for an index.
pub fn weekday_label(index: u8) -> Option<&'static str> {
    WEEKDAY_LABELS.get(index as usize).copied()
}

/// Render a date key for display, e.g. `2024년 1월 10일`.
///
/// Anything that is not three numeric parts is returned unchanged.
pub fn format_display_date(key: &str) -> String {
    let parts: Vec<&str> = key.split('-').collect();
    if parts.len() != 3 {
        return key.to_string();
    }
    match (
        parts[0].parse::<u32>(),
        parts[1].parse::<u32>(),
        parts[2].parse::<u32>(),
    ) {
        (Ok(year), Ok(month), Ok(day)) => format!("{}년 {}월 {}일", year, month, day),
        _ => key.to_string(),
    }
}

/// Inclusive range check with an open end.
pub fn is_between_dates(target: NaiveDate, start: NaiveDate, end: Option<NaiveDate>) -> bool {
    if target < start {
        return false;
    }
    end.map_or(true, |end| target <= end)
}
