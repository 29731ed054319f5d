//! Common regex patterns for reading the portal chrome.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // First run of digits, e.g. in "Total records: 23"
    pub static ref FIRST_NUMBER: Regex = Regex::new(r"(\d+)").unwrap();

    // Count followed by a total marker ("23 of", "23 total", Arabic "23 من")
    pub static ref COUNT_BEFORE_TOTAL: Regex = Regex::new(
        r"(?i)(\d+)\s*(?:من|of|total)"
    ).unwrap();

    // Leading integer, as a page-number control renders it
    pub static ref LEADING_INTEGER: Regex = Regex::new(r"^\s*([+-]?\d+)").unwrap();

    // Leading decimal number after thousands separators are removed
    pub static ref LEADING_DECIMAL: Regex = Regex::new(
        r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))"
    ).unwrap();
}

/// First integer found anywhere in `text`.
pub fn first_number(text: &str) -> Option<usize> {
    FIRST_NUMBER
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Count preceding a total marker in free pagination text.
pub fn count_before_total(text: &str) -> Option<usize> {
    COUNT_BEFORE_TOTAL
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Leading integer of `text`, ignoring anything after it.
pub fn leading_integer(text: &str) -> Option<i64> {
    LEADING_INTEGER
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}
