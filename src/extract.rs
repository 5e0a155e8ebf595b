// src/extract.rs
//! Heuristic text extractors used by the site adapters, plus the best-effort
//! date parser used for ordering.
//!
//! Table and pattern order is part of the contract: when several entries match
//! the same text, the earliest one wins.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Known cities, matched as lower-case substrings in this order.
pub const KNOWN_LOCATIONS: &[(&str, &str)] = &[
    ("london", "London, UK"),
    ("paris", "Paris, France"),
    ("berlin", "Berlin, Germany"),
    ("rome", "Rome, Italy"),
    ("madrid", "Madrid, Spain"),
    ("amsterdam", "Amsterdam, Netherlands"),
    ("brussels", "Brussels, Belgium"),
    ("birmingham", "Birmingham, UK"),
    ("manchester", "Manchester, UK"),
    ("düsseldorf", "Düsseldorf, Germany"),
    ("dusseldorf", "Düsseldorf, Germany"),
    ("munich", "Munich, Germany"),
    ("barcelona", "Barcelona, Spain"),
];

const MONTH: &str = "(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*";

/// Date patterns in priority order:
/// day + month name + year, numeric d/m/y, month name + day + year, y-m-d.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"(?i)[0-9]{{1,2}}[\s-]+{MONTH}[\s-]+[0-9]{{4}}"),
        r"[0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{4}".to_string(),
        format!(r"(?i){MONTH}\s+[0-9]{{1,2}}[\s,]+[0-9]{{4}}"),
        r"[0-9]{4}[\s-]+[0-9]{1,2}[\s-]+[0-9]{1,2}".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("date pattern"))
    .collect()
});

/// Returns the canonical "City, Country" for the first known city found in `text`.
pub fn extract_location(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    KNOWN_LOCATIONS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, canonical)| (*canonical).to_string())
}

/// Returns the first date-looking substring of `text`, verbatim (trimmed).
pub fn extract_date(text: &str) -> Option<String> {
    DATE_PATTERNS
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

static RE_ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([0-9]{1,2})(?:st|nd|rd|th)\b").expect("ordinal regex"));
static RE_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,./-]+").expect("separator regex"));

/// Tried in order after ordinals are stripped and separators folded to spaces.
/// Numeric forms are day-first. In parsing, `%B` also accepts the abbreviation.
const DATE_FORMATS: &[&str] = &["%d %B %Y", "%B %d %Y", "%d %m %Y", "%Y %m %d"];

/// Best-effort parse of free-form date text into a calendar date.
///
/// Numeric `a/b/yyyy` is read day-first. A bare `Month yyyy` resolves to the
/// first of that month. Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let no_ordinals = RE_ORDINAL.replace_all(s, "$1");
    let cleaned = RE_SEPARATORS.replace_all(&no_ordinals, " ");
    let cleaned = cleaned.trim();

    // chrono's `%d` stops after two digits and `%Y` takes any width, so
    // "June 2025" would read as June 20 of year 25 without the arity check.
    match cleaned.split_whitespace().count() {
        3 => DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok()),
        // "June 2025"
        2 => NaiveDate::parse_from_str(&format!("1 {cleaned}"), "%d %B %Y").ok(),
        _ => None,
    }
}
