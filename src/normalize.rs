// src/normalize.rs
//! Working set → snapshot order: drop repeated ids, then sort by date.

use std::collections::HashSet;

use crate::convention::ConventionRecord;
use crate::extract::parse_date;

/// Keeps the first record seen for each id (adapter run order decides).
/// Returns the survivors and how many were dropped.
pub fn dedup_by_id(records: Vec<ConventionRecord>) -> (Vec<ConventionRecord>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for r in records {
        if seen.insert(r.id.clone()) {
            kept.push(r);
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}

/// Ascending by parsed date; unparseable dates go last.
/// `sort_by_cached_key` is stable, so ties keep their incoming order.
pub fn sort_chronologically(records: &mut [ConventionRecord]) {
    records.sort_by_cached_key(|r| match parse_date(&r.date) {
        Some(d) => (false, Some(d)),
        None => (true, None),
    });
}

/// Dedup then sort. Returns the normalized list and the dedup count.
pub fn normalize(records: Vec<ConventionRecord>) -> (Vec<ConventionRecord>, usize) {
    let (mut kept, dropped) = dedup_by_id(records);
    sort_chronologically(&mut kept);
    (kept, dropped)
}
