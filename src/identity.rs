// src/identity.rs
use once_cell::sync::Lazy;
use regex::Regex;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9-]").expect("id charset regex"));

/// Deterministic record id: lower-cased `"{name}-{date}"`, whitespace runs
/// folded into `-`, everything outside `[a-z0-9-]` removed.
///
/// Collisions are possible and resolved by dedup (first seen wins).
pub fn generate_id(name: &str, date: &str) -> String {
    let lowered = format!("{name}-{date}").to_lowercase();
    let hyphenated = RE_WS.replace_all(&lowered, "-");
    RE_DISALLOWED.replace_all(&hyphenated, "").into_owned()
}
