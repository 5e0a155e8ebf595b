// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::convention::{ConventionRecord, Snapshot};
use crate::ingest::types::SourceAdapter;
use crate::normalize::normalize;
use crate::snapshot::SnapshotStore;
use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up in the exposition output).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scrape_records_total",
            "Records extracted per source before dedup."
        );
        describe_counter!(
            "scrape_source_errors_total",
            "Source fetch/parse failures."
        );
        describe_counter!("scrape_dedup_total", "Records dropped as duplicate ids.");
        describe_counter!("scrape_runs_total", "Scheduled scrape runs started.");
        describe_histogram!("scrape_parse_ms", "Per-source document parse time in milliseconds.");
        describe_gauge!("scrape_last_run_ts", "Unix ts when the scrape pipeline last ran.");
        describe_counter!("refresh_total", "Client refreshes by outcome.");
        describe_counter!("refresh_new_total", "Conventions reported as new.");
        describe_counter!("notify_errors_total", "Failed notification deliveries.");
    });
}

/// Clean hand-written text that may carry markup (manual entries pasted from
/// a site): decode entities, strip tags, fold quotes, collapse whitespace.
/// Not for DOM text, see [`crate::html::text`].
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 2000 chars (a manual field is a name or a place)
    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }

    out
}

/// Runs every adapter in order and appends the manual list.
///
/// A failing adapter is logged and contributes nothing; the run continues.
/// Output is the raw working set: unordered, duplicates included.
pub async fn run_once(
    adapters: &[Box<dyn SourceAdapter>],
    manual: &[ConventionRecord],
) -> Vec<ConventionRecord> {
    ensure_metrics_described();

    let mut working = Vec::new();
    for a in adapters {
        match a.fetch_latest().await {
            Ok(mut v) => {
                tracing::info!(target: "ingest", source = a.name(), found = v.len(), "source done");
                working.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, source = a.name(), "source error");
                counter!("scrape_source_errors_total", "source" => a.name()).increment(1);
            }
        }
    }
    working.extend_from_slice(manual);
    working
}

/// Full producer pass: aggregate, normalize, persist.
///
/// Only the final write can fail; an all-sources-down run still saves an
/// empty, valid snapshot.
pub async fn run_scrape(
    adapters: &[Box<dyn SourceAdapter>],
    manual: &[ConventionRecord],
    store: &SnapshotStore,
) -> Result<Snapshot> {
    let working = run_once(adapters, manual).await;
    let raw = working.len();
    let (conventions, dropped) = normalize(working);

    counter!("scrape_dedup_total").increment(dropped as u64);
    gauge!("scrape_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    tracing::info!(
        target: "ingest",
        raw,
        dedup = dropped,
        kept = conventions.len(),
        "working set normalized"
    );

    store.save(conventions).await
}
