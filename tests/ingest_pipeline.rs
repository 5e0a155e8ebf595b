// tests/ingest_pipeline.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use convention_tracker::ingest::providers::fixture_adapters;
use convention_tracker::ingest::{run_once, run_scrape};
use convention_tracker::{ConventionRecord, SnapshotStore, SourceAdapter};

fn rec(id: &str, date: &str, source: &str) -> ConventionRecord {
    ConventionRecord {
        id: id.into(),
        name: format!("{id} con"),
        location: None,
        date: date.into(),
        url: "https://example.test".into(),
        source: source.into(),
        guests: vec![],
    }
}

struct MockAdapter {
    label: &'static str,
    records: Vec<ConventionRecord>,
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    async fn fetch_latest(&self) -> Result<Vec<ConventionRecord>> {
        Ok(self.records.clone())
    }
    fn parse_document(&self, _html: &str) -> Vec<ConventionRecord> {
        Vec::new()
    }
    fn name(&self) -> &'static str {
        self.label
    }
}

struct FailingAdapter;

#[async_trait]
impl SourceAdapter for FailingAdapter {
    async fn fetch_latest(&self) -> Result<Vec<ConventionRecord>> {
        Err(anyhow!("connection reset"))
    }
    fn parse_document(&self, _html: &str) -> Vec<ConventionRecord> {
        Vec::new()
    }
    fn name(&self) -> &'static str {
        "Failing"
    }
}

#[tokio::test]
async fn failing_source_does_not_abort_the_run() {
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(FailingAdapter),
        Box::new(MockAdapter {
            label: "A",
            records: vec![rec("a", "1 Jan 2026", "A")],
        }),
    ];
    let manual = vec![rec("m", "June 2025", "Manual Entry")];

    let out = run_once(&adapters, &manual).await;
    let ids: Vec<&str> = out.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["a", "m"]);
}

#[tokio::test]
async fn shared_id_keeps_first_adapter_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("data/conventions.json"));
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(MockAdapter {
            label: "A",
            records: vec![rec("x", "12 Jan 2026", "A")],
        }),
        Box::new(MockAdapter {
            label: "B",
            records: vec![rec("x", "12 Jan 2026", "B")],
        }),
    ];

    let snap = run_scrape(&adapters, &[], &store).await.unwrap();
    assert_eq!(snap.count, 1);
    assert_eq!(snap.conventions[0].source, "A");
}

#[tokio::test]
async fn unparseable_dates_sort_last() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("c.json"));
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(MockAdapter {
        label: "A",
        records: vec![
            rec("soon", "sometime soon", "A"),
            rec("jan", "12 Jan 2026", "A"),
            rec("june", "June 2025", "A"),
        ],
    })];

    let snap = run_scrape(&adapters, &[], &store).await.unwrap();
    let ids: Vec<&str> = snap.conventions.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["june", "jan", "soon"]);
}

#[tokio::test]
async fn all_sources_down_still_writes_valid_empty_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("c.json"));
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(FailingAdapter)];

    let snap = run_scrape(&adapters, &[], &store).await.unwrap();
    assert_eq!(snap.count, 0);

    let on_disk = store.try_load().await.unwrap().expect("snapshot written");
    assert!(on_disk.validate().is_ok());
    assert!(on_disk.conventions.is_empty());
}

#[tokio::test]
async fn fixture_run_produces_sorted_deduplicated_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("c.json"));
    let fixtures = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let adapters = fixture_adapters(&fixtures).unwrap();
    assert_eq!(adapters.len(), 4);

    // duplicates the Starfury record: same name + date, so same id
    let manual = vec![ConventionRecord::new(
        "Asylum 30",
        Some("Birmingham, UK".into()),
        "12 Jan 2026",
        "https://twitter.example/asylum",
        "Manual Entry",
    )];

    let snap = run_scrape(&adapters, &manual, &store).await.unwrap();
    assert!(snap.validate().is_ok());
    // creation 1 + starfury 3 + honcon 2 + eventbrite 2
    assert_eq!(snap.count, 8);

    let asylum = snap
        .conventions
        .iter()
        .find(|c| c.id == "asylum-30-12-jan-2026")
        .unwrap();
    assert_eq!(asylum.source, "Starfury Conventions");

    assert_eq!(snap.conventions[0].date, "14 June 2025");
    assert_eq!(snap.conventions.last().unwrap().date, "Tomorrow at 20:00");

    let reread = store.load().await.unwrap();
    assert_eq!(reread, snap);
}
