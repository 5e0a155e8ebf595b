// tests/refresh.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::{mpsc, oneshot, Notify};

use convention_tracker::remote::{RemoteError, SnapshotSource};
use convention_tracker::{
    run_watch, ClientCache, ConventionRecord, MemoryKvStore, Notification, Notifier, Permission,
    RefreshOutcome, Refresher, Snapshot, SnapshotStore,
};

fn rec(id: &str) -> ConventionRecord {
    ConventionRecord {
        id: id.into(),
        name: format!("{id} con"),
        location: Some("London, UK".into()),
        date: "12 Jan 2026".into(),
        url: "https://example.test".into(),
        source: "Test".into(),
        guests: vec![],
    }
}

fn ids(v: &[ConventionRecord]) -> Vec<&str> {
    v.iter().map(|c| c.id.as_str()).collect()
}

/// Serves whatever `published` holds; `None` = remote down.
struct MockRemote {
    published: Mutex<Option<Vec<ConventionRecord>>>,
    calls: AtomicUsize,
}

impl MockRemote {
    fn serving(records: Vec<ConventionRecord>) -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Some(records)),
            calls: AtomicUsize::new(0),
        })
    }
    fn down() -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }
    fn publish(&self, records: Vec<ConventionRecord>) {
        *self.published.lock().unwrap() = Some(records);
    }
}

struct SharedRemote(Arc<MockRemote>);

#[async_trait]
impl SnapshotSource for SharedRemote {
    async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError> {
        let published = self.0.published.lock().unwrap().clone();
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        match published {
            Some(v) => Ok(Snapshot::new(v, Utc::now())),
            None => Err(RemoteError::Status(503)),
        }
    }
    fn describe(&self) -> String {
        "mock".into()
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    fail: bool,
    deny: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn request_permission(&self) -> Permission {
        if self.deny {
            Permission::Denied
        } else {
            Permission::Granted
        }
    }
    async fn notify(&self, n: &Notification) -> Result<()> {
        let id = n.payload["convention"]["id"].as_str().unwrap_or_default();
        self.sent.lock().unwrap().push(id.to_string());
        if self.fail {
            Err(anyhow!("push service unavailable"))
        } else {
            Ok(())
        }
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

fn memory_cache() -> ClientCache {
    ClientCache::new(Arc::new(MemoryKvStore::new()))
}

fn refresher(
    remote: &Arc<MockRemote>,
    cache: &ClientCache,
    notifier: &Arc<RecordingNotifier>,
) -> Refresher {
    Refresher::new(
        Box::new(SharedRemote(remote.clone())),
        cache.clone(),
        notifier.clone(),
    )
}

#[tokio::test]
async fn first_run_populates_cache_without_notifying() {
    let remote = MockRemote::serving(vec![rec("a"), rec("b")]);
    let cache = memory_cache();
    let notifier = Arc::new(RecordingNotifier::default());

    let out = refresher(&remote, &cache, &notifier).refresh().await;
    match out {
        RefreshOutcome::Refreshed { conventions, additions } => {
            assert_eq!(ids(&conventions), ["a", "b"]);
            assert!(additions.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(notifier.sent.lock().unwrap().is_empty());

    let entry = cache.load().await;
    assert_eq!(ids(&entry.conventions), ["a", "b"]);
    assert!(entry.last_check.is_some());
}

#[tokio::test]
async fn new_id_is_reported_once() {
    let remote = MockRemote::serving(vec![rec("a")]);
    let cache = memory_cache();
    let notifier = Arc::new(RecordingNotifier::default());
    let r = refresher(&remote, &cache, &notifier);

    r.refresh().await;
    remote.publish(vec![rec("a"), rec("b")]);

    match r.refresh().await {
        RefreshOutcome::Refreshed { additions, .. } => assert_eq!(ids(&additions), ["b"]),
        other => panic!("unexpected {other:?}"),
    }
    // same snapshot again: nothing new
    match r.refresh().await {
        RefreshOutcome::Refreshed { additions, .. } => assert!(additions.is_empty()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(*notifier.sent.lock().unwrap(), ["b"]);
}

#[tokio::test]
async fn failed_delivery_still_advances_cache() {
    let remote = MockRemote::serving(vec![rec("a"), rec("b")]);
    let cache = memory_cache();
    cache.store(&[rec("a")], Utc::now()).await.unwrap();
    let notifier = Arc::new(RecordingNotifier {
        fail: true,
        ..Default::default()
    });
    let r = refresher(&remote, &cache, &notifier);

    assert!(matches!(r.refresh().await, RefreshOutcome::Refreshed { .. }));
    assert_eq!(ids(&cache.load().await.conventions), ["a", "b"]);

    // not retried on the next pass
    r.refresh().await;
    assert_eq!(*notifier.sent.lock().unwrap(), ["b"]);
}

#[tokio::test]
async fn denied_permission_skips_delivery_but_advances_cache() {
    let remote = MockRemote::serving(vec![rec("a"), rec("b")]);
    let cache = memory_cache();
    cache.store(&[rec("a")], Utc::now()).await.unwrap();
    let notifier = Arc::new(RecordingNotifier {
        deny: true,
        ..Default::default()
    });

    match refresher(&remote, &cache, &notifier).refresh().await {
        RefreshOutcome::Refreshed { additions, .. } => assert_eq!(ids(&additions), ["b"]),
        other => panic!("unexpected {other:?}"),
    }
    assert!(notifier.sent.lock().unwrap().is_empty());
    assert_eq!(cache.load().await.conventions.len(), 2);
}

#[tokio::test]
async fn remote_failure_serves_cache_and_leaves_it_untouched() {
    let remote = MockRemote::down();
    let cache = memory_cache();
    let checked_at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
    cache.store(&[rec("a")], checked_at).await.unwrap();
    let notifier = Arc::new(RecordingNotifier::default());

    match refresher(&remote, &cache, &notifier).refresh().await {
        RefreshOutcome::Fallback { conventions, reason } => {
            assert_eq!(ids(&conventions), ["a"]);
            assert!(reason.contains("503"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(cache.last_check().await, Some(checked_at));
}

#[tokio::test]
async fn remote_failure_with_empty_cache_uses_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = SnapshotStore::new(dir.path().join("baseline.json"));
    baseline.save(vec![rec("bundled")]).await.unwrap();

    let remote = MockRemote::down();
    let cache = memory_cache();
    let notifier = Arc::new(RecordingNotifier::default());
    let r = refresher(&remote, &cache, &notifier).with_baseline(baseline);

    match r.refresh().await {
        RefreshOutcome::Fallback { conventions, .. } => assert_eq!(ids(&conventions), ["bundled"]),
        other => panic!("unexpected {other:?}"),
    }
    assert!(cache.load().await.is_empty());
}

/// Blocks inside the fetch until released.
struct SlowRemote {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl SnapshotSource for SlowRemote {
    async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Snapshot::new(vec![rec("a")], Utc::now()))
    }
    fn describe(&self) -> String {
        "slow".into()
    }
}

#[tokio::test]
async fn overlapping_refresh_is_skipped() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let cache = memory_cache();
    let r = Arc::new(Refresher::new(
        Box::new(SlowRemote {
            started: started.clone(),
            release: release.clone(),
        }),
        cache.clone(),
        Arc::new(RecordingNotifier::default()),
    ));

    let first = {
        let r = r.clone();
        tokio::spawn(async move { r.refresh().await })
    };
    started.notified().await;

    assert_eq!(r.refresh().await, RefreshOutcome::Skipped);
    assert!(cache.load().await.is_empty(), "skipped refresh must not write");

    release.notify_one();
    let out = first.await.unwrap();
    assert!(matches!(out, RefreshOutcome::Refreshed { .. }));
    assert_eq!(ids(&cache.load().await.conventions), ["a"]);
}


#[tokio::test]
async fn watch_runs_on_start_and_on_manual_trigger() {
    let remote = MockRemote::serving(vec![rec("a")]);
    let cache = memory_cache();
    let notifier = Arc::new(RecordingNotifier::default());
    let r = Arc::new(refresher(&remote, &cache, &notifier));

    let (tx, rx) = mpsc::channel(1);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let watch = tokio::spawn(run_watch(
        r,
        Duration::from_secs(3600),
        rx,
        async move {
            let _ = stop_rx.await;
        },
    ));

    // first tick is immediate
    tokio::time::timeout(Duration::from_secs(5), async {
        while cache.load().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timer refresh did not run");

    remote.publish(vec![rec("a"), rec("b")]);
    // a trigger landing while the first refresh still holds the gate is skipped
    tokio::time::timeout(Duration::from_secs(5), async {
        while remote.calls.load(Ordering::SeqCst) < 2 {
            let _ = tx.try_send(());
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("manual refresh did not run");

    stop_tx.send(()).unwrap();
    watch.await.unwrap();

    // refresh runs on a spawned task; give it a moment to finish the cache write
    tokio::time::timeout(Duration::from_secs(5), async {
        while cache.load().await.conventions.len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("cache not advanced");
    assert_eq!(*notifier.sent.lock().unwrap(), ["b"]);
}
