// src/ingest/scheduler.rs
use crate::convention::ConventionRecord;
use crate::ingest::types::SourceAdapter;
use crate::snapshot::SnapshotStore;
use metrics::counter;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug)]
pub struct ScrapeSchedulerCfg {
    pub interval_secs: u64,
}

/// Re-runs the producer pipeline every `interval_secs` (first run immediately).
/// A failed run is logged; the previous snapshot stays in place.
pub fn spawn_scrape_scheduler(
    cfg: ScrapeSchedulerCfg,
    adapters: Vec<Box<dyn SourceAdapter>>,
    manual: Vec<ConventionRecord>,
    store: SnapshotStore,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            counter!("scrape_runs_total").increment(1);

            match crate::ingest::run_scrape(&adapters, &manual, &store).await {
                Ok(snap) => tracing::info!(
                    target: "ingest",
                    count = snap.count,
                    "scheduled scrape tick"
                ),
                Err(e) => tracing::warn!(target: "ingest", error = ?e, "scheduled scrape failed"),
            }
        }
    })
}
