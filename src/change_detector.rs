// src/change_detector.rs
//! Client refresh loop: fetch the published snapshot, diff it against the last
//! one seen, notify about additions, then advance the cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tokio::sync::{mpsc, Mutex};
use tokio::time;

use crate::cache::ClientCache;
use crate::convention::ConventionRecord;
use crate::notify::{Notification, Notifier, Permission};
use crate::remote::SnapshotSource;
use crate::snapshot::SnapshotStore;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30 * 60;

/// Records of `fresh` whose id is absent from `previous`, in `fresh` order.
///
/// An empty `previous` means first run: nothing is reported, so the initial
/// population does not turn into a burst of notifications.
pub fn diff(previous: &[ConventionRecord], fresh: &[ConventionRecord]) -> Vec<ConventionRecord> {
    if previous.is_empty() {
        return Vec::new();
    }
    let seen: HashSet<&str> = previous.iter().map(|c| c.id.as_str()).collect();
    fresh
        .iter()
        .filter(|c| !seen.contains(c.id.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Remote snapshot fetched; cache now holds `conventions`.
    Refreshed {
        conventions: Vec<ConventionRecord>,
        additions: Vec<ConventionRecord>,
    },
    /// Remote unavailable; `conventions` is the best local data. Cache untouched.
    Fallback {
        conventions: Vec<ConventionRecord>,
        reason: String,
    },
    /// Another refresh was already running.
    Skipped,
}

impl RefreshOutcome {
    fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed { .. } => "refreshed",
            RefreshOutcome::Fallback { .. } => "fallback",
            RefreshOutcome::Skipped => "skipped",
        }
    }
}

pub struct Refresher {
    remote: Box<dyn SnapshotSource>,
    cache: ClientCache,
    notifier: Arc<dyn Notifier>,
    baseline: Option<SnapshotStore>,
    // at most one fetch/diff/cache-update sequence at a time
    gate: Mutex<()>,
}

impl Refresher {
    pub fn new(
        remote: Box<dyn SnapshotSource>,
        cache: ClientCache,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            remote,
            cache,
            notifier,
            baseline: None,
            gate: Mutex::new(()),
        }
    }

    /// Bundled snapshot used when both the remote and the cache are empty.
    pub fn with_baseline(mut self, baseline: SnapshotStore) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Runs one refresh unless one is already in flight, in which case the
    /// call returns [`RefreshOutcome::Skipped`] immediately.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::debug!(target: "refresh", "refresh already running, skipping");
            counter!("refresh_total", "outcome" => "skipped").increment(1);
            return RefreshOutcome::Skipped;
        };

        let outcome = self.refresh_locked().await;
        counter!("refresh_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn refresh_locked(&self) -> RefreshOutcome {
        let snapshot = match self.remote.fetch_snapshot().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(
                    target: "refresh",
                    source = %self.remote.describe(),
                    error = %e,
                    "remote snapshot unavailable, using local data"
                );
                return RefreshOutcome::Fallback {
                    conventions: self.local_fallback().await,
                    reason: e.to_string(),
                };
            }
        };

        let previous = self.cache.load().await;
        let additions = diff(&previous.conventions, &snapshot.conventions);
        counter!("refresh_new_total").increment(additions.len() as u64);
        self.deliver(&additions).await;

        // Advance even if delivery failed, so the same additions are not re-reported.
        if let Err(e) = self.cache.store(&snapshot.conventions, Utc::now()).await {
            tracing::warn!(target: "refresh", error = ?e, "cache write failed, previous entry kept");
        }

        tracing::info!(
            target: "refresh",
            total = snapshot.conventions.len(),
            new = additions.len(),
            last_update = %snapshot.last_update,
            "refresh done"
        );
        RefreshOutcome::Refreshed {
            conventions: snapshot.conventions,
            additions,
        }
    }

    async fn local_fallback(&self) -> Vec<ConventionRecord> {
        let cached = self.cache.load().await;
        if !cached.is_empty() {
            return cached.conventions;
        }
        match &self.baseline {
            Some(b) => b.load().await.map(|s| s.conventions).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    async fn deliver(&self, additions: &[ConventionRecord]) {
        if additions.is_empty() {
            return;
        }
        if self.notifier.request_permission().await == Permission::Denied {
            tracing::warn!(
                target: "notify",
                pending = additions.len(),
                "notification permission denied"
            );
            return;
        }
        for c in additions {
            if let Err(e) = self.notifier.notify(&Notification::new_convention(c)).await {
                counter!("notify_errors_total").increment(1);
                tracing::warn!(target: "notify", id = %c.id, error = ?e, "notification failed");
            }
        }
    }
}

/// Timer + manual triggers, both feeding the same serialized `refresh()`.
///
/// The first tick fires immediately. Returns when `shutdown` resolves.
pub async fn run_watch<F>(
    refresher: Arc<Refresher>,
    interval: Duration,
    mut manual: mpsc::Receiver<()>,
    shutdown: F,
) where
    F: std::future::Future<Output = ()>,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    let mut manual_open = true;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(target: "refresh", "watch stopped");
                break;
            }
            _ = ticker.tick() => spawn_refresh(&refresher, "timer"),
            msg = manual.recv(), if manual_open => match msg {
                Some(()) => spawn_refresh(&refresher, "manual"),
                None => manual_open = false,
            },
        }
    }
}

fn spawn_refresh(refresher: &Arc<Refresher>, trigger: &'static str) {
    let r = Arc::clone(refresher);
    tokio::spawn(async move {
        match r.refresh().await {
            RefreshOutcome::Refreshed { additions, .. } if !additions.is_empty() => {
                tracing::info!(target: "refresh", trigger, new = additions.len(), "new conventions");
            }
            RefreshOutcome::Skipped => {
                tracing::debug!(target: "refresh", trigger, "skipped, refresh in progress");
            }
            _ => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, date: &str) -> ConventionRecord {
        ConventionRecord {
            id: id.into(),
            name: id.into(),
            location: None,
            date: date.into(),
            url: "https://x".into(),
            source: "Test".into(),
            guests: vec![],
        }
    }

    #[test]
    fn first_run_reports_nothing() {
        assert!(diff(&[], &[rec("a", "June 2025")]).is_empty());
    }

    #[test]
    fn only_unseen_ids_in_fresh_order() {
        let cache = vec![rec("a-2025-06-01", "June 2025")];
        let fresh = vec![
            rec("c", "1 Aug 2025"),
            rec("a-2025-06-01", "June 2025"),
            rec("b-2025-07-10", "10 July 2025"),
        ];
        let ids: Vec<String> = diff(&cache, &fresh).into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["c", "b-2025-07-10"]);
    }

    #[test]
    fn removals_are_not_additions() {
        let cache = vec![rec("a", "x"), rec("b", "y")];
        assert!(diff(&cache, &[rec("a", "x")]).is_empty());
    }
}
