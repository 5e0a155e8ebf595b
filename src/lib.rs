// src/lib.rs
// Public library surface for the CLI, the demo bin and integration tests.

// Data model + field extraction
pub mod convention;
pub mod extract;
pub mod html;
pub mod identity;

// Producer: scrape -> normalize -> snapshot
pub mod ingest;
pub mod normalize;
pub mod snapshot;

// Client: remote snapshot -> diff -> notify -> cache
pub mod cache;
pub mod change_detector;
pub mod notify;
pub mod remote;

pub mod config;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::cache::{ClientCache, FileKvStore, KeyValueStore, MemoryKvStore};
pub use crate::change_detector::{diff, run_watch, RefreshOutcome, Refresher};
pub use crate::config::AppConfig;
pub use crate::convention::{CacheEntry, ConventionRecord, Snapshot};
pub use crate::identity::generate_id;
pub use crate::ingest::types::SourceAdapter;
pub use crate::notify::{Notification, Notifier, NotifierMux, Permission};
pub use crate::snapshot::SnapshotStore;
