// src/cache.rs
//! Client-side persistence: a small key-value capability plus the typed cache
//! of "last seen conventions" built on top of it.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::fs;

use crate::convention::{CacheEntry, ConventionRecord};
use crate::snapshot::write_atomic;

pub const CONVENTIONS_KEY: &str = "@supernatural_conventions";
pub const LAST_CHECK_KEY: &str = "@last_check_timestamp";

/// Persisted string store.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    /// All entries land together or none do.
    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<()>;
}

/// Whole store kept in one JSON object file, rewritten atomically on every write.
pub struct FileKvStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    write_lock: tokio::sync::Mutex<()>,
}

impl FileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Raw file body; a missing file is `None`, any other I/O failure an error.
    async fn read_raw(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn parse(&self, raw: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_raw().await? {
            Some(raw) => self.parse(&raw),
            None => Ok(BTreeMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.set_many(vec![(key.to_string(), value)]).await
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        // Bad JSON is replaced; an unreadable file is an error so no keys get dropped.
        let mut all = match self.read_raw().await? {
            Some(raw) => self.parse(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = ?e, "cache file corrupt, starting fresh");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        all.extend(entries);
        let body = serde_json::to_vec_pretty(&all).context("serializing cache")?;
        write_atomic(&self.path, &body).await
    }
}

/// In-process store, for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryKvStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.set_many(vec![(key.to_string(), value)]).await
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<()> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
        map.extend(entries);
        Ok(())
    }
}

/// Typed view over a [`KeyValueStore`]: last seen conventions + last check time.
#[derive(Clone)]
pub struct ClientCache {
    store: Arc<dyn KeyValueStore>,
}

impl ClientCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Never fails: unreadable or corrupt data reads as an empty entry (first run).
    pub async fn load(&self) -> CacheEntry {
        let conventions = match self.store.get(CONVENTIONS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ConventionRecord>>(&raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(target: "refresh", error = %e, "cached conventions corrupt, treating as empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(target: "refresh", error = ?e, "cache read failed, treating as empty");
                Vec::new()
            }
        };
        CacheEntry {
            conventions,
            last_check: self.last_check().await,
        }
    }

    pub async fn last_check(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get(LAST_CHECK_KEY).await.ok().flatten()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Replaces the whole entry in one store write.
    pub async fn store(&self, conventions: &[ConventionRecord], now: DateTime<Utc>) -> Result<()> {
        let body = serde_json::to_string(conventions).context("serializing conventions")?;
        self.store
            .set_many(vec![
                (CONVENTIONS_KEY.to_string(), body),
                (LAST_CHECK_KEY.to_string(), now.to_rfc3339()),
            ])
            .await
    }
}
