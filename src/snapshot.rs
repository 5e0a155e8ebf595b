// src/snapshot.rs
//! Durable snapshot artifact (`data/conventions.json` by default).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs;

use crate::convention::{ConventionRecord, Snapshot};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/conventions.json";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamps `records` with `lastUpdate = now` and writes them.
    ///
    /// Writes a sibling temp file and renames it over the target, so a failed
    /// write leaves the previous artifact readable.
    pub async fn save(&self, records: Vec<ConventionRecord>) -> Result<Snapshot> {
        let snapshot = Snapshot::new(records, Utc::now());
        let body = serde_json::to_vec_pretty(&snapshot).context("serializing snapshot")?;
        write_atomic(&self.path, &body).await?;
        tracing::info!(
            target: "ingest",
            path = %self.path.display(),
            count = snapshot.count,
            "snapshot saved"
        );
        Ok(snapshot)
    }

    /// Missing file is `Ok(None)`; unreadable or malformed content is an error.
    pub async fn try_load(&self) -> Result<Option<Snapshot>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let snap: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(Some(snap))
    }

    /// Tolerant read: any problem is logged and reported as "no snapshot".
    pub async fn load(&self) -> Option<Snapshot> {
        match self.try_load().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = ?e, "snapshot unreadable, ignoring");
                None
            }
        }
    }
}

/// Write-to-temp + rename in the target's directory.
pub(crate) async fn write_atomic(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, body)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("replacing {}", path.display()));
    }
    Ok(())
}
