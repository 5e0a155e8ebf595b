// src/remote.rs
//! Where the client gets the published snapshot from.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::convention::Snapshot;
use crate::snapshot::SnapshotStore;

/// Published snapshot location.
pub const DEFAULT_SNAPSHOT_URL: &str =
    "https://raw.githubusercontent.com/brs64/supernatural-scraper/main/data/conventions.json";

/// Every variant is recoverable: callers fall back to cached data.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("snapshot not found")]
    NotFound,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("snapshot invalid: {0}")]
    Invalid(String),
    #[error("local snapshot unreadable: {0}")]
    Local(String),
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError>;
    fn describe(&self) -> String;
}

pub struct HttpSnapshotSource {
    url: String,
    client: Client,
}

impl HttpSnapshotSource {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

fn checked(snap: Snapshot) -> Result<Snapshot, RemoteError> {
    snap.validate().map_err(RemoteError::Invalid)?;
    Ok(snap)
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError> {
        let resp = self.client.get(&self.url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => return Err(RemoteError::NotFound),
            s if !s.is_success() => return Err(RemoteError::Status(s.as_u16())),
            _ => {}
        }
        let body = resp.text().await?;
        let snap: Snapshot = serde_json::from_str(&body)?;
        checked(snap)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A snapshot file on disk standing in for the remote (offline runs, tests).
#[async_trait]
impl SnapshotSource for SnapshotStore {
    async fn fetch_snapshot(&self) -> Result<Snapshot, RemoteError> {
        match self.try_load().await {
            Ok(Some(snap)) => checked(snap),
            Ok(None) => Err(RemoteError::NotFound),
            Err(e) => Err(RemoteError::Local(format!("{e:#}"))),
        }
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// `http(s)://` locations are fetched over the network, anything else is a file path.
pub fn source_for(location: &str, timeout_secs: u64) -> Result<Box<dyn SnapshotSource>, RemoteError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSnapshotSource::new(location, timeout_secs)?))
    } else {
        Ok(Box::new(SnapshotStore::new(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let src = SnapshotStore::new(dir.path().join("nope.json"));
        assert!(matches!(
            src.fetch_snapshot().await,
            Err(RemoteError::NotFound)
        ));
    }

    #[tokio::test]
    async fn local_inconsistent_snapshot_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(
            &path,
            r#"{"lastUpdate":"2025-06-01T00:00:00Z","count":3,"conventions":[]}"#,
        )
        .unwrap();
        let src = SnapshotStore::new(&path);
        assert!(matches!(
            src.fetch_snapshot().await,
            Err(RemoteError::Invalid(_))
        ));
    }

    #[test]
    fn location_kind_selects_source() {
        let http = source_for("https://example.test/c.json", 5).unwrap();
        assert_eq!(http.describe(), "https://example.test/c.json");
        let file = source_for("data/conventions.json", 5).unwrap();
        assert_eq!(file.describe(), "data/conventions.json");
    }
}
