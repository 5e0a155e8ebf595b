// src/config/app.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::change_detector::DEFAULT_REFRESH_INTERVAL_SECS;
use crate::html::{FetchConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::remote::DEFAULT_SNAPSHOT_URL;
use crate::snapshot::DEFAULT_SNAPSHOT_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "config/tracker.toml";
pub const ENV_CONFIG_PATH: &str = "TRACKER_CONFIG_PATH";

fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}
fn default_snapshot_url() -> String {
    DEFAULT_SNAPSHOT_URL.to_string()
}
fn default_cache_path() -> PathBuf {
    PathBuf::from("state/client_cache.json")
}
fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}
fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Producer output.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Where the client reads the published snapshot (URL or file path).
    #[serde(default = "default_snapshot_url")]
    pub snapshot_url: String,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    /// Snapshot shipped with the client, used when remote and cache are both empty.
    #[serde(default)]
    pub baseline_path: Option<PathBuf>,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            snapshot_url: default_snapshot_url(),
            cache_path: default_cache_path(),
            baseline_path: None,
            refresh_interval_secs: default_refresh_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
            notifications_enabled: true,
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// File (`$TRACKER_CONFIG_PATH`, else `config/tracker.toml`, else defaults),
    /// then env overrides.
    pub fn load() -> Result<Self> {
        let cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(p)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::load_from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };
        Ok(cfg.with_env_overrides().sanitized())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("SNAPSHOT_PATH") {
            self.snapshot_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("SNAPSHOT_URL") {
            self.snapshot_url = v;
        }
        if let Ok(v) = env::var("CACHE_PATH") {
            self.cache_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("BASELINE_PATH") {
            self.baseline_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env_u64("REFRESH_INTERVAL_SECS") {
            self.refresh_interval_secs = v;
        }
        if let Some(v) = env_u64("FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = v;
        }
        if let Ok(v) = env::var("FETCH_USER_AGENT") {
            self.user_agent = v;
        }
        if let Ok(v) = env::var("NOTIFICATIONS_ENABLED") {
            self.notifications_enabled = !matches!(v.trim(), "0" | "false" | "FALSE" | "False");
        }
        self
    }

    fn sanitized(mut self) -> Self {
        if self.refresh_interval_secs == 0 {
            self.refresh_interval_secs = default_refresh_interval_secs();
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = default_fetch_timeout_secs();
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
        self
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout_secs: self.fetch_timeout_secs,
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
