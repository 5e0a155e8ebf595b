// src/ingest/config.rs
//! Hand-curated conventions (e.g. announced on official socials before any
//! listing site has them).
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::convention::ConventionRecord;
use crate::identity::generate_id;
use crate::ingest::normalize_text;
use url::Url;

const ENV_PATH: &str = "MANUAL_CONVENTIONS_PATH";
pub const MANUAL_SOURCE: &str = "Manual Entry";

#[derive(Debug, Clone, Deserialize)]
pub struct ManualEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub date: String,
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub guests: Vec<String>,
}

impl ManualEntry {
    fn into_record(self) -> Option<ConventionRecord> {
        let name = normalize_text(&self.name);
        let date = self.date.trim().to_string();
        if name.is_empty() || date.is_empty() {
            return None;
        }
        let url = self.url.trim().to_string();
        match Url::parse(&url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => {
                tracing::warn!(target: "ingest", name = %name, url = %self.url, "manual entry needs an absolute http(s) url, skipped");
                return None;
            }
        }
        let id = self
            .id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_id(&name, &date));
        Some(ConventionRecord {
            id,
            name,
            location: self
                .location
                .map(|l| normalize_text(&l))
                .filter(|l| !l.is_empty()),
            date,
            url,
            source: self.source.unwrap_or_else(|| MANUAL_SOURCE.to_string()),
            guests: self.guests,
        })
    }
}

/// Load manual conventions from an explicit path. Supports TOML or JSON formats.
pub fn load_manual_from(path: &Path) -> Result<Vec<ConventionRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading manual conventions from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_manual(&content, ext.as_str())
}

/// Load manual conventions using env var + fallbacks:
/// 1) $MANUAL_CONVENTIONS_PATH
/// 2) config/manual_conventions.toml
/// 3) config/manual_conventions.json
pub fn load_manual_default() -> Result<Vec<ConventionRecord>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_manual_from(&pb);
        } else {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/manual_conventions.toml");
    if toml_p.exists() {
        return load_manual_from(&toml_p);
    }
    let json_p = PathBuf::from("config/manual_conventions.json");
    if json_p.exists() {
        return load_manual_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_manual(s: &str, hint_ext: &str) -> Result<Vec<ConventionRecord>> {
    let entries = match hint_ext {
        "json" => parse_json(s)?,
        "toml" => parse_toml(s)?,
        // no usable extension: JSON first, then TOML
        _ => parse_json(s).or_else(|_| parse_toml(s))?,
    };
    Ok(entries.into_iter().filter_map(ManualEntry::into_record).collect())
}

fn parse_toml(s: &str) -> Result<Vec<ManualEntry>> {
    #[derive(Deserialize)]
    struct TomlManual {
        #[serde(default)]
        conventions: Vec<ManualEntry>,
    }
    let v: TomlManual = toml::from_str(s).context("parsing manual conventions toml")?;
    Ok(v.conventions)
}

fn parse_json(s: &str) -> Result<Vec<ManualEntry>> {
    serde_json::from_str(s).context("parsing manual conventions json")
}
