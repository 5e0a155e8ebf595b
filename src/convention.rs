//! Canonical record and snapshot types shared by the producer and the client.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event, uniquely identified by `id` once normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Raw date text as found on the page; may not be machine-parseable.
    pub date: String,
    pub url: String,
    /// Adapter label (provenance only, never part of identity).
    pub source: String,
    #[serde(default)]
    pub guests: Vec<String>,
}

impl ConventionRecord {
    /// Builds a record whose `id` is derived from `name` + `date`.
    pub fn new(
        name: impl Into<String>,
        location: Option<String>,
        date: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let date = date.into();
        Self {
            id: crate::identity::generate_id(&name, &date),
            name,
            location,
            date,
            url: url.into(),
            source: source.into(),
            guests: Vec::new(),
        }
    }

    pub fn location_or_tba(&self) -> &str {
        self.location.as_deref().unwrap_or("Location TBA")
    }
}

/// The published artifact: `{ lastUpdate, count, conventions }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub last_update: DateTime<Utc>,
    pub count: usize,
    pub conventions: Vec<ConventionRecord>,
}

impl Snapshot {
    pub fn new(conventions: Vec<ConventionRecord>, last_update: DateTime<Utc>) -> Self {
        Self {
            last_update,
            count: conventions.len(),
            conventions,
        }
    }

    /// Checks `count == conventions.len()` and that ids are pairwise distinct.
    pub fn validate(&self) -> Result<(), String> {
        if self.count != self.conventions.len() {
            return Err(format!(
                "count {} does not match {} conventions",
                self.count,
                self.conventions.len()
            ));
        }
        let mut seen = HashSet::with_capacity(self.conventions.len());
        for c in &self.conventions {
            if !seen.insert(c.id.as_str()) {
                return Err(format!("duplicate id {:?}", c.id));
            }
        }
        Ok(())
    }
}

/// Client-side view of the last refresh that succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub conventions: Vec<ConventionRecord>,
    pub last_check: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }
}
