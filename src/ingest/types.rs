// src/ingest/types.rs
use anyhow::Result;

use crate::convention::ConventionRecord;

/// One external listing site.
///
/// `fetch_latest` does the network part; `parse_document` is the pure
/// document-to-records step and never fails (unmatched markup yields nothing).
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<ConventionRecord>>;
    fn parse_document(&self, html: &str) -> Vec<ConventionRecord>;
    fn name(&self) -> &'static str;
}
