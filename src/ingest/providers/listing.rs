// src/ingest/providers/listing.rs
//! Shared extraction for listing pages where each candidate element carries a
//! free-text blob with the name, city and date mixed together.

use anyhow::Result;
use async_trait::async_trait;
use metrics::{counter, histogram};

use super::{resolve_url, Mode};
use crate::convention::ConventionRecord;
use crate::extract::{extract_date, extract_location};
use crate::html::{attr, select_within, text, Document, DocumentFetcher};
use crate::ingest::types::SourceAdapter;

/// Site-specific knobs for a [`ListingProvider`].
#[derive(Debug, Clone, Copy)]
pub struct ListingProfile {
    pub source: &'static str,
    pub listing_url: &'static str,
    /// Homepage: fallback url and base for relative links.
    pub base_url: &'static str,
    pub candidates: &'static str,
    /// Tried in order; first non-empty text wins.
    pub name_selectors: &'static [&'static str],
    pub default_name: &'static str,
    pub default_location: &'static str,
    /// Lower-case keyword that must appear in the candidate text.
    pub keyword: Option<&'static str>,
    /// When non-empty, at least one must appear (lower-case substring).
    pub region_keywords: &'static [&'static str],
}

impl ListingProfile {
    pub fn accepts(&self, blob: &str) -> bool {
        let lower = blob.to_lowercase();
        let keyword_ok = self.keyword.map_or(true, |k| lower.contains(k));
        let region_ok = self.region_keywords.is_empty()
            || self.region_keywords.iter().any(|r| lower.contains(r));
        keyword_ok && region_ok
    }
}

pub struct ListingProvider {
    profile: ListingProfile,
    mode: Mode,
}

impl ListingProvider {
    pub fn from_url(profile: ListingProfile, fetcher: DocumentFetcher) -> Self {
        Self {
            profile,
            mode: Mode::Http {
                url: profile.listing_url,
                fetcher,
            },
        }
    }

    pub fn from_fixture(profile: ListingProfile, html: &str) -> Self {
        Self {
            profile,
            mode: Mode::Fixture(html.to_string()),
        }
    }
}

#[async_trait]
impl SourceAdapter for ListingProvider {
    async fn fetch_latest(&self) -> Result<Vec<ConventionRecord>> {
        let html = self.mode.load().await?;
        Ok(self.parse_document(&html))
    }

    fn parse_document(&self, html: &str) -> Vec<ConventionRecord> {
        let t0 = std::time::Instant::now();
        let p = &self.profile;
        let doc = Document::parse(html);

        let mut out = Vec::new();
        for el in doc.select(p.candidates) {
            let blob = text(el);
            if !p.accepts(&blob) {
                continue;
            }
            // no date, no record
            let Some(date) = extract_date(&blob) else {
                continue;
            };

            let name = p
                .name_selectors
                .iter()
                .find_map(|sel| {
                    select_within(el, sel)
                        .into_iter()
                        .map(text)
                        .find(|t| !t.is_empty())
                })
                .unwrap_or_else(|| p.default_name.to_string());
            let location =
                extract_location(&blob).unwrap_or_else(|| p.default_location.to_string());
            let href = select_within(el, "a")
                .into_iter()
                .next()
                .and_then(|a| attr(a, "href"));
            let url = resolve_url(p.base_url, href.as_deref());

            out.push(ConventionRecord::new(name, Some(location), date, url, p.source));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("scrape_parse_ms", "source" => p.source).record(ms);
        counter!("scrape_records_total", "source" => p.source).increment(out.len() as u64);
        out
    }

    fn name(&self) -> &'static str {
        self.profile.source
    }
}
