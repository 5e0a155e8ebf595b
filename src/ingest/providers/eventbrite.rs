// src/ingest/providers/eventbrite.rs
//! Eventbrite search results. Cards are structured, so name/location/date come
//! from dedicated child elements instead of one text blob.

use anyhow::Result;
use async_trait::async_trait;
use metrics::{counter, histogram};

use super::{resolve_url, Mode};
use crate::convention::ConventionRecord;
use crate::extract::{extract_date, extract_location};
use crate::html::{attr, select_within, text, Document, DocumentFetcher};
use crate::ingest::types::SourceAdapter;

pub const SOURCE: &str = "Eventbrite";
pub const SEARCH_URL: &str = "https://www.eventbrite.com/d/europe/supernatural-convention/";
const CARDS: &str = ".search-event-card, .event-card";
const NAME: &str = "h3, .event-card__title";
const LOCATION: &str = ".event-card__location, .location";
const DATE: &str = ".event-card__date, .date";
const DEFAULT_LOCATION: &str = "Europe";

pub struct EventbriteProvider {
    mode: Mode,
}

impl EventbriteProvider {
    pub fn from_url(fetcher: DocumentFetcher) -> Self {
        Self {
            mode: Mode::Http {
                url: SEARCH_URL,
                fetcher,
            },
        }
    }

    pub fn from_fixture(html: &str) -> Self {
        Self {
            mode: Mode::Fixture(html.to_string()),
        }
    }
}

fn first_text(card: scraper::ElementRef<'_>, selector: &str) -> Option<String> {
    select_within(card, selector)
        .into_iter()
        .map(text)
        .find(|t| !t.is_empty())
}

#[async_trait]
impl SourceAdapter for EventbriteProvider {
    async fn fetch_latest(&self) -> Result<Vec<ConventionRecord>> {
        let html = self.mode.load().await?;
        Ok(self.parse_document(&html))
    }

    fn parse_document(&self, html: &str) -> Vec<ConventionRecord> {
        let t0 = std::time::Instant::now();
        let doc = Document::parse(html);

        let mut out = Vec::new();
        for card in doc.select(CARDS) {
            // a card needs both a title and some date text
            let Some(name) = first_text(card, NAME) else {
                continue;
            };
            let Some(date_text) = first_text(card, DATE) else {
                continue;
            };
            let date = extract_date(&date_text).unwrap_or(date_text);

            let location = first_text(card, LOCATION)
                .map(|raw| extract_location(&raw).unwrap_or(raw))
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
            let href = select_within(card, "a")
                .into_iter()
                .next()
                .and_then(|a| attr(a, "href"));
            let url = resolve_url(SEARCH_URL, href.as_deref());

            out.push(ConventionRecord::new(name, Some(location), date, url, SOURCE));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("scrape_parse_ms", "source" => SOURCE).record(ms);
        counter!("scrape_records_total", "source" => SOURCE).increment(out.len() as u64);
        out
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_location_and_date_are_kept_when_not_recognized() {
        let html = r#"<div class="event-card">
            <h3 class="event-card__title">Salt &amp; Burn Meetup</h3>
            <p class="event-card__date">Sat, Oct 4, 7:00 PM</p>
            <p class="event-card__location">Ghent</p></div>"#;
        let out = EventbriteProvider::from_fixture(html).parse_document(html);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Salt & Burn Meetup");
        assert_eq!(out[0].date, "Sat, Oct 4, 7:00 PM");
        assert_eq!(out[0].location.as_deref(), Some("Ghent"));
        assert_eq!(out[0].url, SEARCH_URL);
    }

    #[test]
    fn card_without_title_is_skipped() {
        let html = r#"<div class="event-card"><p class="date">12 Jan 2026</p></div>"#;
        assert!(EventbriteProvider::from_fixture(html)
            .parse_document(html)
            .is_empty());
    }
}
