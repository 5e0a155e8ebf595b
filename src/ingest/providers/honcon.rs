// src/ingest/providers/honcon.rs
use super::listing::{ListingProfile, ListingProvider};
use crate::html::DocumentFetcher;

/// HonCon (Germany). The whole site is Supernatural, so no keyword filter.
pub const PROFILE: ListingProfile = ListingProfile {
    source: "HonCon",
    listing_url: "https://www.honcon.de",
    base_url: "https://www.honcon.de",
    candidates: ".event, .convention, article",
    name_selectors: &["h1", "h2", "h3", ".title"],
    default_name: "HonCon Supernatural Convention",
    default_location: "Germany",
    keyword: None,
    region_keywords: &[],
};

pub fn from_url(fetcher: DocumentFetcher) -> ListingProvider {
    ListingProvider::from_url(PROFILE, fetcher)
}

pub fn from_fixture(html: &str) -> ListingProvider {
    ListingProvider::from_fixture(PROFILE, html)
}
