// src/ingest/providers/starfury.rs
use super::listing::{ListingProfile, ListingProvider};
use crate::html::DocumentFetcher;

/// Starfury Conventions (UK).
pub const PROFILE: ListingProfile = ListingProfile {
    source: "Starfury Conventions",
    listing_url: "https://www.starfuryconventions.com",
    base_url: "https://www.starfuryconventions.com",
    candidates: "article, .event, .convention-listing",
    name_selectors: &["h2", "h3", ".title"],
    default_name: "Supernatural Convention",
    default_location: "United Kingdom",
    keyword: Some("supernatural"),
    region_keywords: &[],
};

pub fn from_url(fetcher: DocumentFetcher) -> ListingProvider {
    ListingProvider::from_url(PROFILE, fetcher)
}

pub fn from_fixture(html: &str) -> ListingProvider {
    ListingProvider::from_fixture(PROFILE, html)
}
