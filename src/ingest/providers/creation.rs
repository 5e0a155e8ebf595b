// src/ingest/providers/creation.rs
//! Creation Entertainment calendar: mostly US shows, so candidates must also
//! mention a European region.

use super::listing::{ListingProfile, ListingProvider};
use crate::html::DocumentFetcher;

pub const PROFILE: ListingProfile = ListingProfile {
    source: "Creation Entertainment",
    listing_url: "https://www.creationent.com/cal.html",
    base_url: "https://www.creationent.com",
    candidates: ".event-item, .convention-item",
    name_selectors: &[".event-name", "h3", "h4"],
    default_name: "Supernatural Convention",
    default_location: "Europe",
    keyword: Some("supernatural"),
    region_keywords: &[
        "europe",
        "uk",
        "france",
        "germany",
        "italy",
        "spain",
        "belgium",
        "netherlands",
    ],
};

pub fn from_url(fetcher: DocumentFetcher) -> ListingProvider {
    ListingProvider::from_url(PROFILE, fetcher)
}

pub fn from_fixture(html: &str) -> ListingProvider {
    ListingProvider::from_fixture(PROFILE, html)
}
