// src/ingest/providers/mod.rs
pub mod creation;
pub mod eventbrite;
pub mod honcon;
pub mod listing;
pub mod starfury;

use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

use crate::html::DocumentFetcher;
use crate::ingest::types::SourceAdapter;

/// Where a provider reads its document from.
#[derive(Clone)]
pub(crate) enum Mode {
    // Owned copy so fixtures need not be 'static.
    Fixture(String),
    Http {
        url: &'static str,
        fetcher: DocumentFetcher,
    },
}

impl Mode {
    pub(crate) async fn load(&self) -> Result<String> {
        match self {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { url, fetcher } => fetcher.fetch(url).await,
        }
    }
}

/// Resolves `href` against `base`; missing or unusable links fall back to `base`.
pub fn resolve_url(base: &str, href: Option<&str>) -> String {
    let Some(href) = href else {
        return base.to_string();
    };
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(String::from)
        .unwrap_or_else(|_| base.to_string())
}

/// Every live site adapter, in run order. Order decides which record survives
/// when two sites produce the same id.
pub fn default_adapters(fetcher: &DocumentFetcher) -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(creation::from_url(fetcher.clone())),
        Box::new(starfury::from_url(fetcher.clone())),
        Box::new(honcon::from_url(fetcher.clone())),
        Box::new(eventbrite::EventbriteProvider::from_url(fetcher.clone())),
    ]
}

/// Offline variant of [`default_adapters`]: one `<site>.html` per adapter
/// under `dir`. Sites without a file are left out.
pub fn fixture_adapters(dir: &Path) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let mut out: Vec<Box<dyn SourceAdapter>> = Vec::new();
    for site in ["creation", "starfury", "honcon", "eventbrite"] {
        let path = dir.join(format!("{site}.html"));
        if !path.exists() {
            tracing::warn!(target: "ingest", path = %path.display(), "fixture missing, site skipped");
            continue;
        }
        let html = std::fs::read_to_string(&path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let adapter: Box<dyn SourceAdapter> = match site {
            "creation" => Box::new(creation::from_fixture(&html)),
            "starfury" => Box::new(starfury::from_fixture(&html)),
            "honcon" => Box::new(honcon::from_fixture(&html)),
            _ => Box::new(eventbrite::EventbriteProvider::from_fixture(&html)),
        };
        out.push(adapter);
    }
    Ok(out)
}
