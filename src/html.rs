// src/html.rs
//! Fetch + traversal primitives the site adapters are written against:
//! `fetch(url)`, `select(document, selector)`, `text(element)`, `attr(element, name)`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

/// Browser-like identifier; several listing sites serve an empty shell to bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Thin wrapper over `reqwest::Client` with a bounded timeout and fixed UA.
#[derive(Clone)]
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }

    /// GET `url` and return the body; non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} status"))?;
        resp.text()
            .await
            .with_context(|| format!("reading body of {url}"))
    }
}

/// Parsed HTML document. Not `Send`: parse and traverse inside one sync call.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(raw: &str) -> Self {
        Self {
            html: Html::parse_document(raw),
        }
    }

    /// All elements matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(sel) => self.html.select(&sel).collect(),
            Err(e) => {
                tracing::debug!(selector, error = ?e, "invalid selector");
                Vec::new()
            }
        }
    }
}

/// Descendants of `el` matching `selector`, in document order.
pub fn select_within<'a>(el: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => el.select(&sel).collect(),
        Err(e) => {
            tracing::debug!(selector, error = ?e, "invalid selector");
            Vec::new()
        }
    }
}

/// Text content of `el`, text nodes joined by a space and whitespace collapsed.
///
/// The parser has already decoded entities, so `<`/`>` here are literal text.
/// Nothing is truncated: the date may sit anywhere in a long listing blob.
pub fn text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
