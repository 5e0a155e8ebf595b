use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{Notification, Notifier};

const EMBED_COLOR: u32 = 0x8b_00_00;
const USERNAME: &str = "Convention Tracker";

/// Discord channel webhook. Transient failures are retried with backoff.
#[derive(Clone)]
pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
    request_timeout: Duration,
    attempts: u8,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
            request_timeout: Duration::from_secs(5),
            attempts: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = Duration::from_secs(secs);
        self
    }

    /// Total attempts, including the first one.
    pub fn with_retries(mut self, attempts: u8) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    async fn post_once(&self, payload: &WebhookMessage) -> Result<()> {
        let rsp = self
            .client
            .post(&self.webhook_url)
            .timeout(self.request_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| anyhow!("discord webhook request failed: {e}"))?;
        rsp.error_for_status_ref()
            .map_err(|e| anyhow!("discord webhook HTTP error: {e}"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, n: &Notification) -> Result<()> {
        let message = WebhookMessage::from_notification(n);

        let mut attempt: u8 = 1;
        loop {
            match self.post_once(&message).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(e) => {
                    tracing::debug!(target: "notify", attempt, error = %e, "discord retry");
                    // 500ms, 1s, 2s, ...
                    tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                    attempt += 1;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[derive(Serialize)]
struct EmbedField {
    name: &'static str,
    value: String,
    inline: bool,
}

#[derive(Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
}

#[derive(Serialize)]
struct WebhookMessage {
    username: &'static str,
    embeds: Vec<Embed>,
}

impl WebhookMessage {
    fn from_notification(n: &Notification) -> Self {
        let convention = n.payload.get("convention");
        let field = |key: &str| {
            convention
                .and_then(|c| c.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let fields = [("Location", "location"), ("Date", "date"), ("Source", "source")]
            .into_iter()
            .filter_map(|(label, key)| {
                field(key).map(|value| EmbedField {
                    name: label,
                    value,
                    inline: true,
                })
            })
            .collect();

        Self {
            username: USERNAME,
            embeds: vec![Embed {
                title: n.title.clone(),
                description: n.body.clone(),
                color: EMBED_COLOR,
                url: field("url"),
                fields,
            }],
        }
    }
}
