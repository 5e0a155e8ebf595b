// src/notify/mod.rs
//! Notification capability: permission check + fire-and-forget delivery.
//! Delivery failures are the caller's to log; they never abort a refresh.

pub mod discord;
pub mod slack;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::convention::ConventionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub payload: serde_json::Value,
}

impl Notification {
    pub const NEW_CONVENTION_TITLE: &'static str = "New Supernatural convention!";

    /// One notification per newly seen convention.
    pub fn new_convention(c: &ConventionRecord) -> Self {
        Self {
            title: Self::NEW_CONVENTION_TITLE.to_string(),
            body: format!("{} - {} ({})", c.name, c.location_or_tba(), c.date),
            payload: serde_json::json!({ "convention": c }),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }
    async fn notify(&self, n: &Notification) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Writes notifications to the log. Always available unless disabled.
pub struct LogNotifier {
    enabled: bool,
}

impl LogNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn request_permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn notify(&self, n: &Notification) -> Result<()> {
        tracing::info!(target: "notify", title = %n.title, body = %n.body, "notification");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Fans out to every channel that grants permission.
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Log channel always; Discord/Slack when their webhook env vars are set.
    /// `NOTIFICATIONS_ENABLED=0` denies permission on every channel.
    pub fn from_env() -> Self {
        let enabled = std::env::var("NOTIFICATIONS_ENABLED")
            .map(|v| v.trim() != "0" && !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        Self::with_webhooks(enabled)
    }

    /// Same channel set as [`NotifierMux::from_env`], with the enabled flag
    /// already resolved (e.g. from `AppConfig`).
    pub fn with_webhooks(enabled: bool) -> Self {
        let mut channels: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier::new(enabled))];
        if enabled {
            if let Ok(url) = std::env::var("DISCORD_WEBHOOK_URL") {
                channels.push(Box::new(discord::DiscordNotifier::new(url)));
            }
            if let Ok(url) = std::env::var("SLACK_WEBHOOK_URL") {
                channels.push(Box::new(slack::SlackNotifier::new(url)));
            }
        }
        Self::new(channels)
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    async fn granted(&self) -> Vec<&dyn Notifier> {
        let mut out = Vec::with_capacity(self.channels.len());
        for ch in &self.channels {
            if ch.request_permission().await == Permission::Granted {
                out.push(ch.as_ref());
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl Notifier for NotifierMux {
    async fn request_permission(&self) -> Permission {
        if self.granted().await.is_empty() {
            Permission::Denied
        } else {
            Permission::Granted
        }
    }

    /// Succeeds if at least one granted channel delivered.
    async fn notify(&self, n: &Notification) -> Result<()> {
        let channels = self.granted().await;
        let mut failures = Vec::new();
        for ch in &channels {
            if let Err(e) = ch.notify(n).await {
                tracing::warn!(target: "notify", channel = ch.name(), error = ?e, "channel failed");
                failures.push(format!("{}: {e:#}", ch.name()));
            }
        }
        if !channels.is_empty() && failures.len() == channels.len() {
            return Err(anyhow!("all channels failed: {}", failures.join("; ")));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}
