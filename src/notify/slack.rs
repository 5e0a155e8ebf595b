use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{Notification, Notifier};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }
}

fn slack_text(n: &Notification) -> String {
    let link = n
        .payload
        .pointer("/convention/url")
        .and_then(|v| v.as_str())
        .map(|u| format!("\n<{u}>"))
        .unwrap_or_default();
    format!("*{}*\n{}{}", n.title, n.body, link)
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, n: &Notification) -> Result<()> {
        let body = serde_json::json!({ "text": slack_text(n) });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
