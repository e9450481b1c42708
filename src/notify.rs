use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::utils::error::Result;

const NTFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Fire-and-forget push notifications through an ntfy pub/sub relay.
/// Without a configured topic every send is a silent no-op.
pub struct NtfyNotifier {
    client: Client,
    server: String,
    topic: Option<String>,
}

impl NtfyNotifier {
    pub fn new(server: &str, topic: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(NTFY_TIMEOUT).build()?;
        Ok(Self {
            client,
            server: server.trim_end_matches('/').to_string(),
            topic,
        })
    }

    /// The POST target, or `None` when no topic is configured.
    pub fn endpoint(&self) -> Option<String> {
        self.topic
            .as_deref()
            .filter(|topic| !topic.trim().is_empty())
            .map(|topic| format!("{}/{}", self.server, topic))
    }

    /// Send a plain-text message. Returns `Ok(false)` when skipped because
    /// no topic is configured; delivery errors propagate to the caller.
    pub async fn send(&self, title: &str, message: &str) -> Result<bool> {
        let Some(url) = self.endpoint() else {
            debug!("No ntfy topic configured, skipping notification");
            return Ok(false);
        };

        let response = self
            .client
            .post(&url)
            .header("Title", title)
            .body(message.to_string())
            .send()
            .await?;
        response.error_for_status()?;
        Ok(true)
    }
}
