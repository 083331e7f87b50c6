// photobackup/src/notify.rs
use std::time::Duration;

use chrono::Local;
use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::config::Config;

const PING_TIMEOUT: Duration = Duration::from_secs(10);
const PING_ATTEMPTS: u32 = 3;

/// Lifecycle reporting to an external monitoring endpoint. Every send is
/// best-effort with a bounded timeout and retry count: a monitoring outage
/// must never fail or hang the run. With no endpoint configured, every
/// ping is a silent no-op.
pub struct Notifier {
    target: Option<(Url, Client)>,
}

#[derive(Serialize)]
struct FailurePayload<'a> {
    exit_code: i32,
    timestamp: String,
    message: &'a str,
}

impl Notifier {
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.healthcheck_url.clone())
    }

    pub fn new(endpoint: Option<Url>) -> Self {
        let target = endpoint.and_then(|url| {
            match Client::builder().timeout(PING_TIMEOUT).build() {
                Ok(client) => Some((url, client)),
                Err(err) => {
                    warn!("Monitoring disabled, failed to build HTTP client: {}", err);
                    None
                }
            }
        });
        Self { target }
    }

    pub async fn ping_start(&self) {
        self.send("/start", None).await;
    }

    pub async fn ping_success(&self) {
        self.send("", None).await;
    }

    pub async fn ping_failure(&self, exit_code: i32, message: &str) {
        let payload = FailurePayload {
            exit_code,
            timestamp: Local::now().to_rfc3339(),
            message,
        };
        let body = serde_json::to_string(&payload).unwrap_or_default();
        self.send("/fail", Some(body)).await;
    }

    async fn send(&self, suffix: &str, body: Option<String>) {
        let Some((base, client)) = &self.target else {
            return;
        };
        let url = event_url(base, suffix);

        for attempt in 1..=PING_ATTEMPTS {
            let request = match &body {
                Some(text) => client.post(url.clone()).body(text.clone()),
                None => client.get(url.clone()),
            };
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Monitoring ping {} delivered", url);
                    return;
                }
                Ok(response) => warn!(
                    "Monitoring ping {} returned HTTP {} (attempt {}/{})",
                    url,
                    response.status(),
                    attempt,
                    PING_ATTEMPTS
                ),
                Err(err) => warn!(
                    "Monitoring ping {} failed (attempt {}/{}): {}",
                    url, attempt, PING_ATTEMPTS, err
                ),
            }
        }
        warn!("Giving up on monitoring ping {} after {} attempts", url, PING_ATTEMPTS);
    }
}

/// Healthcheck-style event URLs append a path suffix to the base ping URL
/// (`<url>/start`, `<url>/fail`); the success ping hits the base itself.
fn event_url(base: &Url, suffix: &str) -> Url {
    if suffix.is_empty() {
        return base.clone();
    }
    let raw = format!("{}{}", base.as_str().trim_end_matches('/'), suffix);
    Url::parse(&raw).unwrap_or_else(|_| base.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_urls_append_the_suffix_to_the_base() -> anyhow::Result<()> {
        let base = Url::parse("https://hc-ping.com/abc-123")?;
        assert_eq!(event_url(&base, "/start").as_str(), "https://hc-ping.com/abc-123/start");
        assert_eq!(event_url(&base, "/fail").as_str(), "https://hc-ping.com/abc-123/fail");
        assert_eq!(event_url(&base, "").as_str(), "https://hc-ping.com/abc-123");
        Ok(())
    }

    #[test]
    fn trailing_slashes_do_not_double_up() -> anyhow::Result<()> {
        let base = Url::parse("https://hc-ping.com/abc-123/")?;
        assert_eq!(event_url(&base, "/start").as_str(), "https://hc-ping.com/abc-123/start");
        Ok(())
    }

    #[test]
    fn failure_payload_carries_code_and_timestamp() -> anyhow::Result<()> {
        let payload = FailurePayload {
            exit_code: 3,
            timestamp: "2024-05-01T02:00:00+00:00".to_string(),
            message: "dump failed",
        };
        let value: serde_json::Value = serde_json::from_str(&serde_json::to_string(&payload)?)?;
        assert_eq!(value["exit_code"], 3);
        assert_eq!(value["message"], "dump failed");
        assert!(value["timestamp"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn pings_without_an_endpoint_are_noops() {
        let notifier = Notifier::new(None);
        notifier.ping_start().await;
        notifier.ping_success().await;
        notifier.ping_failure(1, "no endpoint").await;
    }
}
