//! JSON GET with retry and exponential backoff
//!
//! Transport errors, 429 and 5xx are retried; 404 is "not found";
//! any other status fails immediately.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

/// Retry schedule for HTTP requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// GET `url` and decode JSON; `Ok(None)` on 404
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
    policy: &RetryPolicy,
) -> anyhow::Result<Option<T>> {
    let mut attempt = 0;

    loop {
        attempt += 1;
        let started = Instant::now();
        let result = client.get(url).query(query).send().await;
        crate::telemetry::record_fetch_latency(started.elapsed());

        let delay = match result {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    tracing::debug!(url, "Resource not found");
                    return Ok(None);
                }
                if status.is_success() {
                    return Ok(Some(response.json::<T>().await?));
                }
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    let retry_after = retry_after(&response);
                    if attempt >= policy.max_attempts {
                        anyhow::bail!("HTTP {} from {} after {} attempts", status, url, attempt);
                    }
                    tracing::warn!(url, %status, attempt, "Retryable HTTP status");
                    retry_after.unwrap_or_else(|| policy.delay_for(attempt))
                } else {
                    let body = response.text().await.unwrap_or_default();
                    anyhow::bail!("HTTP {} from {}: {}", status, url, body);
                }
            }
            Err(e) => {
                if attempt >= policy.max_attempts {
                    return Err(anyhow::Error::new(e)
                        .context(format!("request to {url} failed after {attempt} attempts")));
                }
                tracing::warn!(url, error = %e, attempt, "Request failed, retrying");
                policy.delay_for(attempt)
            }
        };

        sleep(delay.min(policy.max_delay)).await;
    }
}

/// Retry-After in whole seconds, if present
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
