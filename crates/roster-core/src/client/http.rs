//! HTTP layer: status classification and retry.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::error::{UpstreamError, UpstreamResult};

/// First retry delay; doubles per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Upper bound on a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(1);

/// HTTP backend for making requests (holds reqwest client and retry budget).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) max_retries: u32,
}

impl HttpBackend {
    /// GET a JSON document, retrying transport failures.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> UpstreamResult<T> {
        let response = self.request(url).await?;
        let status = response.status();

        let body = response.text().await.map_err(|e| UpstreamError::Generic {
            status: Some(status.as_u16()),
            detail: format!("failed to read response body: {}", e),
        })?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::Generic {
            status: Some(status.as_u16()),
            detail: format!("failed to decode upstream payload: {}", e),
        })
    }

    /// Make a request, retrying while the classified failure is retryable.
    pub(crate) async fn request(&self, url: &str) -> UpstreamResult<reqwest::Response> {
        let mut retries = 0;

        loop {
            match self.request_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = backoff_for(retries);

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying upstream request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(&self, url: &str) -> UpstreamResult<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = retry_after(&response);
        let resource = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        debug!(url, status = status.as_u16(), "upstream call failed");

        Err(match classify(status.as_u16(), &body, &resource) {
            UpstreamError::RateLimited { .. } => {
                warn!(url, "upstream rate limit reached");
                UpstreamError::RateLimited { retry_after }
            }
            other => other,
        })
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Exponential backoff with jitter in `[base/2, base]`.
fn backoff_for(retry: u32) -> Duration {
    use rand::Rng;

    let exponent = retry.saturating_sub(1).min(16);
    let base = INITIAL_BACKOFF
        .saturating_mul(1u32 << exponent)
        .min(MAX_BACKOFF);
    let base_ms = base.as_millis() as u64;
    let jittered_ms = rand::thread_rng().gen_range(base_ms / 2..=base_ms);
    Duration::from_millis(jittered_ms.max(10))
}
