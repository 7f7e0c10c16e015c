//! Upstream client capability and its HTTP implementation.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::error::{UpstreamError, UpstreamResult};
use crate::types::{Envelope, RawEmployee};

mod http;

use http::HttpBackend;

pub const UPSTREAM_USER_AGENT: &str = concat!("roster/", env!("CARGO_PKG_VERSION"));

/// Source of authoritative employee data.
///
/// `Ok(None)` means the upstream answered without data: a miss, not an error.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get_all(&self) -> UpstreamResult<Option<Vec<RawEmployee>>>;

    async fn get_by_id(&self, id: i64) -> UpstreamResult<Option<RawEmployee>>;
}

/// HTTP upstream speaking the `{status, data, message}` envelope.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    http: HttpBackend,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(UPSTREAM_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| UpstreamError::Generic {
                status: None,
                detail: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.url.trim_end_matches('/').to_string(),
                max_retries: config.max_retries,
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    fn employees_url(&self) -> String {
        format!("{}/employees", self.http.base_url)
    }

    fn employee_url(&self, id: i64) -> String {
        format!("{}/employee/{}", self.http.base_url, id)
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn get_all(&self) -> UpstreamResult<Option<Vec<RawEmployee>>> {
        let url = self.employees_url();
        debug!(url = %url, "fetching all employees from upstream");

        let envelope: Envelope<Vec<RawEmployee>> = self.http.get_json(&url).await?;
        Ok(envelope.data)
    }

    async fn get_by_id(&self, id: i64) -> UpstreamResult<Option<RawEmployee>> {
        let url = self.employee_url(id);
        debug!(url = %url, id, "fetching employee from upstream");

        let envelope: Envelope<RawEmployee> = self.http.get_json(&url).await?;
        Ok(envelope.data)
    }
}
