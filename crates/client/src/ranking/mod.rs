//! Player-ranking API client.
//!
//! Provides a client for the ranking API with bounded exponential backoff and
//! outcome classification.
//!
//! ### Endpoints
//!
//! - **By name**: `GET {base}/search_profile/{name}?tests=true`
//! - **By id**: `GET {base}/profile/{uuid}?tests=true`
//!
//! ### Retry
//!
//! - 404 is terminal (`NotFound`).
//! - 429 and >= 500 are retried up to [`MAX_RETRIES`] times, sleeping
//!   `2^attempt * 500ms` plus up to 300ms of jitter between attempts.
//! - Any other non-success status is terminal (`Server`).
//! - Transport failures are terminal and never retried.
//!
//! Pacing against other requests is the queue's job; retries here happen
//! inside a single queue slot.

pub mod response;
pub mod subject;

pub use response::{RawProfile, RawRanking, RawTest};
pub use subject::Subject;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{StatusCode, Url, header};

use crate::ApiError;

/// Default base URL for the ranking API.
pub const DEFAULT_BASE_URL: &str = "https://mctiers.com/api";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "tierscope/0.1";

/// Retries after the first attempt before a transient failure becomes terminal.
pub const MAX_RETRIES: u32 = 4;

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: MAX_RETRIES, base_delay: Duration::from_millis(500), max_jitter: Duration::from_millis(300) }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`: `2^attempt * base + uniform[0, jitter)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        let jitter = if jitter_ms == 0 { 0 } else { fastrand::u64(0..jitter_ms) };
        base.saturating_add(Duration::from_millis(jitter))
    }
}

/// Ranking API client configuration.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Base URL (default: https://mctiers.com/api).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: tierscope/0.x).
    pub user_agent: String,
    /// Backoff applied to 429 and 5xx responses.
    pub retry: RetryPolicy,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Player-ranking API client.
#[derive(Debug, Clone)]
pub struct RankingClient {
    http: reqwest::Client,
    base_url: Url,
    config: RankingConfig,
}

impl RankingClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RankingConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidInput(format!("invalid base url {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidInput(format!("base url cannot be a base: {}", config.base_url)));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ApiError::Network(Arc::new(e)))?;

        Ok(Self { http, base_url, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Build the endpoint URL for a subject, escaping it as one path segment.
    pub fn endpoint(&self, subject: &Subject) -> Result<Url, ApiError> {
        let resource = match subject {
            Subject::Name(_) => "search_profile",
            Subject::Id(_) => "profile",
        };

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidInput(format!("base url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push(resource)
            .push(subject.as_str());
        url.query_pairs_mut().append_pair("tests", "true");

        Ok(url)
    }

    /// Fetch a raw profile, retrying transient failures with backoff.
    pub async fn fetch_profile(&self, subject: &Subject) -> Result<RawProfile, ApiError> {
        let url = self.endpoint(subject)?;
        let retry = self.config.retry;
        let mut attempt: u32 = 0;

        loop {
            let response = self
                .http
                .get(url.clone())
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            tracing::debug!(url = %url, attempt, status = status.as_u16(), "ranking API response");

            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound);
            }

            if status.is_success() {
                let bytes = response.bytes().await?;
                return serde_json::from_slice(&bytes).map_err(|e| ApiError::Parse(e.to_string()));
            }

            let rate_limited = status == StatusCode::TOO_MANY_REQUESTS;
            if !rate_limited && status.as_u16() < 500 {
                return Err(ApiError::Server { status: status.as_u16() });
            }

            if attempt >= retry.max_retries {
                tracing::warn!(url = %url, attempts = attempt + 1, status = status.as_u16(), "retry budget exhausted");
                return Err(if rate_limited {
                    ApiError::RateLimited { status: status.as_u16() }
                } else {
                    ApiError::Server { status: status.as_u16() }
                });
            }

            let delay = retry.delay(attempt);
            tracing::debug!(url = %url, attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
