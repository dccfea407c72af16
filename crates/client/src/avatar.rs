//! Avatar image warming.
//!
//! Warming is a side effect of successful lookups and of explicit prefetch
//! requests. It runs on detached tasks; nothing waits for it and its
//! failures are only logged.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use reqwest::header;
use tokio::task::JoinHandle;

use crate::ApiError;

/// Something that can pre-load a player's avatar image.
#[async_trait::async_trait]
pub trait ImageWarmer: Send + Sync {
    /// Warm the image at `url` for player `id`.
    async fn warm(&self, id: &str, url: &str) -> Result<(), ApiError>;
}

/// Warms images by fetching them once over HTTP, so upstream and
/// intermediate caches hold them before the UI asks.
#[derive(Debug)]
pub struct HttpImageWarmer {
    http: reqwest::Client,
    warmed: DashSet<String>,
}

impl HttpImageWarmer {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .use_rustls_tls()
            .build()
            .map_err(|e| ApiError::Network(Arc::new(e)))?;

        Ok(Self { http, warmed: DashSet::new() })
    }

    /// Whether `url` has already been warmed by this instance.
    pub fn is_warmed(&self, url: &str) -> bool {
        self.warmed.contains(url)
    }
}

#[async_trait::async_trait]
impl ImageWarmer for HttpImageWarmer {
    async fn warm(&self, id: &str, url: &str) -> Result<(), ApiError> {
        if !self.warmed.insert(url.to_string()) {
            return Ok(());
        }

        let result = async {
            let response = self.http.get(url).header(header::ACCEPT, "image/*").send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ApiError::Server { status: status.as_u16() });
            }
            response.bytes().await?;
            Ok(())
        }
        .await;

        match &result {
            Ok(()) => tracing::debug!(id = %id, url = %url, "avatar warmed"),
            Err(_) => {
                self.warmed.remove(url);
            }
        }

        result
    }
}

/// Warm an avatar on a detached task. Failures are logged and discarded.
pub fn spawn_warm(warmer: Arc<dyn ImageWarmer>, id: String, url: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = warmer.warm(&id, &url).await {
            tracing::debug!(id = %id, url = %url, error = %e, "avatar warming failed");
        }
    })
}
