//! HTTP page fetching.
//!
//! A single GET per call, no retries. Callers that want the "log and carry
//! on" behavior use [`HtmlFetcher::fetch_or_log`].

use crate::error::NewsError;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument};

/// Timeouts and identity used for every request.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Source of raw HTML.
pub trait HtmlFetcher {
    /// GET `url` and return the body as text.
    async fn fetch(&self, url: &str) -> Result<String, NewsError>;

    /// [`fetch`](Self::fetch), with failures logged and turned into `None`.
    async fn fetch_or_log(&self, url: &str) -> Option<String> {
        match self.fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                error!(%url, error = %e, kind = e.kind(), "Fetch failed");
                None
            }
        }
    }
}

/// [`HtmlFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// # Errors
    ///
    /// [`NewsError::Config`] if the HTTP client cannot be built.
    pub fn new(settings: &FetchSettings) -> Result<Self, NewsError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| NewsError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }
}

impl HtmlFetcher for ReqwestFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, NewsError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsError::network(url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsError::network(url, format!("HTTP status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NewsError::network(url, describe(&e)))?;

        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    }
}
