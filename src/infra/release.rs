//! Release marker lookup
//!
//! Reads the small text files in the Kubernetes release bucket that name the
//! newest version of each channel (`release/stable.txt` and friends).

use backoff::ExponentialBackoff;
use std::time::Duration;

use crate::config::{defaults, urls};
use crate::core::channel::Channel;
use crate::core::resolver::{self, ResolveError, VersionResolver};

/// Resolver reading release markers over HTTP
#[derive(Debug, Clone)]
pub struct ReleaseMarkerResolver {
    /// HTTP client
    client: reqwest::Client,
    /// Release bucket base URL
    base_url: String,
    /// Maximum attempts per marker
    max_retries: u32,
    /// Initial delay between attempts
    initial_delay: Duration,
}

impl ReleaseMarkerResolver {
    /// Create a resolver for the public release bucket
    pub fn new() -> Self {
        Self::with_base_url(urls::KUBERNETES_RELEASE)
    }

    /// Create a resolver for a custom release bucket
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: defaults::MAX_RESOLVE_RETRIES,
            initial_delay: Duration::from_millis(500),
        }
    }

    /// Override retry behavior
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, initial_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.initial_delay = initial_delay;
        self
    }

    /// URL of the marker for `channel`
    pub fn marker_url(&self, channel: Channel) -> String {
        format!("{}/{}.txt", self.base_url, channel.release_marker())
    }

    fn backoff_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_delay,
            max_interval: Duration::from_secs(10),
            max_elapsed_time: Some(Duration::from_secs(defaults::RESOLVE_MAX_ELAPSED_SECS)),
            ..ExponentialBackoff::default()
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, backoff::Error<ResolveError>> {
        let fetch_error = |error: String| ResolveError::Fetch {
            url: url.to_string(),
            error,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| backoff::Error::transient(fetch_error(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let error = fetch_error(format!("HTTP {status}"));
            // Only server-side trouble is worth another attempt
            return Err(if status.is_server_error() {
                backoff::Error::transient(error)
            } else {
                backoff::Error::permanent(error)
            });
        }

        response
            .text()
            .await
            .map_err(|e| backoff::Error::transient(fetch_error(e.to_string())))
    }
}

impl Default for ReleaseMarkerResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionResolver for ReleaseMarkerResolver {
    async fn resolve(&self, channel: Channel) -> Result<String, ResolveError> {
        let url = self.marker_url(channel);
        tracing::debug!("Fetching release marker {url}");

        let mut attempts = 0;
        let body = backoff::future::retry(self.backoff_policy(), || {
            attempts += 1;
            let attempt = attempts;
            let url = url.as_str();
            async move {
                match self.fetch_once(url).await {
                    Err(backoff::Error::Transient { err, .. }) if attempt >= self.max_retries => {
                        Err(backoff::Error::permanent(err))
                    }
                    other => other,
                }
            }
        })
        .await?;

        let version = resolver::normalize(&body);
        if version.is_empty() {
            return Err(ResolveError::InvalidVersion {
                version: body,
                reason: format!("empty release marker at {url}"),
            });
        }
        Ok(version)
    }
}
