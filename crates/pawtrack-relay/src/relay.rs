//! Upstream fetch logic

use anyhow::Result;
use axum::http::HeaderValue;
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RelayConfig;
use crate::security::{check_url, TargetPolicy};

/// Content type used when the upstream does not send one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// HTTP client for upstream requests
    pub http_client: reqwest::Client,

    /// What targets may be fetched
    pub policy: Arc<TargetPolicy>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Initialize application state from configuration
    pub fn new(config: &RelayConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        let policy = Arc::new(config.target_policy());
        let http_client = build_client(config, policy.clone())?;

        info!(
            allow_local = policy.allow_local,
            allowed_domains = ?policy.allowed_domains,
            "Relay target policy configured"
        );

        Ok(Self {
            http_client,
            policy,
            metrics_handle,
        })
    }

    /// State around a prebuilt client
    pub fn with_client(
        http_client: reqwest::Client,
        policy: TargetPolicy,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            http_client,
            policy: Arc::new(policy),
            metrics_handle,
        }
    }
}

/// Build the upstream client.
///
/// Redirects are followed up to `max_redirects`, and every hop is held to
/// the same target policy as the original URL.
pub fn build_client(config: &RelayConfig, policy: Arc<TargetPolicy>) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.upstream_timeout())
        .redirect(redirect_policy(config.max_redirects, policy))
        .build()?;
    Ok(client)
}

/// Redirect policy that re-validates each hop
pub fn redirect_policy(max_redirects: usize, policy: Arc<TargetPolicy>) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= max_redirects {
            return attempt.error(format!("too many redirects (max {})", max_redirects));
        }
        match check_url(attempt.url(), &policy) {
            Ok(()) => {
                debug!(to = %attempt.url(), "Following upstream redirect");
                attempt.follow()
            }
            Err(e) => {
                warn!(to = %attempt.url(), error = %e, "Refusing upstream redirect");
                attempt.error(format!("redirect refused: {}", e))
            }
        }
    })
}

/// Failure fetching an upstream asset
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Failed to fetch model from {url}: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch model from {url}: upstream returned {status}")]
    Status { url: Url, status: reqwest::StatusCode },
}

/// Fetch `url` and buffer the whole body
pub async fn fetch_upstream(
    client: &reqwest::Client,
    url: Url,
) -> std::result::Result<(HeaderValue, bytes::Bytes), UpstreamError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| UpstreamError::Transport {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status { url, status });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let body = response
        .bytes()
        .await
        .map_err(|source| UpstreamError::Transport { url, source })?;

    Ok((content_type, body))
}
