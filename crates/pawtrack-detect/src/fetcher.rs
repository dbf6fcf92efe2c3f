//! Model asset fetching with scoped relay rewriting
//!
//! Model hosts frequently refuse cross-origin requests, so downloads for a
//! known set of hosts are routed through the same-origin model relay. The
//! rewrite lives on a [`ModelFetcher`] instance handed to a single load
//! attempt; other fetchers built from the same client are unaffected.

use bytes::Bytes;
use pawtrack_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Hosts whose requests are routed through the relay by default
pub const DEFAULT_MODEL_HOSTS: &[&str] = &[
    "huggingface.co",
    "hf.co",
    "hf-mirror.com",
    "storage.googleapis.com",
    "tfhub.dev",
    "kaggle.com",
];

/// Path of the relay endpoint on the relay server
pub const RELAY_PATH: &str = "/api/proxy-model";

/// Default User-Agent for direct model downloads
pub const DEFAULT_USER_AGENT: &str = concat!("pawtrack-detect/", env!("CARGO_PKG_VERSION"));

/// Rewrites requests for allow-listed hosts to the relay endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRewrite {
    /// Full relay endpoint, e.g. `http://localhost:8080/api/proxy-model`
    pub endpoint: Url,

    /// Hosts to reroute; subdomains match too
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
}

fn default_hosts() -> Vec<String> {
    DEFAULT_MODEL_HOSTS.iter().map(|h| h.to_string()).collect()
}

impl RelayRewrite {
    /// Create a rewrite for the default model hosts
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            hosts: default_hosts(),
        }
    }

    /// Build from a relay server base URL (`http://host:port`)
    pub fn from_base(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| Error::config(format!("Invalid relay URL '{}': {}", base, e)))?;
        let endpoint = base
            .join(RELAY_PATH)
            .map_err(|e| Error::config(format!("Invalid relay URL '{}': {}", base, e)))?;
        Ok(Self::new(endpoint))
    }

    /// Replace the host allow-list
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether a host is on the allow-list
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.hosts.iter().any(|allowed| {
            let allowed = allowed.to_ascii_lowercase();
            host == allowed || host.ends_with(&format!(".{}", allowed))
        })
    }

    /// Relay URL for `target`, or `None` when the host is not allow-listed
    pub fn rewrite(&self, target: &Url) -> Option<Url> {
        let host = target.host_str()?;
        if !self.matches_host(host) {
            return None;
        }

        let mut relayed = self.endpoint.clone();
        relayed
            .query_pairs_mut()
            .clear()
            .append_pair("url", target.as_str());
        Some(relayed)
    }
}

/// HTTP fetcher used by model backends to download weights and labels
#[derive(Debug, Clone)]
pub struct ModelFetcher {
    client: reqwest::Client,
    relay: Option<RelayRewrite>,
}

impl ModelFetcher {
    /// Create a fetcher with its own client
    pub fn new(user_agent: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::from_client(client))
    }

    /// Wrap an existing client without any rewriting
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            relay: None,
        }
    }

    /// A fetcher sharing this client's pool with `relay` applied.
    ///
    /// `self` is left untouched.
    pub fn scoped(&self, relay: RelayRewrite) -> Self {
        Self {
            client: self.client.clone(),
            relay: Some(relay),
        }
    }

    /// The active rewrite, if any
    pub fn relay(&self) -> Option<&RelayRewrite> {
        self.relay.as_ref()
    }

    /// Final URL a request for `url` is sent to
    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.route(url).map(|(resolved, _)| resolved)
    }

    /// Resolved URL plus whether it points at the relay
    fn route(&self, url: &str) -> Result<(Url, bool)> {
        let target =
            Url::parse(url).map_err(|e| Error::load(format!("Invalid model URL '{}': {}", url, e)))?;

        Ok(match self.relay.as_ref().and_then(|relay| relay.rewrite(&target)) {
            Some(relayed) => (relayed, true),
            None => (target, false),
        })
    }

    /// Download `url` and return the body
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let (resolved, relayed) = self.route(url)?;
        debug!(url, relayed, "Fetching model asset");

        let response = self
            .client
            .get(resolved)
            .send()
            .await
            .map_err(|e| Error::load(format!("Request for {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("{} returned HTTP {}", url, status);
            return Err(if relayed {
                Error::relay(message)
            } else {
                Error::load(message)
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::load(format!("Failed to read body of {}: {}", url, e)))
    }
}
