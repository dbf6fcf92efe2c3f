//! Relay configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::security::TargetPolicy;

/// Relay configuration, loaded from YAML with CLI overrides on top
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// User-Agent sent to model hosts
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request upstream timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Maximum redirects followed per upstream request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Permit loopback and private targets
    #[serde(default)]
    pub allow_local: bool,

    /// Restrict targets to these domains
    #[serde(default)]
    pub allowed_domains: Option<Vec<String>>,
}

impl RelayConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &crate::Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        if let Some(user_agent) = &cli.user_agent {
            config.user_agent = user_agent.clone();
        }

        if let Some(timeout) = cli.upstream_timeout {
            config.upstream_timeout_secs = timeout;
        }

        if cli.allow_local {
            config.allow_local = true;
        }

        if !cli.allowed_domain.is_empty() {
            config.allowed_domains = Some(cli.allowed_domain.clone());
        }

        Ok(config)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Target policy derived from this configuration
    pub fn target_policy(&self) -> TargetPolicy {
        TargetPolicy {
            allow_local: self.allow_local,
            allowed_domains: self.allowed_domains.clone(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            user_agent: default_user_agent(),
            upstream_timeout_secs: default_upstream_timeout(),
            max_redirects: default_max_redirects(),
            allow_local: false,
            allowed_domains: None,
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (compatible; PawTrack-ModelRelay/",
        env!("CARGO_PKG_VERSION"),
        "; +https://github.com/pawtrack/pawtrack)"
    )
    .to_string()
}

fn default_upstream_timeout() -> u64 {
    120
}

fn default_max_redirects() -> usize {
    10
}
