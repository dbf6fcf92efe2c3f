//! Configuration for the detector and model loading

use crate::fetcher::{ModelFetcher, RelayRewrite, DEFAULT_USER_AGENT};
use crate::mobilenet::{MobileNetBackend, DEFAULT_TOP_K};
use crate::model_config::ModelVariant;
use crate::model_loader::ModelLoader;
use pawtrack_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Route model-host downloads through this relay
    #[serde(default)]
    pub relay: Option<RelayRewrite>,

    /// Variants in the order the loader tries them
    #[serde(default = "ModelVariant::defaults")]
    pub variants: Vec<ModelVariant>,

    /// User-Agent for model downloads
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Predictions kept per image
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            relay: None,
            variants: ModelVariant::defaults(),
            user_agent: default_user_agent(),
            top_k: default_top_k(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DetectorConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid detector config: {}", e)))
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Use the relay at `base` (`http://host:port`) for the default model hosts
    pub fn with_relay_base(mut self, base: &str) -> Result<Self> {
        self.relay = Some(RelayRewrite::from_base(base)?);
        Ok(self)
    }

    /// Build a loader backed by the MobileNet backend
    pub fn build_loader(&self) -> Result<Arc<ModelLoader>> {
        let fetcher = ModelFetcher::new(
            &self.user_agent,
            Duration::from_secs(self.request_timeout_secs),
        )?;
        let backend = Arc::new(MobileNetBackend::new(self.top_k));

        let mut loader = ModelLoader::new(backend, fetcher, self.variants.clone())?;
        if let Some(relay) = &self.relay {
            loader = loader.with_relay(relay.clone());
        }

        Ok(Arc::new(loader))
    }
}

/// Load detector configuration from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> Result<DetectorConfig> {
    let path = path.as_ref();
    DetectorConfig::from_file(path)
        .map_err(|e| Error::config(format!("Failed to load detector config {:?}: {}", path, e)))
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_request_timeout_secs() -> u64 {
    60
}
