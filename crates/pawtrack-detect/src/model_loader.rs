//! Classifier loading with timeout, retry, and fallback variants
//!
//! The loader owns the session's single classifier. It walks its ordered
//! variant list one attempt at a time:
//!
//! ```text
//! Idle -> Loading(0) -> Ready
//!              |
//!              +-> Loading(1) -> Ready
//!                       |
//!                       +-> Loading(2) -> Ready | Failed
//! ```
//!
//! Each attempt races the backend against [`MODEL_LOAD_TIMEOUT`]. After a
//! failure the loader waits [`RETRY_BACKOFF`] before moving to the next
//! variant. At most [`MAX_LOAD_ATTEMPTS`] attempts are made.

use crate::classifier::ImageClassifier;
use crate::fetcher::{ModelFetcher, RelayRewrite};
use crate::model_config::ModelVariant;
use async_trait::async_trait;
use pawtrack_core::{Error, Result};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Deadline for one load attempt
pub const MODEL_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Wait between a failed attempt and the next one
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Upper bound on attempts per session
pub const MAX_LOAD_ATTEMPTS: usize = 3;

/// Builds a classifier for one variant using the supplied fetcher
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Download and initialize `variant`
    async fn load(
        &self,
        variant: &ModelVariant,
        fetcher: &ModelFetcher,
    ) -> Result<Arc<dyn ImageClassifier>>;
}

/// Loader lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderState {
    /// Nothing started yet
    Idle,
    /// Attempt `attempt` (0-based) is in flight or backing off
    Loading { attempt: usize, variant: String },
    /// Model available
    Ready { variant: String },
    /// All attempts exhausted
    Failed { message: String },
}

impl LoaderState {
    /// `Ready` or `Failed`
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Failed { .. })
    }
}

/// The state callers are allowed to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderStatus {
    pub model_loaded: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl From<&LoaderState> for LoaderStatus {
    fn from(state: &LoaderState) -> Self {
        match state {
            LoaderState::Idle => Self {
                model_loaded: false,
                is_loading: false,
                error: None,
            },
            LoaderState::Loading { .. } => Self {
                model_loaded: false,
                is_loading: true,
                error: None,
            },
            LoaderState::Ready { .. } => Self {
                model_loaded: true,
                is_loading: false,
                error: None,
            },
            LoaderState::Failed { message } => Self {
                model_loaded: false,
                is_loading: false,
                error: Some(message.clone()),
            },
        }
    }
}

/// Owns the session's classifier and its loading lifecycle
pub struct ModelLoader {
    backend: Arc<dyn ModelBackend>,
    fetcher: ModelFetcher,
    relay: Option<RelayRewrite>,
    variants: Vec<ModelVariant>,
    state: watch::Sender<LoaderState>,
    model: OnceLock<Arc<dyn ImageClassifier>>,
    load_lock: Mutex<()>,
}

impl ModelLoader {
    /// Create a loader. `variants` must not be empty.
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        fetcher: ModelFetcher,
        variants: Vec<ModelVariant>,
    ) -> Result<Self> {
        if variants.is_empty() {
            return Err(Error::config("at least one model variant is required"));
        }

        let (state, _) = watch::channel(LoaderState::Idle);

        Ok(Self {
            backend,
            fetcher,
            relay: None,
            variants,
            state,
            model: OnceLock::new(),
            load_lock: Mutex::new(()),
        })
    }

    /// Route allow-listed hosts through the model relay during attempts
    pub fn with_relay(mut self, relay: RelayRewrite) -> Self {
        self.relay = Some(relay);
        self
    }

    /// The unscoped fetcher this loader was built with
    pub fn fetcher(&self) -> &ModelFetcher {
        &self.fetcher
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoaderState {
        self.state.borrow().clone()
    }

    /// `modelLoaded` / `isLoading` / `error` snapshot
    pub fn status(&self) -> LoaderStatus {
        LoaderStatus::from(&*self.state.borrow())
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.state.subscribe()
    }

    /// The loaded model, if ready
    pub fn model(&self) -> Option<Arc<dyn ImageClassifier>> {
        self.model.get().cloned()
    }

    /// Start loading in the background
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let loader = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = loader.load().await {
                debug!(error = %e, "Background model load finished without a model");
            }
        })
    }

    /// Wait until the loader is `Ready` or `Failed`.
    ///
    /// Never returns if loading was never started.
    pub async fn wait_settled(&self) -> LoaderState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(LoaderState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Load the model, retrying with fallback variants.
    ///
    /// Concurrent callers are serialized; once a model is ready it is
    /// returned without reloading, and once loading has failed the failure
    /// is returned without further attempts.
    pub async fn load(&self) -> Result<Arc<dyn ImageClassifier>> {
        let _guard = self.load_lock.lock().await;

        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        if let LoaderState::Failed { message } = &*self.state.borrow() {
            return Err(Error::load(message.clone()));
        }

        let attempts = self.variants.len().min(MAX_LOAD_ATTEMPTS);
        let mut last_error = None;

        for (attempt, variant) in self.variants.iter().take(attempts).enumerate() {
            if attempt > 0 {
                debug!(backoff = ?RETRY_BACKOFF, "Backing off before next load attempt");
                tokio::time::sleep(RETRY_BACKOFF).await;
            }

            self.state.send_replace(LoaderState::Loading {
                attempt,
                variant: variant.name.clone(),
            });

            info!(attempt = attempt + 1, of = attempts, variant = %variant.name, "Loading pet detection model");
            metrics::counter!("pawtrack_model_load_attempts_total", "variant" => variant.name.clone())
                .increment(1);

            let start = Instant::now();
            match self.attempt(variant).await {
                Ok(model) => {
                    let model = Arc::clone(self.model.get_or_init(|| model));
                    self.state.send_replace(LoaderState::Ready {
                        variant: variant.name.clone(),
                    });
                    info!(
                        variant = %variant.name,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Pet detection model ready"
                    );
                    return Ok(model);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, variant = %variant.name, error = %e, "Model load attempt failed");
                    metrics::counter!("pawtrack_model_load_failures_total", "variant" => variant.name.clone())
                        .increment(1);
                    last_error = Some(e);
                }
            }
        }

        let message = format!(
            "Failed to load the pet detection model after {} attempts. Please refresh the page and try again.",
            attempts
        );
        error!(
            last_error = %last_error.as_ref().map(ToString::to_string).unwrap_or_default(),
            "{}", message
        );

        self.state.send_replace(LoaderState::Failed {
            message: message.clone(),
        });

        Err(Error::load(message))
    }

    /// One attempt: scoped fetcher, backend load, deadline.
    ///
    /// On timeout the backend future is dropped. Work it detached can still
    /// finish later, but it holds no handle on the loader and cannot publish
    /// state; all transitions happen under `load_lock`.
    async fn attempt(&self, variant: &ModelVariant) -> Result<Arc<dyn ImageClassifier>> {
        let fetcher = match &self.relay {
            Some(relay) => self.fetcher.scoped(relay.clone()),
            None => self.fetcher.clone(),
        };

        match tokio::time::timeout(MODEL_LOAD_TIMEOUT, self.backend.load(variant, &fetcher)).await {
            Ok(result) => result,
            Err(_) => Err(Error::ModelLoadTimeout(MODEL_LOAD_TIMEOUT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let idle = LoaderStatus::from(&LoaderState::Idle);
        assert!(!idle.model_loaded && !idle.is_loading && idle.error.is_none());

        let loading = LoaderStatus::from(&LoaderState::Loading {
            attempt: 1,
            variant: "small".into(),
        });
        assert!(loading.is_loading);
        assert!(!loading.model_loaded);

        let ready = LoaderStatus::from(&LoaderState::Ready {
            variant: "small".into(),
        });
        assert!(ready.model_loaded);
        assert!(ready.error.is_none());

        let failed = LoaderStatus::from(&LoaderState::Failed {
            message: "refresh".into(),
        });
        assert_eq!(failed.error.as_deref(), Some("refresh"));
        assert!(!failed.is_loading);
    }

    #[test]
    fn test_settled_states() {
        assert!(!LoaderState::Idle.is_settled());
        assert!(LoaderState::Ready { variant: "v".into() }.is_settled());
        assert!(LoaderState::Failed { message: "m".into() }.is_settled());
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_value(LoaderStatus::from(&LoaderState::Idle)).unwrap();
        assert_eq!(json["modelLoaded"], false);
        assert_eq!(json["isLoading"], false);
        assert!(json["error"].is_null());
    }
}
