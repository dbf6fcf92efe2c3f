//! Mock classifiers and backends for testing
//!
//! Provides scripted implementations of `ImageClassifier` and `ModelBackend`
//! for exercising the loader state machine and the detection orchestrator
//! without downloading a real model.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use pawtrack_core::{Error, RawPrediction, Result};
use pawtrack_detect::{Architecture, ImageClassifier, ModelBackend, ModelFetcher, ModelLoader, ModelVariant};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Install a test-writer subscriber once per binary; `RUST_LOG` controls it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A classifier that returns a fixed prediction list
pub struct FixedClassifier {
    name: String,
    predictions: Vec<RawPrediction>,
    call_count: AtomicU32,
}

impl FixedClassifier {
    pub fn new(predictions: &[(&str, f32)]) -> Self {
        Self {
            name: "fixed".to_string(),
            predictions: predictions
                .iter()
                .map(|(label, p)| RawPrediction::new(*label, *p))
                .collect(),
            call_count: AtomicU32::new(0),
        }
    }

    /// Get the number of times classify was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ImageClassifier for FixedClassifier {
    async fn classify(&self, _image: &DynamicImage) -> Result<Vec<RawPrediction>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Ok(self.predictions.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A classifier that always fails - for testing error paths
pub struct FailingClassifier;

#[async_trait]
impl ImageClassifier for FailingClassifier {
    async fn classify(&self, _image: &DynamicImage) -> Result<Vec<RawPrediction>> {
        Err(Error::inference("Simulated classifier failure"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// What the mock backend does on one attempt
pub enum Outcome {
    Succeed(Arc<dyn ImageClassifier>),
    Fail(&'static str),
    /// Never finishes within the attempt deadline
    Hang,
    /// Builds the model in a detached task that finishes after `delay`
    Late(Arc<dyn ImageClassifier>, Duration),
}

/// What the backend saw on one attempt
#[derive(Debug, Clone)]
pub struct Call {
    pub variant: String,
    pub relayed: bool,
    /// Where a request for `MODEL_HOST_ASSET` would have gone
    pub model_target: String,
    /// Where a request for `OTHER_HOST_URL` would have gone
    pub other_target: String,
}

pub const MODEL_HOST_ASSET: &str = "https://huggingface.co/timm/test/resolve/main/model.safetensors";
pub const OTHER_HOST_URL: &str = "https://api.pawtrack.example/pets/17";

/// A backend that plays back a script of outcomes, one per attempt
pub struct MockBackend {
    script: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<Call>>,
    late_finished: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn new(script: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            late_finished: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a detached `Late` build has run to completion
    pub fn late_finished(&self) -> bool {
        self.late_finished.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn load(
        &self,
        variant: &ModelVariant,
        fetcher: &ModelFetcher,
    ) -> Result<Arc<dyn ImageClassifier>> {
        self.calls.lock().unwrap().push(Call {
            variant: variant.name.clone(),
            relayed: fetcher.relay().is_some(),
            model_target: fetcher.resolve(MODEL_HOST_ASSET)?.to_string(),
            other_target: fetcher.resolve(OTHER_HOST_URL)?.to_string(),
        });

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Outcome::Fail("script exhausted"));

        match outcome {
            Outcome::Succeed(model) => Ok(model),
            Outcome::Fail(message) => Err(Error::load(message)),
            Outcome::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(Error::load("hung attempt finished"))
            }
            Outcome::Late(model, delay) => {
                let (tx, rx) = oneshot::channel();
                let finished = Arc::clone(&self.late_finished);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // The receiver is gone once the attempt has timed out.
                    let _ = tx.send(model);
                    finished.store(true, Ordering::SeqCst);
                });
                rx.await
                    .map_err(|_| Error::load("late build abandoned"))
            }
        }
    }
}

/// `count` distinct variants named `v0`, `v1`, ...
pub fn variants(count: usize) -> Vec<ModelVariant> {
    (0..count)
        .map(|i| ModelVariant::new(format!("v{}", i), "timm/test", Architecture::ConvSmall, 224))
        .collect()
}

pub fn fetcher() -> ModelFetcher {
    ModelFetcher::from_client(reqwest::Client::new())
}

pub fn loader(backend: Arc<MockBackend>, variant_count: usize) -> ModelLoader {
    ModelLoader::new(backend, fetcher(), variants(variant_count)).unwrap()
}

/// A loader that has already loaded `model`
pub async fn ready_loader(model: Arc<dyn ImageClassifier>) -> Arc<ModelLoader> {
    let backend = Arc::new(MockBackend::new(vec![Outcome::Succeed(model)]));
    let loader = Arc::new(loader(backend, 2));
    loader.load().await.unwrap();
    loader
}

/// A small encoded PNG
pub fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::new_rgb8(32, 24)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}
