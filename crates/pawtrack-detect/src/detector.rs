//! Detection orchestrator: decode, infer, decide
//!
//! Detection is an assistive step in front of a manual report form, so the
//! public methods never return an error. Any failure is logged and turned
//! into the not-detected shape.

use crate::classifier::ImageClassifier;
use crate::decision::{decide, rank_breeds};
use crate::decode::decode_image;
use crate::inference::InferenceEngine;
use crate::model_loader::{LoaderStatus, ModelLoader};
use crate::taxonomy::PetTaxonomy;
use image::DynamicImage;
use pawtrack_core::{BreedGuess, DetectionResult, RawPrediction, Result};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs the full pet detection pipeline against the session's model
pub struct PetDetector {
    loader: Arc<ModelLoader>,
    taxonomy: PetTaxonomy,
}

impl PetDetector {
    /// Create a detector using the built-in taxonomy
    pub fn new(loader: Arc<ModelLoader>) -> Self {
        Self::with_taxonomy(loader, PetTaxonomy::default())
    }

    /// Create a detector with a custom taxonomy
    pub fn with_taxonomy(loader: Arc<ModelLoader>, taxonomy: PetTaxonomy) -> Self {
        Self { loader, taxonomy }
    }

    /// Loader state as seen by callers
    pub fn status(&self) -> LoaderStatus {
        self.loader.status()
    }

    /// The loader backing this detector
    pub fn loader(&self) -> &Arc<ModelLoader> {
        &self.loader
    }

    /// Decode `file`, classify it, and decide whether it shows a pet
    pub async fn detect_and_classify(&self, file: &[u8]) -> DetectionResult {
        let result = match self.predict_file(file).await {
            Some(predictions) => decide(&predictions, &self.taxonomy),
            None => DetectionResult::not_detected(),
        };
        Self::record(&result);
        result
    }

    /// Same as [`detect_and_classify`](Self::detect_and_classify) for an
    /// already decoded image
    pub async fn detect_image(&self, image: &DynamicImage) -> DetectionResult {
        let result = match self.predict(image).await {
            Some(predictions) => decide(&predictions, &self.taxonomy),
            None => DetectionResult::not_detected(),
        };
        Self::record(&result);
        result
    }

    /// Top-3 breed guesses without the pet/not-pet gate
    pub async fn classify_breed(&self, file: &[u8]) -> Option<Vec<BreedGuess>> {
        let predictions = self.predict_file(file).await?;
        rank_breeds(&predictions, &self.taxonomy)
    }

    fn ready_model(&self) -> Option<Arc<dyn ImageClassifier>> {
        let model = self.loader.model();
        if model.is_none() {
            warn!(status = ?self.loader.status(), "Detection requested before the model is ready");
        }
        model
    }

    async fn predict_file(&self, file: &[u8]) -> Option<Vec<RawPrediction>> {
        let model = self.ready_model()?;
        match Self::pipeline(model.as_ref(), file).await {
            Ok(predictions) => Some(predictions),
            Err(e) => {
                error!(error = %e, bytes = file.len(), "Pet detection failed");
                None
            }
        }
    }

    async fn predict(&self, image: &DynamicImage) -> Option<Vec<RawPrediction>> {
        let model = self.ready_model()?;
        match InferenceEngine::infer(model.as_ref(), image).await {
            Ok(predictions) => Some(predictions),
            Err(e) => {
                error!(error = %e, "Pet detection failed");
                None
            }
        }
    }

    async fn pipeline(model: &dyn ImageClassifier, file: &[u8]) -> Result<Vec<RawPrediction>> {
        let image = decode_image(file)?;
        debug!(width = image.width(), height = image.height(), "Image decoded");
        InferenceEngine::infer(model, &image).await
    }

    fn record(result: &DetectionResult) {
        metrics::counter!("pawtrack_detections_total", "detected" => result.detected.to_string())
            .increment(1);
        if result.detected {
            info!(
                pet_type = result.pet_type.as_deref().unwrap_or_default(),
                confidence = result.confidence,
                "Pet detected"
            );
        } else {
            debug!("No pet detected");
        }
    }
}
