//! Single forward pass over a decoded image

use crate::classifier::ImageClassifier;
use image::DynamicImage;
use pawtrack_core::{Error, RawPrediction, Result};
use std::time::Instant;
use tracing::debug;

/// Thin wrapper that runs the classifier and types its failures
pub struct InferenceEngine;

impl InferenceEngine {
    /// Classify `image`, surfacing any classifier error as `InferenceFailed`.
    ///
    /// The returned list keeps the classifier's descending order.
    pub async fn infer(model: &dyn ImageClassifier, image: &DynamicImage) -> Result<Vec<RawPrediction>> {
        let start = Instant::now();

        let predictions = model.classify(image).await.map_err(|e| match e {
            Error::InferenceFailed(msg) => Error::InferenceFailed(msg),
            other => Error::inference(format!("{}: {}", model.name(), other)),
        })?;

        let latency_us = start.elapsed().as_micros() as u64;
        metrics::histogram!("pawtrack_inference_latency_us", "model" => model.name().to_string())
            .record(latency_us as f64);
        debug!(
            model = model.name(),
            latency_us,
            predictions = predictions.len(),
            "Inference complete"
        );

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(Vec<RawPrediction>);

    #[async_trait]
    impl ImageClassifier for Fixed {
        async fn classify(&self, _image: &DynamicImage) -> Result<Vec<RawPrediction>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct Broken;

    #[async_trait]
    impl ImageClassifier for Broken {
        async fn classify(&self, _image: &DynamicImage) -> Result<Vec<RawPrediction>> {
            Err(Error::internal("tensor shape mismatch"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_passes_predictions_through() {
        let model = Fixed(vec![
            RawPrediction::new("tabby", 0.7),
            RawPrediction::new("tiger cat", 0.2),
        ]);
        let image = DynamicImage::new_rgb8(8, 8);

        let predictions = InferenceEngine::infer(&model, &image).await.unwrap();
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].label, "tabby");
    }

    #[tokio::test]
    async fn test_failures_become_inference_failed() {
        let image = DynamicImage::new_rgb8(8, 8);

        let err = InferenceEngine::infer(&Broken, &image).await.unwrap_err();
        match err {
            Error::InferenceFailed(msg) => assert!(msg.contains("broken")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
