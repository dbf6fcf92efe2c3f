//! Image classifier trait

use async_trait::async_trait;
use image::DynamicImage;
use pawtrack_core::{RawPrediction, Result};

/// A loaded image-classification model.
///
/// Implementations are immutable once constructed and shared behind an
/// `Arc` for the rest of the session.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Run one forward pass over `image`.
    ///
    /// Returns predictions sorted by descending probability.
    async fn classify(&self, image: &DynamicImage) -> Result<Vec<RawPrediction>>;

    /// Get the classifier name
    fn name(&self) -> &str;
}
