//! PawTrack Detect
//!
//! Client-side pet detection: given an uploaded photo, decide whether it
//! shows a pet and rank the most likely species/breeds.
//!
//! The pipeline has three stages:
//! - Model loading: download and initialize a MobileNetV4 classifier,
//!   retrying with smaller variants and timing each attempt out
//! - Inference: one forward pass producing ranked ImageNet labels
//! - Decision: filter labels against a pet keyword taxonomy and apply the
//!   inclusion and detection floors
//!
//! Model downloads for known hosts can be routed through the PawTrack model
//! relay. The rewrite is applied per load attempt, never globally.

pub mod classifier;
pub mod config;
pub mod decision;
pub mod decode;
pub mod detector;
pub mod fetcher;
pub mod inference;
pub mod mobilenet;
pub mod model_config;
pub mod model_loader;
pub mod taxonomy;

pub use classifier::ImageClassifier;
pub use config::{load_config, DetectorConfig};
pub use decision::{decide, rank_breeds, DETECTION_FLOOR, INCLUSION_FLOOR, MAX_BREEDS};
pub use detector::PetDetector;
pub use fetcher::{ModelFetcher, RelayRewrite};
pub use inference::InferenceEngine;
pub use mobilenet::{MobileNetBackend, MobileNetClassifier};
pub use model_config::{Architecture, ModelVariant};
pub use model_loader::{
    LoaderState, LoaderStatus, ModelBackend, ModelLoader, MAX_LOAD_ATTEMPTS, MODEL_LOAD_TIMEOUT,
    RETRY_BACKOFF,
};
pub use taxonomy::{PetTaxonomy, PET_KEYWORDS};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::ImageClassifier;
    pub use crate::config::DetectorConfig;
    pub use crate::detector::PetDetector;
    pub use crate::model_loader::{LoaderState, LoaderStatus, ModelLoader};
    pub use pawtrack_core::{BreedGuess, DetectionResult, RawPrediction};
}
