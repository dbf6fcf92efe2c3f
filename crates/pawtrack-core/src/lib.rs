//! PawTrack Core
//!
//! Core types shared across PawTrack components.
//!
//! This crate provides:
//! - Raw classifier predictions and the detection result handed back to callers
//! - Error types and result handling for model loading, inference and the relay

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{BreedGuess, DetectionResult, RawPrediction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{BreedGuess, DetectionResult, RawPrediction};
}
