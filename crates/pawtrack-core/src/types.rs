//! Core types for PawTrack

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One label/probability pair emitted by the classifier for a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    /// Class label as reported by the model
    pub label: String,

    /// Probability in `[0, 1]`
    pub probability: f32,
}

impl RawPrediction {
    /// Create a new prediction
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Probability as a rounded percentage
    pub fn percent(&self) -> u8 {
        (self.probability * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// A ranked species/breed guess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedGuess {
    /// Label of the matching prediction
    pub breed: String,

    /// Rounded percentage (0-100)
    pub confidence: u8,

    /// Raw probability
    pub probability: f32,
}

impl From<&RawPrediction> for BreedGuess {
    fn from(prediction: &RawPrediction) -> Self {
        Self {
            breed: prediction.label.clone(),
            confidence: prediction.percent(),
            probability: prediction.probability,
        }
    }
}

/// Outcome of one detection call, handed to the caller for display.
///
/// Serializes in camelCase (`petType`) so UI layers can consume it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Whether a pet was found in the image
    pub detected: bool,

    /// Top matching label when detected
    pub pet_type: Option<String>,

    /// Rounded percentage of the top matching label, 0 when not detected
    pub confidence: u8,

    /// Up to three ranked guesses, present only when detected
    pub breeds: Option<Vec<BreedGuess>>,

    /// Creation time, for display and debugging
    pub timestamp: DateTime<Utc>,
}

impl DetectionResult {
    /// The benign "nothing found" shape
    pub fn not_detected() -> Self {
        Self {
            detected: false,
            pet_type: None,
            confidence: 0,
            breeds: None,
            timestamp: Utc::now(),
        }
    }

    /// Build a positive result from a non-empty ranked breed list.
    ///
    /// Returns the not-detected shape when `breeds` is empty.
    pub fn from_breeds(breeds: Vec<BreedGuess>) -> Self {
        match breeds.first() {
            Some(top) => Self {
                detected: true,
                pet_type: Some(top.breed.clone()),
                confidence: top.confidence,
                breeds: Some(breeds),
                timestamp: Utc::now(),
            },
            None => Self::not_detected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(RawPrediction::new("tabby", 0.42).percent(), 42);
        assert_eq!(RawPrediction::new("tabby", 0.155).percent(), 16);
        assert_eq!(RawPrediction::new("tabby", 1.0).percent(), 100);
        assert_eq!(RawPrediction::new("tabby", 0.0).percent(), 0);
    }

    #[test]
    fn test_not_detected_shape() {
        let result = DetectionResult::not_detected();
        assert!(!result.detected);
        assert!(result.pet_type.is_none());
        assert_eq!(result.confidence, 0);
        assert!(result.breeds.is_none());
    }

    #[test]
    fn test_from_breeds_uses_top_entry() {
        let breeds = vec![
            BreedGuess::from(&RawPrediction::new("beagle", 0.61)),
            BreedGuess::from(&RawPrediction::new("basset hound", 0.2)),
        ];
        let result = DetectionResult::from_breeds(breeds);

        assert!(result.detected);
        assert_eq!(result.pet_type.as_deref(), Some("beagle"));
        assert_eq!(result.confidence, 61);
        assert_eq!(result.breeds.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(DetectionResult::not_detected()).unwrap();

        assert_eq!(json["detected"], false);
        assert!(json["petType"].is_null());
        assert!(json["breeds"].is_null());
        assert_eq!(json["confidence"], 0);
        assert!(json["timestamp"].is_string());
    }
}
