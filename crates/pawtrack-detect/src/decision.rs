//! Pet/not-pet decision over raw classifier output
//!
//! Two floors apply. A prediction enters the candidate list only with a
//! matching label and probability of at least [`INCLUSION_FLOOR`]. The
//! image counts as a pet only if the first candidate also reaches
//! [`DETECTION_FLOOR`].

use crate::taxonomy::PetTaxonomy;
use pawtrack_core::{BreedGuess, DetectionResult, RawPrediction};

/// Minimum probability for a matching prediction to become a candidate
pub const INCLUSION_FLOOR: f32 = 0.10;

/// Minimum probability of the top candidate for a positive detection
pub const DETECTION_FLOOR: f32 = 0.15;

/// Maximum number of breed guesses returned
pub const MAX_BREEDS: usize = 3;

/// Matching predictions at or above the inclusion floor, input order kept
fn candidates<'a>(
    predictions: &'a [RawPrediction],
    taxonomy: &'a PetTaxonomy,
) -> impl Iterator<Item = &'a RawPrediction> + 'a {
    predictions
        .iter()
        .filter(move |p| p.probability >= INCLUSION_FLOOR && taxonomy.matches(&p.label))
}

/// Derive a [`DetectionResult`] from probability-descending predictions
pub fn decide(predictions: &[RawPrediction], taxonomy: &PetTaxonomy) -> DetectionResult {
    let mut filtered = candidates(predictions, taxonomy).peekable();

    let detected = filtered
        .peek()
        .is_some_and(|top| top.probability >= DETECTION_FLOOR);
    if !detected {
        return DetectionResult::not_detected();
    }

    let breeds: Vec<BreedGuess> = filtered.take(MAX_BREEDS).map(BreedGuess::from).collect();
    DetectionResult::from_breeds(breeds)
}

/// Top candidates without the detection gate; `None` when nothing matches
pub fn rank_breeds(predictions: &[RawPrediction], taxonomy: &PetTaxonomy) -> Option<Vec<BreedGuess>> {
    let breeds: Vec<BreedGuess> = candidates(predictions, taxonomy)
        .take(MAX_BREEDS)
        .map(BreedGuess::from)
        .collect();

    (!breeds.is_empty()).then_some(breeds)
}
