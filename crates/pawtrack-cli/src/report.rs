//! Human-readable rendering of detection output

use pawtrack_core::{BreedGuess, DetectionResult};
use std::fmt::Write;

/// Render a detection result for the terminal
pub fn render_detection(result: &DetectionResult) -> String {
    let mut out = String::new();

    match (&result.pet_type, &result.breeds) {
        (Some(pet_type), Some(breeds)) if result.detected => {
            let _ = writeln!(out, "Pet detected: {} ({}%)", pet_type, result.confidence);
            out.push_str(&render_breeds(breeds));
        }
        _ => out.push_str("No pet detected\n"),
    }

    out
}

/// Render a ranked breed list, one line per guess
pub fn render_breeds(breeds: &[BreedGuess]) -> String {
    let width = breeds.iter().map(|b| b.breed.len()).max().unwrap_or(0);

    let mut out = String::from("Breeds:\n");
    for (rank, guess) in breeds.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<width$}  {:>3}%",
            rank + 1,
            guess.breed,
            guess.confidence,
            width = width
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawtrack_core::RawPrediction;

    fn guess(label: &str, p: f32) -> BreedGuess {
        BreedGuess::from(&RawPrediction::new(label, p))
    }

    #[test]
    fn test_render_detected() {
        let result = DetectionResult::from_breeds(vec![
            guess("golden retriever", 0.42),
            guess("Labrador retriever", 0.12),
        ]);

        let text = render_detection(&result);
        assert!(text.starts_with("Pet detected: golden retriever (42%)\n"));
        assert!(text.contains("  1. golden retriever     42%"));
        assert!(text.contains("  2. Labrador retriever   12%"));
    }

    #[test]
    fn test_render_not_detected() {
        assert_eq!(render_detection(&DetectionResult::not_detected()), "No pet detected\n");
    }
}
