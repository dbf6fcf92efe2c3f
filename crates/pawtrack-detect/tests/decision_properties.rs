//! Property tests for the pet/not-pet decision

use pawtrack_core::RawPrediction;
use pawtrack_detect::{decide, rank_breeds, PetTaxonomy, DETECTION_FLOOR, INCLUSION_FLOOR, MAX_BREEDS};
use proptest::prelude::*;

const LABELS: &[&str] = &[
    "golden retriever",
    "tabby",
    "Egyptian cat",
    "hamster",
    "African grey",
    "box turtle",
    "tennis ball",
    "studio couch",
    "park bench",
    "pizza",
];

/// Top-k style output: probability-descending, labels from a mixed pool
fn predictions() -> impl Strategy<Value = Vec<RawPrediction>> {
    prop::collection::vec((0..LABELS.len(), 0.0f32..=1.0), 0..12).prop_map(|mut items| {
        items.sort_by(|a, b| b.1.total_cmp(&a.1));
        items
            .into_iter()
            .map(|(i, p)| RawPrediction::new(LABELS[i], p))
            .collect()
    })
}

proptest! {
    #[test]
    fn breeds_respect_floor_and_cap(preds in predictions()) {
        let taxonomy = PetTaxonomy::default();
        let result = decide(&preds, &taxonomy);

        if let Some(breeds) = &result.breeds {
            prop_assert!(breeds.len() <= MAX_BREEDS);
            for guess in breeds {
                prop_assert!(guess.probability >= INCLUSION_FLOOR);
                prop_assert!(taxonomy.matches(&guess.breed));
            }
            prop_assert!(breeds.windows(2).all(|w| w[0].probability >= w[1].probability));
        }
    }

    #[test]
    fn detected_iff_top_candidate_clears_gate(preds in predictions()) {
        let taxonomy = PetTaxonomy::default();
        let result = decide(&preds, &taxonomy);

        let top = preds
            .iter()
            .find(|p| p.probability >= INCLUSION_FLOOR && taxonomy.matches(&p.label));
        let expected = top.is_some_and(|p| p.probability >= DETECTION_FLOOR);

        prop_assert_eq!(result.detected, expected);
        prop_assert_eq!(result.breeds.is_some(), expected);
        prop_assert_eq!(result.pet_type.is_some(), expected);
        prop_assert!(result.confidence <= 100);
        if !expected {
            prop_assert_eq!(result.confidence, 0);
        }
    }

    #[test]
    fn ranked_breeds_agree_with_decision(preds in predictions()) {
        let taxonomy = PetTaxonomy::default();
        let result = decide(&preds, &taxonomy);

        if let Some(breeds) = result.breeds {
            prop_assert_eq!(rank_breeds(&preds, &taxonomy), Some(breeds));
        }
    }
}
