//! Detection orchestrator tests

mod common;

use common::*;
use image::DynamicImage;
use pawtrack_detect::PetDetector;
use std::sync::Arc;

#[tokio::test]
async fn test_golden_retriever_with_tennis_ball() {
    init_tracing();
    let model = Arc::new(FixedClassifier::new(&[
        ("golden retriever", 0.42),
        ("tennis ball", 0.31),
    ]));
    let detector = PetDetector::new(ready_loader(model).await);

    let result = detector.detect_and_classify(&png_bytes()).await;

    assert!(result.detected);
    assert_eq!(result.pet_type.as_deref(), Some("golden retriever"));
    assert_eq!(result.confidence, 42);
    let breeds = result.breeds.unwrap();
    assert_eq!(breeds.len(), 1);
    assert_eq!(breeds[0].breed, "golden retriever");
}

#[tokio::test]
async fn test_furniture_is_not_a_pet() {
    let model = Arc::new(FixedClassifier::new(&[("sofa", 0.9)]));
    let detector = PetDetector::new(ready_loader(model).await);

    let result = detector.detect_and_classify(&png_bytes()).await;

    assert!(!result.detected);
    assert!(result.breeds.is_none());
    assert!(result.pet_type.is_none());
    assert_eq!(result.confidence, 0);
}

#[tokio::test]
async fn test_not_ready_returns_empty_result() {
    let model = Arc::new(FixedClassifier::new(&[("tabby", 0.9)]));
    let backend = Arc::new(MockBackend::new(vec![Outcome::Succeed(model.clone())]));
    let detector = PetDetector::new(Arc::new(loader(backend, 2)));

    assert!(!detector.status().model_loaded);
    let result = detector.detect_and_classify(&png_bytes()).await;

    assert!(!result.detected);
    assert_eq!(model.call_count(), 0);
    assert!(detector.classify_breed(&png_bytes()).await.is_none());
}

#[tokio::test]
async fn test_inference_failure_returns_empty_result() {
    let detector = PetDetector::new(ready_loader(Arc::new(FailingClassifier)).await);

    let result = detector.detect_and_classify(&png_bytes()).await;

    assert!(!result.detected);
    assert!(result.breeds.is_none());
}

#[tokio::test]
async fn test_undecodable_file_returns_empty_result() {
    let model = Arc::new(FixedClassifier::new(&[("tabby", 0.9)]));
    let detector = PetDetector::new(ready_loader(model.clone()).await);

    let result = detector.detect_and_classify(b"GIF89a-but-not-really").await;

    assert!(!result.detected);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_empty_predictions() {
    let model = Arc::new(FixedClassifier::new(&[]));
    let detector = PetDetector::new(ready_loader(model).await);

    let result = detector.detect_and_classify(&png_bytes()).await;

    assert!(!result.detected);
    assert!(result.pet_type.is_none());
    assert_eq!(result.confidence, 0);
    assert!(result.breeds.is_none());
}

#[tokio::test]
async fn test_classify_breed_skips_detection_gate() {
    let model = Arc::new(FixedClassifier::new(&[
        ("park bench", 0.5),
        ("Persian cat", 0.13),
        ("tabby", 0.11),
        ("tiger cat", 0.08),
    ]));
    let detector = PetDetector::new(ready_loader(model).await);

    assert!(!detector.detect_and_classify(&png_bytes()).await.detected);

    let breeds = detector.classify_breed(&png_bytes()).await.unwrap();
    let names: Vec<_> = breeds.iter().map(|b| b.breed.as_str()).collect();
    assert_eq!(names, vec!["Persian cat", "tabby"]);
}

#[tokio::test]
async fn test_classify_breed_none_for_non_pet() {
    let model = Arc::new(FixedClassifier::new(&[("sofa", 0.9)]));
    let detector = PetDetector::new(ready_loader(model).await);

    assert!(detector.classify_breed(&png_bytes()).await.is_none());
}

#[tokio::test]
async fn test_detect_decoded_image() {
    let model = Arc::new(FixedClassifier::new(&[
        ("Siamese cat", 0.55),
        ("Egyptian cat", 0.2),
        ("lynx", 0.1),
    ]));
    let detector = PetDetector::new(ready_loader(model).await);

    let result = detector.detect_image(&DynamicImage::new_rgb8(10, 10)).await;

    assert!(result.detected);
    assert_eq!(result.pet_type.as_deref(), Some("Siamese cat"));
    assert_eq!(result.breeds.unwrap().len(), 2);
}

#[tokio::test]
async fn test_result_json_shape() {
    let model = Arc::new(FixedClassifier::new(&[("beagle", 0.77)]));
    let detector = PetDetector::new(ready_loader(model).await);

    let result = detector.detect_and_classify(&png_bytes()).await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["detected"], true);
    assert_eq!(json["petType"], "beagle");
    assert_eq!(json["confidence"], 77);
    assert_eq!(json["breeds"][0]["breed"], "beagle");
    assert_eq!(json["breeds"][0]["confidence"], 77);
    assert!(json["timestamp"].as_str().unwrap().contains('T'));
}
