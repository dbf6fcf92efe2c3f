//! MobileNetV4 ImageNet classifier built on Candle
//!
//! Weights are downloaded as SafeTensors through the [`ModelFetcher`] the
//! loader hands us, so relay rewriting applies to every asset of an attempt.

use crate::classifier::ImageClassifier;
use crate::fetcher::ModelFetcher;
use crate::model_config::{Architecture, ModelVariant};
use crate::model_loader::ModelBackend;
use async_trait::async_trait;
use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::{Func, VarBuilder};
use candle_transformers::models::mobilenetv4;
use image::imageops::FilterType;
use image::DynamicImage;
use pawtrack_core::{Error, RawPrediction, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Predictions kept per image
pub const DEFAULT_TOP_K: usize = 10;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

impl Architecture {
    fn config(self) -> mobilenetv4::Config {
        match self {
            Self::ConvSmall => mobilenetv4::Config::small(),
            Self::ConvMedium => mobilenetv4::Config::medium(),
            Self::ConvLarge => mobilenetv4::Config::large(),
            Self::HybridMedium => mobilenetv4::Config::hybrid_medium(),
            Self::HybridLarge => mobilenetv4::Config::hybrid_large(),
        }
    }
}

/// Label files come either as a plain list or as the Keras class index
/// (`{"0": ["n01440764", "tench"], ...}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<String>),
    ClassIndex(HashMap<String, (String, String)>),
}

/// Parse a label file into index-ordered, human-readable labels
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<String>> {
    let labels = match serde_json::from_slice::<LabelFile>(bytes)? {
        LabelFile::List(labels) => labels,
        LabelFile::ClassIndex(index) => {
            let mut entries = index
                .into_iter()
                .map(|(key, (_, label))| {
                    key.parse::<usize>()
                        .map(|i| (i, label))
                        .map_err(|_| Error::load(format!("Invalid class index '{}'", key)))
                })
                .collect::<Result<Vec<_>>>()?;
            entries.sort_by_key(|(i, _)| *i);

            if entries.iter().enumerate().any(|(pos, (i, _))| pos != *i) {
                return Err(Error::load("Class index is not contiguous"));
            }
            entries.into_iter().map(|(_, label)| label).collect()
        }
    };

    Ok(labels.into_iter().map(|l| l.replace('_', " ")).collect())
}

/// Resize, normalize with ImageNet statistics, and lay out as CHW
fn preprocess(image: &DynamicImage, size: u32, device: &Device) -> candle_core::Result<Tensor> {
    let rgb = image
        .resize_to_fill(size, size, FilterType::Triangle)
        .to_rgb8();
    let edge = size as usize;

    let pixels = Tensor::from_vec(rgb.into_raw(), (edge, edge, 3), device)?.permute((2, 0, 1))?;
    let mean = Tensor::new(&IMAGENET_MEAN, device)?.reshape((3, 1, 1))?;
    let std = Tensor::new(&IMAGENET_STD, device)?.reshape((3, 1, 1))?;

    (pixels.to_dtype(DType::F32)? / 255.)?
        .broadcast_sub(&mean)?
        .broadcast_div(&std)
}

/// Highest `k` probabilities, descending
fn top_k(probabilities: &[f32], labels: &[String], k: usize) -> Vec<RawPrediction> {
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(k)
        .filter_map(|(i, p)| labels.get(i).map(|label| RawPrediction::new(label.clone(), p)))
        .collect()
}

/// A loaded MobileNetV4 classifier
pub struct MobileNetClassifier {
    name: String,
    model: Arc<Func<'static>>,
    labels: Vec<String>,
    input_size: u32,
    top_k: usize,
    device: Device,
}

impl MobileNetClassifier {
    /// Build from SafeTensors bytes and a label list
    pub fn from_safetensors(
        variant: &ModelVariant,
        weights: Vec<u8>,
        labels: Vec<String>,
        top_k: usize,
    ) -> Result<Self> {
        if labels.len() != variant.num_classes {
            return Err(Error::load(format!(
                "Label list has {} entries, model expects {}",
                labels.len(),
                variant.num_classes
            )));
        }

        let device = Device::Cpu;
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device)
            .map_err(|e| Error::load(format!("Failed to load SafeTensors: {}", e)))?;
        let model = mobilenetv4::mobilenetv4(&variant.architecture.config(), variant.num_classes, vb)
            .map_err(|e| Error::load(format!("Failed to build {}: {}", variant.name, e)))?;

        Ok(Self {
            name: variant.name.clone(),
            model: Arc::new(model),
            labels,
            input_size: variant.input_size,
            top_k,
            device,
        })
    }
}

/// Class probabilities for one image
fn forward(
    model: &Func<'static>,
    image: &DynamicImage,
    size: u32,
    device: &Device,
) -> candle_core::Result<Vec<f32>> {
    let input = preprocess(image, size, device)?.unsqueeze(0)?;
    let logits = model.forward(&input)?;
    candle_nn::ops::softmax(&logits, D::Minus1)?
        .squeeze(0)?
        .to_vec1::<f32>()
}

#[async_trait]
impl ImageClassifier for MobileNetClassifier {
    async fn classify(&self, image: &DynamicImage) -> Result<Vec<RawPrediction>> {
        let model = Arc::clone(&self.model);
        let device = self.device.clone();
        let size = self.input_size;
        let image = image.clone();

        // The forward pass is CPU-bound and runs on the blocking pool.
        let probabilities = tokio::task::spawn_blocking(move || forward(&model, &image, size, &device))
            .await
            .map_err(|e| Error::internal(format!("Inference task failed: {}", e)))?
            .map_err(|e| Error::inference(format!("{} forward pass failed: {}", self.name, e)))?;

        Ok(top_k(&probabilities, &self.labels, self.top_k))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Production backend: downloads weights and labels, builds the network
#[derive(Debug, Clone)]
pub struct MobileNetBackend {
    top_k: usize,
}

impl MobileNetBackend {
    pub fn new(top_k: usize) -> Self {
        Self { top_k: top_k.max(1) }
    }
}

impl Default for MobileNetBackend {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

#[async_trait]
impl ModelBackend for MobileNetBackend {
    async fn load(
        &self,
        variant: &ModelVariant,
        fetcher: &ModelFetcher,
    ) -> Result<Arc<dyn ImageClassifier>> {
        let weights_url = variant.weights_url();
        let (weights, labels) = tokio::try_join!(
            fetcher.fetch_bytes(&weights_url),
            fetcher.fetch_bytes(&variant.labels_url),
        )?;
        debug!(variant = %variant.name, weights_bytes = weights.len(), "Model assets downloaded");

        let labels = parse_labels(&labels)?;

        // Graph construction is CPU-bound and runs on the blocking pool.
        let variant = variant.clone();
        let top_k = self.top_k;
        let classifier = tokio::task::spawn_blocking(move || {
            MobileNetClassifier::from_safetensors(&variant, weights.to_vec(), labels, top_k)
        })
        .await
        .map_err(|e| Error::internal(format!("Model build task failed: {}", e)))??;

        Ok(Arc::new(classifier))
    }
}
