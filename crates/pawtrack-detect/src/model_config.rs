//! Model variants tried by the loader
//!
//! A variant names one downloadable configuration of the classifier. The
//! loader walks an ordered list of variants, trading capacity for a higher
//! chance of success on later attempts.

use serde::{Deserialize, Serialize};

/// Keras-style ImageNet class index, 1000 entries
pub const IMAGENET_LABELS_URL: &str =
    "https://storage.googleapis.com/download.tensorflow.org/data/imagenet_class_index.json";

/// MobileNetV4 architecture flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Architecture {
    ConvSmall,
    ConvMedium,
    ConvLarge,
    HybridMedium,
    HybridLarge,
}

/// One downloadable classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    /// Human-readable name used in logs and loader state
    pub name: String,

    /// Hub host serving the weights
    #[serde(default = "default_hub")]
    pub hub: String,

    /// Repository id on the hub
    pub repo_id: String,

    /// Revision (branch, tag or commit)
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Weights file inside the repository
    #[serde(default = "default_weights_file")]
    pub weights_file: String,

    /// Architecture the weights belong to
    pub architecture: Architecture,

    /// Square input edge in pixels
    pub input_size: u32,

    /// Number of output classes
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,

    /// Location of the class label list
    #[serde(default = "default_labels_url")]
    pub labels_url: String,
}

fn default_hub() -> String {
    "https://huggingface.co".to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_weights_file() -> String {
    "model.safetensors".to_string()
}

fn default_num_classes() -> usize {
    1000
}

fn default_labels_url() -> String {
    IMAGENET_LABELS_URL.to_string()
}

impl ModelVariant {
    /// Create a variant hosted on the default hub
    pub fn new(
        name: impl Into<String>,
        repo_id: impl Into<String>,
        architecture: Architecture,
        input_size: u32,
    ) -> Self {
        Self {
            name: name.into(),
            hub: default_hub(),
            repo_id: repo_id.into(),
            revision: default_revision(),
            weights_file: default_weights_file(),
            architecture,
            input_size,
            num_classes: default_num_classes(),
            labels_url: default_labels_url(),
        }
    }

    /// Serve the weights from another hub
    pub fn with_hub(mut self, hub: impl Into<String>) -> Self {
        self.hub = hub.into();
        self
    }

    /// Set the revision
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Download URL of the weights file
    pub fn weights_url(&self) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.hub.trim_end_matches('/'),
            self.repo_id,
            self.revision,
            self.weights_file
        )
    }

    /// Ordered default list: full-capacity model first, then reduced
    /// capacity, then the reduced model from a mirror.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "mobilenetv4-conv-medium",
                "timm/mobilenetv4_conv_medium.e500_r256_in1k",
                Architecture::ConvMedium,
                256,
            ),
            Self::new(
                "mobilenetv4-conv-small",
                "timm/mobilenetv4_conv_small.e2400_r224_in1k",
                Architecture::ConvSmall,
                224,
            ),
            Self::new(
                "mobilenetv4-conv-small-mirror",
                "timm/mobilenetv4_conv_small.e2400_r224_in1k",
                Architecture::ConvSmall,
                224,
            )
            .with_hub("https://hf-mirror.com"),
        ]
    }
}
