//! Error types for PawTrack

use std::time::Duration;

/// Result type alias using PawTrack's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for PawTrack operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A single load attempt ran past its deadline
    #[error("model load timed out after {0:?}")]
    ModelLoadTimeout(Duration),

    /// Model download or initialization failed
    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    /// The classifier failed during a forward pass
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// The model relay could not fetch the upstream resource
    #[error("relay upstream failed: {0}")]
    RelayUpstreamFailed(String),

    /// Image bytes could not be decoded
    #[error("image decode failed: {0}")]
    Decode(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new model load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::ModelLoadFailed(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::InferenceFailed(msg.into())
    }

    /// Create a new relay upstream error
    pub fn relay(msg: impl Into<String>) -> Self {
        Self::RelayUpstreamFailed(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error belongs to the model loading phase
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::ModelLoadTimeout(_) | Self::ModelLoadFailed(_) | Self::RelayUpstreamFailed(_)
        )
    }
}
