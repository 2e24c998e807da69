//! Error types for the geoparser orchestration layer.
//!
//! Core operations convert per-request problems into structured failure
//! results rather than raising past their own boundary; the variants here
//! cover the places where a real `Result` still crosses a seam — the
//! recognizer sidecar, the registry, and startup. `NoModelsLoaded` is the one
//! error that is allowed to escape, at startup, by design.

use thiserror::Error;

/// Main error type for geoparser operations.
#[derive(Debug, Error)]
pub enum GeoError {
    // Recognizer sidecar errors
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Recognizer error: {message}")]
    Recognizer { message: String },

    #[error("Model load failed for '{model}': {message}")]
    LoadFailed { model: String, message: String },

    // Registry errors
    #[error("No models were successfully loaded")]
    NoModelsLoaded,

    #[error("No model available for language '{language}'")]
    ModelUnavailable { language: String },
}

/// Result type alias for geoparser operations.
pub type Result<T> = std::result::Result<T, GeoError>;

impl GeoError {
    /// Whether this error means the service cannot serve at all, as opposed
    /// to one request or one model being broken.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GeoError::NoModelsLoaded)
    }
}
