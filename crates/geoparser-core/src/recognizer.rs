//! Recognizer boundary: the opaque external NER/geoparsing capability.
//!
//! The service never performs entity recognition itself; it talks to a
//! recognizer sidecar that owns the NLP models and the gazetteer. This module
//! defines the seam ([`Recognizer`] / [`RecognizerLoader`]) and the HTTP
//! implementation against the sidecar's REST API.
//!
//! ## Sidecar API surface
//!
//! - `POST /api/load`  — Load a language model (blocking until ready)
//! - `POST /api/parse` — Extract and resolve place names from text

use crate::error::{GeoError, Result};
use crate::language::ResolvedModel;
use crate::location::RawLocation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Helper to create a network error.
fn net_err(msg: String) -> GeoError {
    GeoError::Network { message: msg }
}

/// A loaded recognizer for one language/model pair.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Extract location mentions from `text`.
    ///
    /// No timeout wraps this call; a stalled backend blocks the requesting
    /// task until it answers.
    async fn parse(&self, text: &str) -> Result<Vec<RawLocation>>;

    /// Fully qualified model name this recognizer was loaded with.
    fn model_name(&self) -> &str;
}

/// Creates recognizer instances at service startup.
#[async_trait]
pub trait RecognizerLoader: Send + Sync {
    async fn load(&self, model: &ResolvedModel) -> Result<Arc<dyn Recognizer>>;
}

// =============================================================================
// Remote sidecar implementation
// =============================================================================

#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    model: &'a str,
    transformer_model: &'a str,
    gazetteer: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SidecarParseRequest<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct SidecarParseResponse {
    #[serde(default)]
    locations: Vec<serde_json::Value>,
}

/// Recognizer backed by the geoparsing sidecar's REST API.
pub struct RemoteRecognizer {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
}

#[async_trait]
impl Recognizer for RemoteRecognizer {
    async fn parse(&self, text: &str) -> Result<Vec<RawLocation>> {
        let request = SidecarParseRequest {
            text,
            model: &self.model_name,
        };

        debug!("Parse request to sidecar for model '{}'", self.model_name);
        let response = self
            .client
            .post(format!("{}/api/parse", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| net_err(format!("Parse request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeoError::Recognizer {
                message: format!("Sidecar returned {}: {}", status, body),
            });
        }

        let body: SidecarParseResponse = response
            .json()
            .await
            .map_err(|e| net_err(format!("Invalid parse response: {}", e)))?;

        Ok(body
            .locations
            .into_iter()
            .filter_map(RawLocation::from_value)
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Loads [`RemoteRecognizer`]s by asking the sidecar to bring a model up.
pub struct RemoteRecognizerLoader {
    client: reqwest::Client,
    base_url: String,
    transformer_model: String,
    gazetteer: String,
    load_timeout: Duration,
}

impl RemoteRecognizerLoader {
    pub fn new(
        base_url: impl Into<String>,
        transformer_model: impl Into<String>,
        gazetteer: impl Into<String>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transformer_model: transformer_model.into(),
            gazetteer: gazetteer.into(),
            load_timeout,
        }
    }
}

#[async_trait]
impl RecognizerLoader for RemoteRecognizerLoader {
    async fn load(&self, model: &ResolvedModel) -> Result<Arc<dyn Recognizer>> {
        let request = LoadRequest {
            model: &model.model_name,
            transformer_model: &self.transformer_model,
            gazetteer: &self.gazetteer,
        };

        let response = self
            .client
            .post(format!("{}/api/load", self.base_url))
            .timeout(self.load_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeoError::LoadFailed {
                model: model.model_name.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(GeoError::LoadFailed {
                model: model.model_name.clone(),
                message: format!("Sidecar returned {}", response.status()),
            });
        }

        let body: LoadResponse = response
            .json()
            .await
            .map_err(|e| GeoError::LoadFailed {
                model: model.model_name.clone(),
                message: format!("Invalid load response: {}", e),
            })?;

        if !body.success {
            return Err(GeoError::LoadFailed {
                model: model.model_name.clone(),
                message: body.error.unwrap_or_else(|| "Unknown load error".to_string()),
            });
        }

        info!("Sidecar loaded model '{}'", model.model_name);
        Ok(Arc::new(RemoteRecognizer {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            model_name: model.model_name.clone(),
        }))
    }
}
