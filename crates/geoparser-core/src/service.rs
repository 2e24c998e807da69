//! Parse orchestration.
//!
//! [`GeoParserService`] ties resolution, registry lookup, caching and
//! normalization together for single and batch requests. Every per-request
//! failure is converted into a structured [`ParseResult`]; nothing below the
//! HTTP layer raises past this boundary once the service is constructed.

use crate::cache::{ClearOutcome, ParseCache};
use crate::config::ServiceConfig;
use crate::error::{GeoError, Result};
use crate::language::{resolve_model, ModelSize, DEFAULT_LANGUAGE};
use crate::location::{normalize, LocationRecord};
use crate::recognizer::RecognizerLoader;
use crate::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Language request: a single code or a list of codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageSelector {
    One(String),
    Many(Vec<String>),
}

impl LanguageSelector {
    pub fn codes(&self) -> &[String] {
        match self {
            LanguageSelector::One(code) => std::slice::from_ref(code),
            LanguageSelector::Many(codes) => codes,
        }
    }
}

/// One entry of a batch request.
///
/// `text` stays optional so a malformed item produces a per-item failure
/// instead of rejecting the whole batch.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub languages: Option<LanguageSelector>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Outcome of one parse request, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_detected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    pub locations_found: usize,
    pub locations: Vec<LocationRecord>,
    /// Wall-clock seconds spent on this request, stamped fresh per call.
    pub processing_time: f64,
    /// Seconds spent inside the recognizer, carried through the cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_time: Option<f64>,
    pub from_cache: bool,
    /// Caller-supplied correlation id, echoed back on batch items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// Registry, cache and configuration summary for `/api/info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub loaded_models: Vec<String>,
    pub default_model_size: ModelSize,
    pub transformer_model: String,
    pub gazetteer: String,
    pub supported_languages: Vec<String>,
    pub cache_enabled: bool,
    pub cache_size: usize,
    pub max_text_length: usize,
    pub max_batch_size: usize,
}

/// Outcome of the canary-parse health probe.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub models_loaded: usize,
    pub test_parse_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// The parse orchestration context.
///
/// Constructed once at startup, owned by the HTTP state, torn down at
/// shutdown. The registry is immutable after construction; the cache is the
/// only shared mutable structure.
pub struct GeoParserService {
    config: ServiceConfig,
    registry: ModelRegistry,
    cache: ParseCache<ParseResult>,
}

impl GeoParserService {
    /// Text used by the health probe.
    const CANARY_TEXT: &'static str = "I want to travel to Beijing!";

    /// Load all configured models and build the service context.
    ///
    /// Fails only when zero models load; the caller should treat that as
    /// fatal and refuse to serve traffic.
    pub async fn new(config: ServiceConfig, loader: &dyn RecognizerLoader) -> Result<Self> {
        let registry = ModelRegistry::load_all(&config, loader).await?;
        let cache = ParseCache::new(config.enable_cache, config.cache_capacity);
        Ok(Self {
            config,
            registry,
            cache,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Parse geographic entities out of one text.
    pub async fn parse_text(
        &self,
        text: &str,
        languages: Option<&LanguageSelector>,
        model_size: Option<&str>,
    ) -> ParseResult {
        let started = Instant::now();

        // A size outside the configured set falls back to the default.
        let size = match model_size {
            None => self.config.default_model_size(),
            Some(raw) => match ModelSize::from_str(raw) {
                Some(parsed) if self.config.available_model_sizes.contains(&parsed) => parsed,
                _ => {
                    let fallback = self.config.default_model_size();
                    warn!(
                        "Model size '{}' not supported. Using default '{}' model size.",
                        raw, fallback
                    );
                    fallback
                }
            },
        };

        if text.trim().is_empty() {
            return Self::failure("Input text is empty or invalid.".to_string(), None, started);
        }
        let text_length = text.chars().count();
        if text_length > self.config.max_text_length {
            return Self::failure(
                format!(
                    "Input text exceeds maximum length of {} characters.",
                    self.config.max_text_length
                ),
                None,
                started,
            );
        }

        let resolved = resolve_model(languages.map(LanguageSelector::codes), size);
        let effective_size = resolved.size;

        let lookup_key = ParseCache::<ParseResult>::key(text, &resolved.language, effective_size);
        if let Some(mut hit) = self.cache.get(&lookup_key) {
            debug!("Cache hit for key: {}...", &lookup_key[..8]);
            hit.from_cache = true;
            hit.processing_time = started.elapsed().as_secs_f64();
            return hit;
        }

        // Registry lookup, falling back to the first configured language.
        let (language, model_name, recognizer) = match self.registry.get(&resolved.language) {
            Some(recognizer) => (resolved.language, resolved.model_name, recognizer),
            None => {
                let fallback_lang = self
                    .config
                    .supported_languages
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
                warn!(
                    "Language '{}' not supported or model not loaded. Using default '{}' model.",
                    resolved.language, fallback_lang
                );
                let refallback = resolve_model(Some(std::slice::from_ref(&fallback_lang)), size);
                match self.registry.get(&refallback.language) {
                    Some(recognizer) => {
                        (refallback.language, refallback.model_name, recognizer)
                    }
                    None => {
                        let unavailable = GeoError::ModelUnavailable {
                            language: refallback.language,
                        };
                        return Self::failure(unavailable.to_string(), None, started);
                    }
                }
            }
        };

        let parse_started = Instant::now();
        match recognizer.parse(text).await {
            Ok(raw_locations) => {
                let parse_time = parse_started.elapsed().as_secs_f64();
                let locations: Vec<LocationRecord> =
                    raw_locations.iter().filter_map(normalize).collect();

                let mut result = ParseResult {
                    success: true,
                    error: None,
                    language_detected: Some(language.clone()),
                    model_used: Some(model_name),
                    text_length: Some(text_length),
                    locations_found: locations.len(),
                    locations,
                    // Stored entries carry no per-request timing.
                    processing_time: 0.0,
                    parse_time: Some(parse_time),
                    from_cache: false,
                    id: None,
                };

                // Keyed on the effective language, which may differ from the
                // requested one after a registry fallback.
                let store_key = ParseCache::<ParseResult>::key(text, &language, effective_size);
                self.cache.put(store_key, result.clone());

                result.processing_time = started.elapsed().as_secs_f64();
                result
            }
            Err(e) => {
                error!("Error parsing text: {}", e);
                Self::failure(e.to_string(), Some(language), started)
            }
        }
    }

    /// Parse a batch of texts independently.
    ///
    /// An oversized batch yields a single failure record for the whole
    /// request; within the limit, one item's failure never aborts the rest.
    pub async fn parse_batch(
        &self,
        items: &[BatchItem],
        model_size: Option<&str>,
    ) -> Vec<ParseResult> {
        if items.len() > self.config.max_batch_size {
            return vec![Self::failure(
                format!(
                    "Batch size exceeds maximum limit of {}.",
                    self.config.max_batch_size
                ),
                None,
                Instant::now(),
            )];
        }

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let Some(text) = item.text.as_deref() else {
                results.push(Self::failure(
                    "Invalid input format - missing text field".to_string(),
                    None,
                    Instant::now(),
                ));
                continue;
            };

            let mut result = self
                .parse_text(text, item.languages.as_ref(), model_size)
                .await;
            if item.id.is_some() {
                result.id = item.id.clone();
            }
            results.push(result);
        }
        results
    }

    /// Registry/cache/configuration summary.
    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            loaded_models: self.registry.languages(),
            default_model_size: self.config.default_model_size(),
            transformer_model: self.config.transformer_model.clone(),
            gazetteer: self.config.gazetteer.clone(),
            supported_languages: self.config.supported_languages.clone(),
            cache_enabled: self.cache.is_enabled(),
            cache_size: self.cache.len(),
            max_text_length: self.config.max_text_length,
            max_batch_size: self.config.max_batch_size,
        }
    }

    /// Run a canary parse through the full pipeline.
    pub async fn health_check(&self) -> HealthReport {
        let canary = self
            .parse_text(
                Self::CANARY_TEXT,
                Some(&LanguageSelector::One("en".to_string())),
                None,
            )
            .await;

        HealthReport {
            status: if canary.success { "healthy" } else { "unhealthy" },
            models_loaded: self.registry.len(),
            test_parse_success: canary.success,
            error: if canary.success { None } else { canary.error },
        }
    }

    pub fn clear_cache(&self) -> ClearOutcome {
        self.cache.clear()
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    fn failure(error: String, language: Option<String>, started: Instant) -> ParseResult {
        ParseResult {
            success: false,
            error: Some(error),
            language_detected: language,
            model_used: None,
            text_length: None,
            locations_found: 0,
            locations: Vec::new(),
            processing_time: started.elapsed().as_secs_f64(),
            parse_time: None,
            from_cache: false,
            id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_selector_codes() {
        let one = LanguageSelector::One("en".into());
        assert_eq!(one.codes(), ["en"]);

        let many = LanguageSelector::Many(vec!["de".into(), "fr".into()]);
        assert_eq!(many.codes().len(), 2);
    }

    #[test]
    fn test_selector_deserializes_string_or_list() {
        let one: LanguageSelector = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(one.codes(), ["en"]);

        let many: LanguageSelector = serde_json::from_str("[\"zh-CN\", \"en\"]").unwrap();
        assert_eq!(many.codes().len(), 2);
    }

    #[test]
    fn test_batch_item_tolerates_missing_fields() {
        let item: BatchItem = serde_json::from_str("{}").unwrap();
        assert!(item.text.is_none());
        assert!(item.languages.is_none());
        assert!(item.id.is_none());
    }

    #[test]
    fn test_failure_shape() {
        let result =
            GeoParserService::failure("boom".into(), Some("en".into()), Instant::now());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(result.language_detected.as_deref(), Some("en"));
        assert_eq!(result.locations_found, 0);
        assert!(result.locations.is_empty());
        assert!(!result.from_cache);
    }
}
