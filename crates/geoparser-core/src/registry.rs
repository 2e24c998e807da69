//! Model registry: one loaded recognizer per supported language.
//!
//! Built once at startup, immutable afterwards. Individual language failures
//! degrade the registry; only a fully empty registry is fatal.

use crate::config::ServiceConfig;
use crate::error::{GeoError, Result};
use crate::language::resolve_model;
use crate::recognizer::{Recognizer, RecognizerLoader};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Holds the recognizer instances that loaded successfully at startup.
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Recognizer>>,
}

impl ModelRegistry {
    /// Load one recognizer per configured language, sequentially.
    ///
    /// A language whose model fails to load is logged and skipped. Returns
    /// [`GeoError::NoModelsLoaded`] when nothing loaded; the service must not
    /// serve traffic in that state.
    pub async fn load_all(
        config: &ServiceConfig,
        loader: &dyn RecognizerLoader,
    ) -> Result<Self> {
        info!("Start to pre-load recognizer models...");

        let mut models: HashMap<String, Arc<dyn Recognizer>> = HashMap::new();
        let mut failed: Vec<String> = Vec::new();

        for lang in &config.supported_languages {
            let resolved = resolve_model(
                Some(std::slice::from_ref(lang)),
                config.default_model_size(),
            );
            info!(
                "Loading model for language '{}' with model name '{}'",
                resolved.language, resolved.model_name
            );

            match loader.load(&resolved).await {
                Ok(recognizer) => {
                    models.insert(resolved.language.clone(), recognizer);
                    info!("Model for language '{}' loaded successfully", resolved.language);
                }
                Err(e) => {
                    error!("Failed to load model for language '{}': {}", lang, e);
                    failed.push(lang.clone());
                }
            }
        }

        info!(
            "Finished pre-loading models, successful: {}/{}, languages: {:?}",
            models.len(),
            config.supported_languages.len(),
            models.keys().collect::<Vec<_>>()
        );

        if models.is_empty() {
            return Err(GeoError::NoModelsLoaded);
        }

        if !failed.is_empty() {
            warn!(
                "Failed to load models for the following languages: {}",
                failed.join(", ")
            );
        }

        Ok(Self { models })
    }

    /// Look up the recognizer for a canonical language code.
    ///
    /// Fallback to another language is the caller's decision, not the
    /// registry's.
    pub fn get(&self, language: &str) -> Option<Arc<dyn Recognizer>> {
        self.models.get(language).cloned()
    }

    /// Canonical codes with a loaded recognizer, sorted for stable output.
    pub fn languages(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.models.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoError;
    use crate::language::ResolvedModel;
    use crate::location::RawLocation;
    use async_trait::async_trait;

    struct NullRecognizer {
        model_name: String,
    }

    #[async_trait]
    impl Recognizer for NullRecognizer {
        async fn parse(&self, _text: &str) -> Result<Vec<RawLocation>> {
            Ok(vec![])
        }

        fn model_name(&self) -> &str {
            &self.model_name
        }
    }

    /// Loader that fails for a fixed set of languages.
    struct SelectiveLoader {
        fail_for: Vec<&'static str>,
    }

    #[async_trait]
    impl RecognizerLoader for SelectiveLoader {
        async fn load(&self, model: &ResolvedModel) -> Result<Arc<dyn Recognizer>> {
            if self.fail_for.contains(&model.language.as_str()) {
                return Err(GeoError::LoadFailed {
                    model: model.model_name.clone(),
                    message: "unavailable".into(),
                });
            }
            Ok(Arc::new(NullRecognizer {
                model_name: model.model_name.clone(),
            }))
        }
    }

    fn config_for(languages: &[&str]) -> ServiceConfig {
        ServiceConfig {
            supported_languages: languages.iter().map(|s| s.to_string()).collect(),
            ..ServiceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_partial_degradation() {
        let config = config_for(&["en", "de", "fr"]);
        let loader = SelectiveLoader { fail_for: vec!["de"] };

        let registry = ModelRegistry::load_all(&config, &loader).await.unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("en").is_some());
        assert!(registry.get("de").is_none());
        assert_eq!(registry.languages(), vec!["en", "fr"]);
    }

    #[tokio::test]
    async fn test_zero_models_is_fatal() {
        let config = config_for(&["en", "de"]);
        let loader = SelectiveLoader {
            fail_for: vec!["en", "de"],
        };

        let err = ModelRegistry::load_all(&config, &loader).await.err().unwrap();
        assert!(matches!(err, GeoError::NoModelsLoaded));
    }

    #[tokio::test]
    async fn test_models_keyed_by_canonical_code() {
        // Configured as a regional variant; registered under the canonical code.
        let config = config_for(&["en-GB"]);
        let loader = SelectiveLoader { fail_for: vec![] };

        let registry = ModelRegistry::load_all(&config, &loader).await.unwrap();
        assert!(registry.get("en").is_some());
        assert!(registry.get("en-gb").is_none());
    }
}
