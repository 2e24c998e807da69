//! Service configuration.
//!
//! All settings are environment-derived with safe-fallback parsing: a
//! malformed value logs a warning and the default is used, so a bad
//! deployment variable can never keep the service from starting.

use crate::language::ModelSize;
use std::time::Duration;
use tracing::warn;

/// Runtime configuration for the geoparser service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the recognizer sidecar.
    pub recognizer_url: String,
    /// Transformer model handed to the sidecar at load time.
    pub transformer_model: String,
    /// Gazetteer the sidecar resolves toponyms against.
    pub gazetteer: String,
    /// Model sizes requests may ask for; the first entry is the default.
    pub available_model_sizes: Vec<ModelSize>,
    /// Languages a recognizer is loaded for at startup.
    pub supported_languages: Vec<String>,
    /// Maximum request text length in characters.
    pub max_text_length: usize,
    /// Timeout for model-load calls to the sidecar. Parse calls are not
    /// wrapped in a timeout.
    pub load_timeout: Duration,
    /// Whether the parse memoization cache is active.
    pub enable_cache: bool,
    /// Hard cap on cached entries; inserts stop once reached.
    pub cache_capacity: usize,
    /// Maximum number of items in one batch request.
    pub max_batch_size: usize,
    /// Log level name (`error`..`trace`).
    pub log_level: String,
    /// Host the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server binds to.
    pub port: u16,
}

impl ServiceConfig {
    pub const DEFAULT_RECOGNIZER_URL: &'static str = "http://127.0.0.1:7600";
    pub const DEFAULT_TRANSFORMER_MODEL: &'static str = "dguzh/geo-all-MiniLM-L6-v2";
    pub const DEFAULT_GAZETTEER: &'static str = "geonames";
    pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000;
    pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
    pub const DEFAULT_PORT: u16 = 5000;

    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            recognizer_url: env_string("RECOGNIZER_URL", defaults.recognizer_url),
            transformer_model: env_string("TRANSFORMER_MODEL", defaults.transformer_model),
            gazetteer: env_string("GAZETTEER", defaults.gazetteer),
            available_model_sizes: parse_model_sizes(
                "AVAILABLE_MODEL_SIZES",
                std::env::var("AVAILABLE_MODEL_SIZES").ok(),
                defaults.available_model_sizes.clone(),
            ),
            supported_languages: parse_list(
                std::env::var("SUPPORTED_LANGUAGES").ok(),
                defaults.supported_languages.clone(),
            ),
            max_text_length: parse_usize(
                "MAX_TEXT_LENGTH",
                std::env::var("MAX_TEXT_LENGTH").ok(),
                defaults.max_text_length,
            ),
            load_timeout: Duration::from_secs(parse_u64(
                "LOAD_TIMEOUT_SECS",
                std::env::var("LOAD_TIMEOUT_SECS").ok(),
                defaults.load_timeout.as_secs(),
            )),
            enable_cache: parse_bool(
                std::env::var("ENABLE_CACHE").ok(),
                defaults.enable_cache,
            ),
            cache_capacity: parse_usize(
                "CACHE_CAPACITY",
                std::env::var("CACHE_CAPACITY").ok(),
                defaults.cache_capacity,
            ),
            max_batch_size: parse_usize(
                "MAX_BATCH_SIZE",
                std::env::var("MAX_BATCH_SIZE").ok(),
                defaults.max_batch_size,
            ),
            log_level: env_string("LOG_LEVEL", defaults.log_level).to_lowercase(),
            host: env_string("HOST", defaults.host),
            port: parse_u16("PORT", std::env::var("PORT").ok(), defaults.port),
        }
    }

    /// Default model size: the first available one.
    pub fn default_model_size(&self) -> ModelSize {
        self.available_model_sizes
            .first()
            .copied()
            .unwrap_or_default()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recognizer_url: Self::DEFAULT_RECOGNIZER_URL.to_string(),
            transformer_model: Self::DEFAULT_TRANSFORMER_MODEL.to_string(),
            gazetteer: Self::DEFAULT_GAZETTEER.to_string(),
            available_model_sizes: vec![
                ModelSize::Sm,
                ModelSize::Md,
                ModelSize::Lg,
                ModelSize::Trf,
            ],
            supported_languages: ["en", "de", "fr", "zh", "es"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_text_length: Self::DEFAULT_MAX_TEXT_LENGTH,
            load_timeout: Self::DEFAULT_LOAD_TIMEOUT,
            enable_cache: true,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default,
    }
}

fn parse_usize(name: &str, value: Option<String>, default: usize) -> usize {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default {}", raw, name, default);
            default
        }),
        None => default,
    }
}

fn parse_u64(name: &str, value: Option<String>, default: u64) -> u64 {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default {}", raw, name, default);
            default
        }),
        None => default,
    }
}

fn parse_u16(name: &str, value: Option<String>, default: u16) -> u16 {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default {}", raw, name, default);
            default
        }),
        None => default,
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(raw) => matches!(
            raw.trim().to_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        None => default,
    }
}

/// Split a comma-separated list, dropping empty segments.
fn parse_list(value: Option<String>, default: Vec<String>) -> Vec<String> {
    match value {
        Some(raw) => {
            let items: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if items.is_empty() {
                default
            } else {
                items
            }
        }
        None => default,
    }
}

/// Parse a comma-separated size list; unknown names are skipped with a warning.
fn parse_model_sizes(name: &str, value: Option<String>, default: Vec<ModelSize>) -> Vec<ModelSize> {
    match value {
        Some(raw) => {
            let sizes: Vec<ModelSize> = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| {
                    let parsed = ModelSize::from_str(s);
                    if parsed.is_none() {
                        warn!("Unknown model size '{}' in {}, skipping", s.trim(), name);
                    }
                    parsed
                })
                .collect();
            if sizes.is_empty() {
                warn!("No valid model sizes in {}, using defaults", name);
                default
            } else {
                sizes
            }
        }
        None => default,
    }
}
