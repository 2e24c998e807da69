//! Language-to-model resolution.
//!
//! Maps a raw locale request (possibly absent, possibly a regional variant
//! like `zh-CN`) plus a model-size hint onto the concrete model a recognizer
//! should be loaded with. Resolution is total: unrecognized input falls back
//! to the default language rather than failing.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Language used when the request carries none, or an unrecognized one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Named fidelity tier for a language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Sm,
    Md,
    Lg,
    Trf,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Sm => "sm",
            ModelSize::Md => "md",
            ModelSize::Lg => "lg",
            ModelSize::Trf => "trf",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sm" => Some(ModelSize::Sm),
            "md" => Some(ModelSize::Md),
            "lg" => Some(ModelSize::Lg),
            "trf" => Some(ModelSize::Trf),
            _ => None,
        }
    }
}

impl Default for ModelSize {
    fn default() -> Self {
        ModelSize::Sm
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully resolved `(language, size, model name)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Canonical language code (alias-resolved, e.g. `zh` for `zh-CN`).
    pub language: String,
    /// Effective model size after compatibility downgrades.
    pub size: ModelSize,
    /// Fully qualified model name, e.g. `zh_core_web_trf`.
    pub model_name: String,
}

/// Map common non-standard or regional locale strings to canonical ISO codes.
fn canonical_alias(code: &str) -> Option<&'static str> {
    match code {
        "jp" => Some("ja"),
        "cn" | "zh-cn" | "zh-tw" | "zh-hk" => Some("zh"),
        "en-us" | "en-gb" | "en-ca" | "en-au" | "en-nz" => Some("en"),
        "fr-ca" | "fr-be" | "fr-fr" | "fr-ch" => Some("fr"),
        "de-de" | "de-ch" | "de-at" => Some("de"),
        "es-es" | "es-mx" | "es-ar" | "es-co" | "es-pr" => Some("es"),
        "nl-be" | "nl-nl" => Some("nl"),
        "pt-br" | "pt-pt" => Some("pt"),
        "sv-se" | "sv-fi" => Some("sv"),
        "it-it" | "it-ch" => Some("it"),
        "ro-ro" => Some("ro"),
        "pl-pl" => Some("pl"),
        "da-dk" => Some("da"),
        _ => None,
    }
}

/// Model-name template for a canonical language code.
///
/// The effective size is appended to form the full model name. English and
/// Chinese pipelines are trained on web text, the rest on news corpora.
fn model_template(code: &str) -> Option<&'static str> {
    match code {
        "ca" => Some("ca_core_news_"),
        "zh" => Some("zh_core_web_"),
        "hr" => Some("hr_core_news_"),
        "da" => Some("da_core_news_"),
        "nl" => Some("nl_core_news_"),
        "en" => Some("en_core_web_"),
        "fi" => Some("fi_core_news_"),
        "fr" => Some("fr_core_news_"),
        "de" => Some("de_core_news_"),
        "el" => Some("el_core_news_"),
        "it" => Some("it_core_news_"),
        "ja" => Some("ja_core_news_"),
        "ko" => Some("ko_core_news_"),
        "lt" => Some("lt_core_news_"),
        "mk" => Some("mk_core_news_"),
        "nb" => Some("nb_core_news_"),
        "pl" => Some("pl_core_news_"),
        "pt" => Some("pt_core_news_"),
        "ro" => Some("ro_core_news_"),
        "ru" => Some("ru_core_news_"),
        "sl" => Some("sl_core_news_"),
        "es" => Some("es_core_news_"),
        "sv" => Some("sv_core_news_"),
        "uk" => Some("uk_core_news_"),
        _ => None,
    }
}

/// Languages with a published transformer-size pipeline.
fn supports_transformer(code: &str) -> bool {
    matches!(code, "ca" | "zh" | "da" | "en" | "ja" | "sl" | "uk")
}

/// Resolve a requested language list and size hint to a concrete model.
///
/// Only the first language is consulted; extra entries are logged and
/// ignored. Unknown codes fall back to [`DEFAULT_LANGUAGE`], and a
/// transformer request for a language without a transformer pipeline is
/// downgraded to `lg`. Always returns a usable triple.
pub fn resolve_model(languages: Option<&[String]>, size: ModelSize) -> ResolvedModel {
    let raw = match languages {
        Some(codes) if !codes.is_empty() => {
            if codes.len() > 1 {
                warn!(
                    "Multiple language codes provided: {:?}. Using the first one.",
                    codes
                );
            }
            codes[0].as_str()
        }
        _ => DEFAULT_LANGUAGE,
    };

    let normalized = raw.trim().to_lowercase();
    let candidate = match canonical_alias(&normalized) {
        Some(canonical) => canonical.to_string(),
        None => normalized
            .split('-')
            .next()
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string(),
    };

    let language = if model_template(&candidate).is_some() {
        candidate
    } else {
        DEFAULT_LANGUAGE.to_string()
    };

    let effective_size = if size == ModelSize::Trf && !supports_transformer(&language) {
        warn!(
            "Transformer model size is not supported for language '{}'. Using 'lg'.",
            language
        );
        ModelSize::Lg
    } else {
        size
    };

    // Template lookup cannot fail here: `language` was just validated.
    let template = model_template(&language).unwrap_or("en_core_web_");
    let model_name = format!("{}{}", template, effective_size.as_str());

    ResolvedModel {
        language,
        size: effective_size,
        model_name,
    }
}
