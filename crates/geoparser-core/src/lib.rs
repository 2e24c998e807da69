//! Geoparser Core - Headless orchestration library for text-to-place geoparsing.
//!
//! This crate provides the decision logic of the geoparser service: language
//! resolution, model registry, parse memoization and result normalization.
//! Entity recognition itself is delegated to an external recognizer backend;
//! see the `geoparser-server` crate for the HTTP layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use geoparser_core::{GeoParserService, RemoteRecognizerLoader, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> geoparser_core::Result<()> {
//!     let config = ServiceConfig::from_env();
//!     let loader = RemoteRecognizerLoader::new(
//!         config.recognizer_url.clone(),
//!         config.transformer_model.clone(),
//!         config.gazetteer.clone(),
//!         config.load_timeout,
//!     );
//!     let service = GeoParserService::new(config, &loader).await?;
//!
//!     let result = service.parse_text("Flying to Berlin", None, None).await;
//!     println!("Found {} locations", result.locations_found);
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod language;
pub mod location;
pub mod recognizer;
pub mod registry;
pub mod service;

// Re-export commonly used types
pub use cache::{ClearOutcome, ParseCache};
pub use config::ServiceConfig;
pub use error::{GeoError, Result};
pub use language::{resolve_model, ModelSize, ResolvedModel, DEFAULT_LANGUAGE};
pub use location::{normalize, LocationRecord, RawLocation};
pub use recognizer::{Recognizer, RecognizerLoader, RemoteRecognizer, RemoteRecognizerLoader};
pub use registry::ModelRegistry;
pub use service::{
    BatchItem, GeoParserService, HealthReport, LanguageSelector, ModelInfo, ParseResult,
};
