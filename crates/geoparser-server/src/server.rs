//! HTTP server implementation using Axum.

use crate::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use geoparser_core::GeoParserService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Application state shared across handlers.
pub struct AppState {
    /// Parse orchestration context (registry, cache, configuration).
    pub service: GeoParserService,
}

/// Start the REST HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    service: GeoParserService,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let state = Arc::new(AppState { service });

    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .route("/", get(handlers::handle_root))
        .route("/api/parse", post(handlers::handle_parse))
        .route("/api/parse/batch", post(handlers::handle_parse_batch))
        .route("/api/info", get(handlers::handle_info))
        .route("/api/health", get(handlers::handle_health))
        .route("/api/cache/clear", post(handlers::handle_cache_clear))
        .route("/api/languages", get(handlers::handle_languages))
        .fallback(handlers::handle_not_found)
        .layer(cors)
        .with_state(state);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    Ok(actual_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geoparser_core::{
        GeoError, LocationRecord, RawLocation, Recognizer, RecognizerLoader, ResolvedModel,
        Result, ServiceConfig,
    };
    use serde_json::{json, Value};

    /// Recognizer returning one fixed location.
    struct StubRecognizer {
        model_name: String,
    }

    #[async_trait]
    impl Recognizer for StubRecognizer {
        async fn parse(&self, _text: &str) -> Result<Vec<RawLocation>> {
            Ok(vec![RawLocation::Record(LocationRecord {
                name: Some("Beijing".into()),
                latitude: Some(39.9075),
                longitude: Some(116.39723),
                country_name: Some("China".into()),
                ..LocationRecord::default()
            })])
        }

        fn model_name(&self) -> &str {
            &self.model_name
        }
    }

    struct StubLoader;

    #[async_trait]
    impl RecognizerLoader for StubLoader {
        async fn load(&self, model: &ResolvedModel) -> Result<Arc<dyn Recognizer>> {
            if model.language == "de" {
                return Err(GeoError::LoadFailed {
                    model: model.model_name.clone(),
                    message: "not installed".into(),
                });
            }
            Ok(Arc::new(StubRecognizer {
                model_name: model.model_name.clone(),
            }))
        }
    }

    async fn start_test_server(config: ServiceConfig) -> SocketAddr {
        let service = GeoParserService::new(config, &StubLoader).await.unwrap();
        start_server(service, "127.0.0.1", 0).await.unwrap()
    }

    async fn post_json(addr: SocketAddr, path: &str, body: Value) -> (u16, Value) {
        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}{}", addr, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn get_json(addr: SocketAddr, path: &str) -> (u16, Value) {
        let response = reqwest::get(format!("http://{}{}", addr, path))
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_server_starts() {
        let addr = start_test_server(ServiceConfig::default()).await;
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_parse_roundtrip_and_cache_flag() {
        let addr = start_test_server(ServiceConfig::default()).await;

        let body = json!({"text": "I want to travel to Beijing!", "languages": "en"});
        let (status, first) = post_json(addr, "/api/parse", body.clone()).await;
        assert_eq!(status, 200);
        assert_eq!(first["success"], json!(true));
        assert_eq!(first["language_detected"], json!("en"));
        assert_eq!(first["model_used"], json!("en_core_web_sm"));
        assert_eq!(first["locations_found"], json!(1));
        assert_eq!(first["locations"][0]["name"], json!("Beijing"));
        // Absent record fields are explicit nulls, not omitted.
        assert!(first["locations"][0]["population"].is_null());
        assert_eq!(first["from_cache"], json!(false));

        let (status, second) = post_json(addr, "/api/parse", body).await;
        assert_eq!(status, 200);
        assert_eq!(second["from_cache"], json!(true));
    }

    #[tokio::test]
    async fn test_parse_request_shape_errors() {
        let addr = start_test_server(ServiceConfig::default()).await;

        // Missing required `text` field.
        let (status, body) = post_json(addr, "/api/parse", json!({"languages": "en"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].is_string());

        // Whitespace-only text.
        let (status, body) = post_json(addr, "/api/parse", json!({"text": "   "})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("Text cannot be empty"));
    }

    #[tokio::test]
    async fn test_parse_validation_failure_maps_to_400() {
        let config = ServiceConfig {
            max_text_length: 5,
            ..ServiceConfig::default()
        };
        let addr = start_test_server(config).await;

        let (status, body) =
            post_json(addr, "/api/parse", json!({"text": "way too long"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], json!(false));
        assert_eq!(
            body["error"],
            json!("Input text exceeds maximum length of 5 characters.")
        );
    }

    #[tokio::test]
    async fn test_batch_mixed_results() {
        let addr = start_test_server(ServiceConfig::default()).await;

        let body = json!({"texts": [
            {"text": "Travel to Beijing", "id": 1},
            {"languages": "en"},
            {"text": "Visit Paris", "id": "third"}
        ]});
        let (status, response) = post_json(addr, "/api/parse/batch", body).await;
        assert_eq!(status, 200);
        assert_eq!(response["success"], json!(true));
        assert_eq!(response["total_processed"], json!(3));
        assert_eq!(response["successful_parses"], json!(2));
        assert_eq!(response["failed_parses"], json!(1));
        assert_eq!(response["results"][0]["id"], json!(1));
        assert_eq!(
            response["results"][1]["error"],
            json!("Invalid input format - missing text field")
        );
        assert_eq!(response["results"][2]["id"], json!("third"));
    }

    #[tokio::test]
    async fn test_batch_shape_errors() {
        let addr = start_test_server(ServiceConfig::default()).await;

        let (status, _) = post_json(addr, "/api/parse/batch", json!({})).await;
        assert_eq!(status, 400);

        let (status, body) = post_json(addr, "/api/parse/batch", json!({"texts": []})).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("texts list cannot be empty"));
    }

    #[tokio::test]
    async fn test_batch_too_large() {
        let config = ServiceConfig {
            max_batch_size: 1,
            ..ServiceConfig::default()
        };
        let addr = start_test_server(config).await;

        let body = json!({"texts": [{"text": "a"}, {"text": "b"}]});
        let (status, response) = post_json(addr, "/api/parse/batch", body).await;
        assert_eq!(status, 400);
        assert_eq!(
            response["error"],
            json!("Batch size too large. Maximum allowed: 1")
        );
    }

    #[tokio::test]
    async fn test_info_and_languages() {
        let addr = start_test_server(ServiceConfig::default()).await;

        let (status, info) = get_json(addr, "/api/info").await;
        assert_eq!(status, 200);
        assert_eq!(info["success"], json!(true));
        // "de" fails to load in the stub; the rest come up.
        assert_eq!(info["info"]["loaded_models"], json!(["en", "es", "fr", "zh"]));
        assert_eq!(info["info"]["cache_enabled"], json!(true));

        let (status, languages) = get_json(addr, "/api/languages").await;
        assert_eq!(status, 200);
        assert_eq!(
            languages["supported_languages"],
            json!(["en", "de", "fr", "zh", "es"])
        );
        assert_eq!(languages["default_model_size"], json!("sm"));
        assert_eq!(
            languages["available_model_sizes"],
            json!(["sm", "md", "lg", "trf"])
        );
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let addr = start_test_server(ServiceConfig::default()).await;

        let (status, report) = get_json(addr, "/api/health").await;
        assert_eq!(status, 200);
        assert_eq!(report["status"], json!("healthy"));
        assert_eq!(report["test_parse_success"], json!(true));
    }

    #[tokio::test]
    async fn test_cache_clear_enabled_and_disabled() {
        let addr = start_test_server(ServiceConfig::default()).await;
        post_json(addr, "/api/parse", json!({"text": "Travel to Beijing"})).await;

        let (status, body) = post_json(addr, "/api/cache/clear", json!({})).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], json!(true));
        assert_eq!(
            body["message"],
            json!("Cache cleared successfully. Removed 1 entries.")
        );

        let config = ServiceConfig {
            enable_cache: false,
            ..ServiceConfig::default()
        };
        let addr = start_test_server(config).await;
        let (status, body) = post_json(addr, "/api/cache/clear", json!({})).await;
        assert_eq!(status, 400);
        assert_eq!(
            body["message"],
            json!("Caching is not enabled. No cache to clear.")
        );
    }

    #[tokio::test]
    async fn test_root_banner_and_unknown_route() {
        let addr = start_test_server(ServiceConfig::default()).await;

        let (status, banner) = get_json(addr, "/").await;
        assert_eq!(status, 200);
        assert_eq!(banner["service"], json!("GeoParser API"));
        assert_eq!(banner["endpoints"]["parse"], json!("/api/parse"));

        let (status, missing) = get_json(addr, "/api/nope").await;
        assert_eq!(status, 404);
        assert_eq!(missing["error"], json!("Endpoint not found"));
        assert!(missing["available_endpoints"].is_array());
    }
}
