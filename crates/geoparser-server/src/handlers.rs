//! REST request handlers.
//!
//! Request-shape problems (malformed JSON, missing required fields) are
//! answered here with a 400 envelope and never reach the core; everything
//! else is delegated to `GeoParserService`, whose structured results map onto
//! status codes (`success: false` → 400, unhealthy → 503).

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geoparser_core::{BatchItem, ClearOutcome, LanguageSelector, ParseResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Body of `POST /api/parse`.
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
    #[serde(default)]
    pub languages: Option<LanguageSelector>,
    #[serde(default)]
    pub model_size: Option<String>,
}

/// Body of `POST /api/parse/batch`.
#[derive(Debug, Deserialize)]
pub struct BatchParseRequest {
    pub texts: Vec<BatchItem>,
    #[serde(default)]
    pub model_size: Option<String>,
}

/// Envelope for `POST /api/parse/batch` responses.
#[derive(Debug, Serialize)]
pub struct BatchParseResponse {
    pub success: bool,
    pub total_processed: usize,
    pub successful_parses: usize,
    pub failed_parses: usize,
    pub results: Vec<ParseResult>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"success": false, "error": message.into()})),
    )
        .into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// `POST /api/parse` — parse one text for geographic entities.
pub async fn handle_parse(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    if request.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Text cannot be empty");
    }

    let result = state
        .service
        .parse_text(
            &request.text,
            request.languages.as_ref(),
            request.model_size.as_deref(),
        )
        .await;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(result)).into_response()
}

/// `POST /api/parse/batch` — parse a batch of texts.
pub async fn handle_parse_batch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchParseRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    if request.texts.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "texts list cannot be empty");
    }

    let max_batch_size = state.service.config().max_batch_size;
    if request.texts.len() > max_batch_size {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Batch size too large. Maximum allowed: {}", max_batch_size),
        );
    }

    let results = state
        .service
        .parse_batch(&request.texts, request.model_size.as_deref())
        .await;

    let successful_parses = results.iter().filter(|r| r.success).count();
    let response = BatchParseResponse {
        success: true,
        total_processed: results.len(),
        successful_parses,
        failed_parses: results.len() - successful_parses,
        results,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// `GET /api/info` — registry, cache and configuration summary.
pub async fn handle_info(State(state): State<Arc<AppState>>) -> Response {
    let info = state.service.model_info();
    (StatusCode::OK, Json(json!({"success": true, "info": info}))).into_response()
}

/// `GET /api/health` — canary parse through the full pipeline.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    let report = state.service.health_check().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

/// `POST /api/cache/clear` — drop all memoized parse results.
pub async fn handle_cache_clear(State(state): State<Arc<AppState>>) -> Response {
    match state.service.clear_cache() {
        ClearOutcome::Cleared { removed } => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": format!("Cache cleared successfully. Removed {} entries.", removed),
            })),
        )
            .into_response(),
        ClearOutcome::Disabled => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Caching is not enabled. No cache to clear.",
            })),
        )
            .into_response(),
    }
}

/// `GET /api/languages` — static configuration echo.
pub async fn handle_languages(State(state): State<Arc<AppState>>) -> Response {
    let config = state.service.config();
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "supported_languages": config.supported_languages,
            "default_model_size": config.default_model_size(),
            "available_model_sizes": config.available_model_sizes,
        })),
    )
        .into_response()
}

/// `GET /` — service banner with the endpoint map.
pub async fn handle_root() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "service": "GeoParser API",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running",
            "endpoints": {
                "parse": "/api/parse",
                "batch_parse": "/api/parse/batch",
                "info": "/api/info",
                "health": "/api/health",
                "clear_cache": "/api/cache/clear",
                "languages": "/api/languages",
            },
        })),
    )
        .into_response()
}

/// Fallback for unknown routes.
pub async fn handle_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Endpoint not found",
            "available_endpoints": [
                "/api/parse",
                "/api/parse/batch",
                "/api/info",
                "/api/health",
                "/api/cache/clear",
                "/api/languages",
            ],
        })),
    )
        .into_response()
}
