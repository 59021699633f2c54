//! HTTP handlers module.
//!
//! Provides HTTP endpoints for embedding operations using the local model.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::error::EmbeddingError;
use crate::models::{EmbedRequest, EmbedResponse, ErrorResponse, HealthResponse};
use crate::services::EmbeddingService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: Arc<EmbeddingService>,
}

/// Build the HTTP router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/embed", post(embed))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "embedding-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.service.model_name().to_string(),
        dimension: state.service.dimension(),
        endpoints: vec!["/health".to_string(), "/embed".to_string()],
    })
}

/// Embed a list of texts.
pub async fn embed(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!(
        "Embedding request, {} texts",
        request
            .texts
            .as_array()
            .map(|t| t.len().to_string())
            .unwrap_or_else(|| "?".to_string())
    );

    // Inference blocks; keep it off the async workers.
    let service = state.service.clone();
    let result = tokio::task::spawn_blocking(move || service.get_embeddings(&request.texts))
        .await
        .unwrap_or_else(|e| {
            Err(EmbeddingError::Generation(format!(
                "embedding task failed: {}",
                e
            )))
        });

    match result {
        Ok(embeddings) => Ok(Json(EmbedResponse {
            count: embeddings.len(),
            embeddings,
            dimension: state.service.dimension(),
            model: state.service.model_name().to_string(),
        })),
        Err(e) => Err(error_response(e)),
    }
}

fn error_response(err: EmbeddingError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        EmbeddingError::InvalidInput(_) => {
            warn!("Rejected embedding request: {}", err);
            StatusCode::BAD_REQUEST
        }
        EmbeddingError::Generation(_) | EmbeddingError::Initialization(_) => {
            error!("Embedding failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        }),
    )
}
