//! Axum router configuration for the LexQA HTTP API.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Build the main API router.
pub fn build_router(config: &ApiConfig, state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .nest("/auth", crate::auth::router())
        .nest("/qa", crate::qa::router())
        .route("/health", axum::routing::get(health_check))
        .with_state(state);

    if config.enable_cors {
        router = router.layer(create_cors_layer(config));
    }

    router
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Create CORS layer based on configuration.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_allowed_origins.is_empty() {
        cors = cors.allow_origin(tower_http::cors::Any);
    } else {
        let origins: Vec<_> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        cors = cors.allow_origin(origins);
    }

    cors.allow_methods([
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::PUT,
        axum::http::Method::DELETE,
        axum::http::Method::OPTIONS,
    ])
    .allow_headers([
        axum::http::header::CONTENT_TYPE,
        axum::http::header::AUTHORIZATION,
        axum::http::header::ACCEPT,
    ])
}
