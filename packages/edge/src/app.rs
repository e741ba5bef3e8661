//! Router assembly for the edge service.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::proxy::proxy_api;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Upstream client, shared across requests.
    pub http: reqwest::Client,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
}

/// Liveness probe. The backend is deliberately not checked here; its
/// availability surfaces per-request as 502 from the proxy.
pub async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Build the edge router.
///
/// The `/api` routes sit behind the rate limiter (the OTP request endpoint
/// is the canonical abuse target); the health check does not.
pub fn build_app(http: reqwest::Client) -> Router {
    // CORS for the dashboard's browser clients.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // Rate limiting: 10 requests per second per client IP with bursts of 20,
    // IP taken from forwarded headers when present.
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .use_headers()
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    Router::new()
        .route("/api", any(proxy_api))
        .route("/api/*path", any(proxy_api))
        .layer(rate_limit_layer)
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { http })
}
