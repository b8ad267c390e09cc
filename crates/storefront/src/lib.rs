//! Appy Link Storefront library.
//!
//! This crate provides the public directory as a library, allowing the
//! router to be built and exercised from integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, middleware::from_fn, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tower_sessions::service::SignedCookie;
use tracing::Span;

use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Assemble the full storefront router over `state`.
///
/// Sentry layers are added by the binary so tests stay free of a hub.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S, SignedCookie>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity when a database is configured. Seed mode
/// is always ready. Returns 503 Service Unavailable if the database is not
/// reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
