//! Appy Link Admin library.
//!
//! This crate provides the admin portal as a library, allowing the router
//! to be built and exercised from integration tests.
//!
//! # Security
//!
//! This crate holds write access to the directory: moderation, provider and
//! category edits, and the account table. Every page past sign-in goes
//! through a capability extractor in [`middleware::auth`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, middleware::from_fn, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::service::SignedCookie;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Assemble the full admin router over `state`.
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
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
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
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
