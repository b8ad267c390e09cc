//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Health check
//! GET  /health/ready              - Readiness (database, when configured)
//!
//! # Directory
//! GET  /providers                 - Filtered listing (results fragment for HTMX)
//! GET  /providers/{id}            - Provider profile
//! POST /providers/{id}/favorite   - Toggle favorite (actions fragment, triggers selection-updated)
//! POST /providers/{id}/compare    - Toggle compare (actions fragment, triggers selection-updated)
//!
//! # Selections
//! GET  /favorites                 - Saved providers
//! GET  /compare                   - Compare table (max 3)
//! POST /compare/clear             - Empty the compare tray
//! GET  /selection/counts          - Header counts fragment
//!
//! # Forms (per-IP rate limited)
//! GET  /submit                    - Listing submission form
//! POST /submit                    - Submit a listing
//! GET  /contact                   - Contact form
//! POST /contact                   - Send a message
//! ```

pub mod forms;
pub mod home;
pub mod providers;
pub mod selections;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::form_rate_limiter;
use crate::state::AppState;

/// Create the directory routes router.
pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(providers::index))
        .route("/{id}", get(providers::show))
        .route("/{id}/favorite", post(providers::toggle_favorite))
        .route("/{id}/compare", post(providers::toggle_compare))
}

/// Create the form routes router. Only the POSTs are rate limited.
pub fn form_routes() -> Router<AppState> {
    let limiter = form_rate_limiter();

    Router::new()
        .route(
            "/submit",
            get(forms::submit_page).merge(post(forms::submit).layer(limiter.clone())),
        )
        .route(
            "/contact",
            get(forms::contact_page).merge(post(forms::contact).layer(limiter)),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Directory
        .nest("/providers", provider_routes())
        // Selections
        .route("/favorites", get(selections::favorites))
        .route("/compare", get(selections::compare))
        .route("/compare/clear", post(selections::clear_compare))
        .route("/selection/counts", get(selections::nav_counts))
        // Forms
        .merge(form_routes())
}
