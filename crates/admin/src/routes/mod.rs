//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//! GET  /health/ready                - Readiness (database)
//!
//! # Auth (sign-in and reset POSTs are rate limited)
//! GET  /auth/login                  - Sign-in page (magic link and password)
//! POST /auth/login                  - Password sign-in
//! POST /auth/magic-link             - Email a sign-in link
//! GET  /auth/magic/{token}          - Follow a sign-in link
//! GET  /auth/signup                 - Sign-up page
//! POST /auth/signup                 - Create an account
//! GET  /auth/reset                  - Forgot password page
//! POST /auth/reset                  - Email a reset link
//! GET  /auth/reset/{token}          - New password page
//! POST /auth/reset/{token}          - Set new password and sign in
//! POST /auth/logout                 - Logout
//! GET  /restricted                  - Notice for accounts without a role
//!
//! # Dashboard (any role)
//! GET  /                            - Counts overview
//!
//! # Submissions
//! GET  /submissions                 - Review queue (?status=new|approved|rejected|all)
//! POST /submissions/{id}/approve    - Approve into a provider (editor, admin)
//! POST /submissions/{id}/reject     - Reject with optional reason (editor, admin)
//!
//! # Providers
//! GET  /providers                   - All providers
//! GET  /providers/new               - Create form (admin)
//! POST /providers                   - Create (admin)
//! GET  /providers/{id}/edit         - Edit form (editor, admin)
//! POST /providers/{id}              - Save edit (editor, admin)
//! POST /providers/{id}/hide         - Hide (editor, admin)
//! POST /providers/{id}/show         - Show (editor, admin)
//! GET  /providers/{id}/delete       - Delete confirmation (admin)
//! POST /providers/{id}/delete       - Delete (admin)
//!
//! # Categories
//! GET  /categories                  - List with provider counts
//! POST /categories                  - Create (admin)
//! GET  /categories/{id}/edit        - Edit form (admin)
//! POST /categories/{id}             - Save edit, moving providers on id change (admin)
//! GET  /categories/{id}/delete      - Delete confirmation (admin)
//! POST /categories/{id}/delete      - Delete unless in use (admin)
//!
//! # Inbox
//! GET  /messages                    - Contact messages
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod messages;
pub mod providers;
pub mod submissions;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the provider routes router.
pub fn provider_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(providers::index).post(providers::create))
        .route("/new", get(providers::new_page))
        .route("/{id}", post(providers::update))
        .route("/{id}/edit", get(providers::edit_page))
        .route("/{id}/hide", post(providers::hide))
        .route("/{id}/show", post(providers::show))
        .route(
            "/{id}/delete",
            get(providers::delete_page).post(providers::delete),
        )
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit_page))
        .route(
            "/{id}/delete",
            get(categories::delete_page).post(categories::delete),
        )
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/", get(dashboard::index))
        // Auth
        .merge(auth::router())
        // Moderation
        .route("/submissions", get(submissions::index))
        .route("/submissions/{id}/approve", post(submissions::approve))
        .route("/submissions/{id}/reject", post(submissions::reject))
        // Catalog
        .nest("/providers", provider_routes())
        .nest("/categories", category_routes())
        // Inbox
        .route("/messages", get(messages::index))
}
