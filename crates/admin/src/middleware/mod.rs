//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers (stricter CSP for admin)
//! 4. Session layer (signed cookie, `PostgreSQL` store)
//! 5. Rate limiting on sign-in and reset POSTs (governor)
//!
//! Access control is not a layer: handlers take one of the extractors in
//! [`auth`], so every route states the capability it needs.

pub mod auth;
pub mod rate_limit;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAdmin, RequireCatalogManager, RequireEditor, RequireModerator, RequireSession,
    RequireView, clear_current_admin, set_current_admin, set_flash, take_flash,
};
pub use rate_limit::auth_rate_limiter;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
