//! Session middleware configuration for admin.
//!
//! Sets up signed-cookie sessions using tower-sessions with stricter
//! settings than the storefront (SameSite=Strict, 24hr expiry). Production
//! uses the `PostgreSQL` store; tests pass an in-memory one.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "appy_admin_session";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Derive the 64-byte cookie signing key from the configured secret.
#[must_use]
pub fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &AdminConfig) -> SessionManagerLayer<S, SignedCookie>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}
