//! Session middleware configuration.
//!
//! Sessions hold visitor state only (favorites, compare, drafts, cooldowns).
//! The cookie is signed with a key derived from `STOREFRONT_SESSION_SECRET`.
//! The store is `PostgreSQL` when a database is configured and in-memory in
//! seed mode.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "appy_session";

/// Session expiry time in seconds (30 days). Favorites should outlive a visit.
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Derive the 64-byte cookie signing key from the configured secret.
#[must_use]
pub fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<S>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S, SignedCookie>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_deterministic() {
        let secret = SecretString::from("k3Jx9!pQ2@vL8#mN4$wR7^zT1&yB6*cD");
        assert_eq!(
            signing_key(&secret).signing(),
            signing_key(&secret).signing()
        );
        let other = SecretString::from("another-k3Jx9!pQ2@vL8#mN4$wR7^zT1");
        assert_ne!(signing_key(&secret).signing(), signing_key(&other).signing());
    }
}
