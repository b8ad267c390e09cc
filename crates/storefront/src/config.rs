//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_SESSION_SECRET` - Cookie signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`). When neither is set the storefront runs in seed mode:
//!   it serves the built-in directory and queues form submissions as drafts
//!   in the visitor's session.
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:3000`)
//! - `FORM_COOLDOWN_SECS` - Wait between two submissions of one form (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.1)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use appy_link_core::env::{Env, EnvError, SentrySettings};
use appy_link_core::throttle::DEFAULT_COOLDOWN_SECS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` connection URL; `None` runs the storefront on seed data.
    pub database_url: Option<SecretString>,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// Seconds a visitor must wait between two submissions of the same form
    pub form_cooldown_secs: i64,
    pub sentry: SentrySettings,
}

impl StorefrontConfig {
    /// Load configuration from the process environment (and `.env`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the session secret is missing or weak, or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&Env::process())
    }

    /// Load configuration from `env`.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn load<L: Fn(&str) -> Option<String>>(env: &Env<L>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env
                .first_of(&["STOREFRONT_DATABASE_URL", "DATABASE_URL"])
                .map(SecretString::from),
            host: env.parse_or("STOREFRONT_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: env.parse_or("STOREFRONT_PORT", 3000)?,
            base_url: env
                .optional("STOREFRONT_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_owned()),
            session_secret: env.secret("STOREFRONT_SESSION_SECRET")?,
            form_cooldown_secs: env.parse_or("FORM_COOLDOWN_SECS", DEFAULT_COOLDOWN_SECS)?,
            sentry: env.sentry()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront serves built-in data instead of a database.
    #[must_use]
    pub const fn is_seed_mode(&self) -> bool {
        self.database_url.is_none()
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}
