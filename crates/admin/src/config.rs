//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BASE_URL` - Public URL used in emailed links (default: `http://localhost:3001`)
//! - `ADMIN_BOOTSTRAP_EMAIL` - Address always granted the admin role
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.1)
//!
//! ## Optional (SMTP - without it sign-in and reset links are logged)
//! - `SMTP_HOST` - SMTP server hostname
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_USERNAME` - SMTP authentication username (required with `SMTP_HOST`)
//! - `SMTP_PASSWORD` - SMTP authentication password (required with `SMTP_HOST`)
//! - `SMTP_FROM` - Email sender address (required with `SMTP_HOST`)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use appy_link_core::Email;
use appy_link_core::env::{Env, EnvError, SentrySettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] EnvError),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL, without a trailing slash
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Account granted the admin role regardless of what is stored
    pub bootstrap_admin_email: Option<Email>,
    /// SMTP settings; links are logged when absent
    pub email: Option<EmailConfig>,
    pub sentry: SentrySettings,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Sender address, e.g. `Appy Link <no-reply@appylink.co.uk>`
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from the process environment (and `.env`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL or session secret is
    /// missing, the secret is weak, SMTP is partially configured, or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&Env::process())
    }

    /// Load configuration from `env`.
    ///
    /// # Errors
    ///
    /// See [`AdminConfig::from_env`].
    pub fn load<L: Fn(&str) -> Option<String>>(env: &Env<L>) -> Result<Self, ConfigError> {
        let database_url = env
            .first_of(&["ADMIN_DATABASE_URL", "DATABASE_URL"])
            .map(SecretString::from)
            .ok_or_else(|| EnvError::Missing("ADMIN_DATABASE_URL or DATABASE_URL".to_owned()))?;
        let base_url = env
            .optional("ADMIN_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3001".to_owned())
            .trim_end_matches('/')
            .to_owned();

        Ok(Self {
            database_url,
            host: env.parse_or("ADMIN_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: env.parse_or("ADMIN_PORT", 3001)?,
            base_url,
            session_secret: env.secret("ADMIN_SESSION_SECRET")?,
            bootstrap_admin_email: env.parse_optional("ADMIN_BOOTSTRAP_EMAIL", Email::parse)?,
            email: EmailConfig::load(env)?,
            sentry: env.sentry()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute URL for a path on this portal.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl EmailConfig {
    /// `SMTP_HOST` switches email on; the other SMTP settings are then
    /// required.
    fn load<L: Fn(&str) -> Option<String>>(env: &Env<L>) -> Result<Option<Self>, EnvError> {
        let Some(smtp_host) = env.optional("SMTP_HOST") else {
            return Ok(None);
        };

        Ok(Some(Self {
            smtp_host,
            smtp_port: env.parse_or("SMTP_PORT", 587)?,
            smtp_username: env.required("SMTP_USERNAME")?,
            smtp_password: SecretString::from(env.required("SMTP_PASSWORD")?),
            from_address: env.required("SMTP_FROM")?,
        }))
    }
}
