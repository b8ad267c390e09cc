//! Application state shared across handlers.

use std::sync::Arc;

use lettre::transport::smtp::Error as SmtpError;
use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{AuthService, EmailService, ModerationService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    mailer: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if SMTP is configured but the relay is invalid.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, SmtpError> {
        let mailer = config.email.as_ref().map(EmailService::new).transpose()?;
        if mailer.is_none() {
            tracing::warn!("SMTP not configured - sign-in and reset links will be logged");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mailer,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Authentication service over this state's pool and mailer.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            &self.inner.pool,
            &self.inner.config,
            self.inner.mailer.as_ref(),
        )
    }

    #[must_use]
    pub fn moderation(&self) -> ModerationService<'_> {
        ModerationService::new(&self.inner.pool)
    }
}
