//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] appy_link_core::EmailError),

    /// Unknown account or wrong password. Deliberately indistinguishable.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Password does not meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Sign-up for an address that already has an account.
    #[error("an account already exists for this email")]
    AccountExists,

    /// Token unknown, used, expired or issued for another purpose.
    #[error("this link is invalid or has expired")]
    InvalidToken,

    /// Password hashing failed.
    #[error("failed to hash password")]
    PasswordHash,

    /// Email delivery failed.
    #[error("email error: {0}")]
    Email(#[from] EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Message safe to show on the sign-in pages.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::WeakPassword(reason) => format!("{reason}."),
            Self::AccountExists => {
                "An account already exists for this email. Sign in or reset your password."
                    .to_string()
            }
            Self::InvalidToken => "This link is invalid or has expired. Request a new one.".to_string(),
            Self::Email(_) => "We couldn't send the email. Please try again.".to_string(),
            Self::PasswordHash | Self::Repository(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Whether the error is a server fault worth reporting.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::PasswordHash | Self::Email(_) | Self::Repository(_))
    }
}
