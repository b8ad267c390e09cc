//! Admin authentication service.
//!
//! Three ways in, one way to finish:
//! - passwordless magic link (one-time, 15 minutes)
//! - email and password (Argon2id), with self-service sign-up
//! - password reset via emailed one-time link (1 hour), which also signs in
//!
//! Sign-up proves ownership of the address before any account exists: the
//! chosen password waits in a one-time confirmation token (1 hour) and is
//! only applied when the emailed link is followed. Roles are resolved by
//! address, so an unconfirmed sign-up must never become an account.
//!
//! Every successful path ends in [`AuthService::finish_sign_in`], which
//! resolves the account's [`Authorization`] once for the session. The
//! configured bootstrap address is always an admin.
//!
//! Tokens are random 256-bit values sent in links; only their SHA-256 is
//! stored. When SMTP is not configured the links are logged instead.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use appy_link_core::Email;
use appy_link_core::access::Authorization;

use crate::config::AdminConfig;
use crate::db::{
    Account, AccountRepository, LoginTokenRepository, RedeemedToken, RepositoryError,
    TokenPurpose,
};
use crate::models::CurrentAdmin;
use crate::services::email::EmailService;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lifetime of a magic sign-in link.
pub const MAGIC_LINK_TTL_MINUTES: i64 = 15;

/// Lifetime of a password reset link.
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 60;

/// Lifetime of a sign-up confirmation link.
pub const SIGN_UP_TTL_MINUTES: i64 = 60;

/// Admin authentication service.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
    tokens: LoginTokenRepository<'a>,
    config: &'a AdminConfig,
    mailer: Option<&'a EmailService>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        config: &'a AdminConfig,
        mailer: Option<&'a EmailService>,
    ) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
            tokens: LoginTokenRepository::new(pool),
            config,
            mailer,
        }
    }

    // =========================================================================
    // Magic Link
    // =========================================================================

    /// Email a one-time sign-in link to `email`.
    ///
    /// The account is created when the link is first used, so this succeeds
    /// for any well-formed address.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address is malformed.
    /// Returns `AuthError::Email` if delivery fails.
    pub async fn request_magic_link(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let token = self
            .issue_token(&email, TokenPurpose::MagicLink, None, MAGIC_LINK_TTL_MINUTES)
            .await?;
        let link = self.config.url(&format!("/auth/magic/{token}"));

        match self.mailer {
            Some(mailer) => {
                mailer
                    .send_magic_link(email.as_str(), &link, MAGIC_LINK_TTL_MINUTES)
                    .await?;
            }
            None => tracing::warn!(
                email = %email,
                link = %link,
                "SMTP not configured, magic link logged"
            ),
        }
        Ok(())
    }

    /// Exchange a magic link token for a signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, used or expired.
    pub async fn sign_in_with_magic_link(&self, token: &str) -> Result<CurrentAdmin, AuthError> {
        let RedeemedToken { email, .. } = self
            .tokens
            .consume(&hash_token(token), TokenPurpose::MagicLink)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let account = self.accounts.get_or_create(&email).await?;
        self.finish_sign_in(&account).await
    }

    // =========================================================================
    // Password
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a malformed or unknown
    /// address, an account without a password, or a wrong password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CurrentAdmin, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let account = self
            .accounts
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = account
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, hash)?;
        self.finish_sign_in(&account).await
    }

    /// Start a password sign-up by emailing a confirmation link.
    ///
    /// Nothing is created yet: the account (or the password on an existing
    /// magic-link account) appears only through [`Self::confirm_sign_up`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address is malformed.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::AccountExists` if the address already has a password.
    /// Returns `AuthError::Email` if delivery fails.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        if self
            .accounts
            .get_by_email(&email)
            .await?
            .is_some_and(|account| account.password_hash.is_some())
        {
            return Err(AuthError::AccountExists);
        }

        let hash = hash_password(password)?;
        let token = self
            .issue_token(&email, TokenPurpose::SignUp, Some(&hash), SIGN_UP_TTL_MINUTES)
            .await?;
        let link = self.config.url(&format!("/auth/signup/{token}"));

        match self.mailer {
            Some(mailer) => {
                mailer
                    .send_sign_up_confirmation(email.as_str(), &link, SIGN_UP_TTL_MINUTES)
                    .await?;
            }
            None => tracing::warn!(
                email = %email,
                link = %link,
                "SMTP not configured, sign-up confirmation link logged"
            ),
        }
        tracing::info!(email = %email, "Sign-up confirmation sent");
        Ok(())
    }

    /// Follow a sign-up confirmation link: create the account with the
    /// password chosen at sign-up, then sign in.
    ///
    /// New accounts have no role, so unless the address is the bootstrap
    /// admin they land on the restricted notice until someone grants one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, used or expired.
    /// Returns `AuthError::AccountExists` if the address gained a password
    /// after the link was sent.
    pub async fn confirm_sign_up(&self, token: &str) -> Result<CurrentAdmin, AuthError> {
        let RedeemedToken {
            email,
            password_hash,
        } = self
            .tokens
            .consume(&hash_token(token), TokenPurpose::SignUp)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        let hash = password_hash.ok_or_else(|| {
            RepositoryError::DataCorruption("sign-up token without a password".to_string())
        })?;

        let account = match self.accounts.get_by_email(&email).await? {
            None => {
                let account = self
                    .accounts
                    .create(&email, Some(&hash), None)
                    .await
                    .map_err(|e| match e {
                        RepositoryError::Conflict(_) => AuthError::AccountExists,
                        other => AuthError::Repository(other),
                    })?;
                tracing::info!(email = %email, "Admin account created");
                account
            }
            Some(account) if account.password_hash.is_none() => {
                self.accounts.set_password_hash(&email, &hash).await?;
                tracing::info!(email = %email, "Password added to existing account");
                account
            }
            Some(_) => return Err(AuthError::AccountExists),
        };

        self.finish_sign_in(&account).await
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Email a password reset link if an account exists for `email`.
    ///
    /// Succeeds silently for unknown addresses so the form cannot be used to
    /// probe which accounts exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address is malformed.
    /// Returns `AuthError::Email` if delivery fails.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        if self.accounts.get_by_email(&email).await?.is_none() {
            tracing::info!(email = %email, "Password reset requested for unknown account");
            return Ok(());
        }

        let token = self
            .issue_token(&email, TokenPurpose::PasswordReset, None, PASSWORD_RESET_TTL_MINUTES)
            .await?;
        let link = self.config.url(&format!("/auth/reset/{token}"));

        match self.mailer {
            Some(mailer) => {
                mailer
                    .send_password_reset(email.as_str(), &link, PASSWORD_RESET_TTL_MINUTES)
                    .await?;
            }
            None => tracing::warn!(
                email = %email,
                link = %link,
                "SMTP not configured, password reset link logged"
            ),
        }
        Ok(())
    }

    /// Whether `token` can still be used to reset a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn reset_token_is_valid(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self
            .tokens
            .is_valid(&hash_token(token), TokenPurpose::PasswordReset)
            .await?)
    }

    /// Set a new password using a reset token, then sign in.
    ///
    /// The password is checked before the token is spent, so a too-short
    /// password leaves the link usable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::InvalidToken` if the token is unknown, used or expired.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<CurrentAdmin, AuthError> {
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;

        let RedeemedToken { email, .. } = self
            .tokens
            .consume(&hash_token(token), TokenPurpose::PasswordReset)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.accounts
            .set_password_hash(&email, &hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidToken,
                other => AuthError::Repository(other),
            })?;

        let account = self
            .accounts
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(email = %email, "Admin password reset");
        self.finish_sign_in(&account).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Record the sign-in and resolve what the account may do.
    async fn finish_sign_in(&self, account: &Account) -> Result<CurrentAdmin, AuthError> {
        self.accounts.touch_sign_in(account.id).await?;

        let authorization = Authorization::resolve(
            &account.email,
            account.role,
            self.config.bootstrap_admin_email.as_ref(),
        );

        tracing::info!(
            email = %account.email,
            role = ?authorization.role(),
            "Admin signed in"
        );

        Ok(CurrentAdmin {
            id: account.id,
            email: account.email.clone(),
            authorization,
        })
    }

    async fn issue_token(
        &self,
        email: &Email,
        purpose: TokenPurpose,
        password_hash: Option<&str>,
        ttl_minutes: i64,
    ) -> Result<String, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
        self.tokens
            .create(email, &hash_token(&token), purpose, password_hash, expires_at)
            .await?;
        Ok(token)
    }
}

/// Generate a URL-safe random token (256 bits).
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The stored form of a token: lowercase hex SHA-256.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
