//! Authentication extractors for admin.
//!
//! Each protected handler names the capability it needs by the extractor it
//! takes. Signed-out requests are redirected to sign in, signed-in accounts
//! without a role to the restricted notice, and accounts whose role lacks the
//! capability get 403.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn approve(
//!     RequireModerator(admin): RequireModerator,
//!     Path(id): Path<i32>,
//! ) -> impl IntoResponse {
//!     // admin.authorization.can_moderate() is true here
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use appy_link_core::access::{Capability, Gate};

use crate::models::{CurrentAdmin, Flash, session_keys};

/// Path of the sign-in page.
pub const LOGIN_PATH: &str = "/auth/login";

/// Path of the notice shown to signed-in accounts without a role.
pub const RESTRICTED_PATH: &str = "/restricted";

/// Why a request did not get through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// No session, or no account in it.
    RedirectToLogin,
    /// Signed in without a role.
    Restricted,
    /// Signed in, but the role lacks the capability.
    Forbidden(Capability),
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Restricted => Redirect::to(RESTRICTED_PATH).into_response(),
            Self::Forbidden(capability) => (
                StatusCode::FORBIDDEN,
                format!("You do not have permission to {}.", capability.describe()),
            )
                .into_response(),
        }
    }
}

async fn session_admin(parts: &Parts) -> Option<CurrentAdmin> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
}

/// Run the gate for `capability` against the session's account.
async fn gate(parts: &Parts, capability: Capability) -> Result<CurrentAdmin, GateRejection> {
    let admin = session_admin(parts).await;

    match Gate::evaluate(admin.as_ref().map(|a| a.authorization)) {
        Gate::SignedOut => Err(GateRejection::RedirectToLogin),
        Gate::Restricted => Err(GateRejection::Restricted),
        Gate::Granted(auth) if auth.can(capability) => {
            admin.ok_or(GateRejection::RedirectToLogin)
        }
        Gate::Granted(_) => Err(GateRejection::Forbidden(capability)),
    }
}

/// Extractor that requires a signed-in account, with or without a role.
pub struct RequireSession(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_admin(parts)
            .await
            .map(Self)
            .ok_or(GateRejection::RedirectToLogin)
    }
}

macro_rules! capability_extractor {
    ($(#[$doc:meta])* $name:ident => $capability:expr) => {
        $(#[$doc])*
        pub struct $name(pub CurrentAdmin);

        impl<S> FromRequestParts<S> for $name
        where
            S: Send + Sync,
        {
            type Rejection = GateRejection;

            async fn from_request_parts(
                parts: &mut Parts,
                _state: &S,
            ) -> Result<Self, Self::Rejection> {
                gate(parts, $capability).await.map(Self)
            }
        }
    };
}

capability_extractor!(
    /// Any role: read-only pages.
    RequireView => Capability::View
);
capability_extractor!(
    /// Editor or admin: approve and reject submissions.
    RequireModerator => Capability::ModerateSubmissions
);
capability_extractor!(
    /// Editor or admin: edit, hide and show providers.
    RequireEditor => Capability::EditProviders
);
capability_extractor!(
    /// Admin only: create and delete providers, manage categories.
    RequireCatalogManager => Capability::ManageCatalog
);

/// Extractor that optionally gets the current account.
///
/// Used by the sign-in pages to send already signed-in visitors onward.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_admin(parts).await))
    }
}

/// Helper to store the signed-in account, rotating the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to end the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session.flush().await
}

/// Queue a notice for the next page render.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(session: &Session, flash: Flash) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
}

/// Take the pending notice, if any. A read failure counts as no notice.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn test_redirect_rejections() {
        let response = GateRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], LOGIN_PATH);

        let response = GateRejection::Restricted.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], RESTRICTED_PATH);
    }

    #[tokio::test]
    async fn test_forbidden_names_capability() {
        let response = GateRejection::Forbidden(Capability::ManageCatalog).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"You do not have permission to manage the catalog.");
    }
}
