//! Authentication route handlers for admin.
//!
//! Sign-in pages re-render themselves with a notice on failure. Every
//! successful sign-in rotates the session id and redirects to the dashboard,
//! where the gate decides between the portal and the restricted notice.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    OptionalAdmin, RequireSession, auth_rate_limiter, clear_current_admin, set_current_admin,
};
use crate::models::{CurrentAdmin, Flash};
use crate::services::AuthError;
use crate::services::auth::MIN_PASSWORD_LENGTH;
use crate::state::AppState;

/// Build the auth router. Only the POSTs that send email or check a
/// password are rate limited.
pub fn router() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/auth/login",
            get(login_page).merge(post(password_login).layer(limiter.clone())),
        )
        .route(
            "/auth/magic-link",
            post(request_magic_link).layer(limiter.clone()),
        )
        .route("/auth/magic/{token}", get(magic_link_callback))
        .route(
            "/auth/signup",
            get(signup_page).merge(post(signup).layer(limiter.clone())),
        )
        .route("/auth/signup/{token}", get(confirm_signup))
        .route(
            "/auth/reset",
            get(reset_request_page).merge(post(request_reset).layer(limiter)),
        )
        .route("/auth/reset/{token}", get(reset_page).post(reset_password))
        .route("/auth/logout", post(logout))
        .route("/restricted", get(restricted))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailForm {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewPasswordForm {
    pub password: String,
    pub password_confirm: String,
}

/// Sign-in page template (magic link and password forms).
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub notice: Option<Flash>,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub email: String,
    pub min_length: usize,
    pub notice: Option<Flash>,
}

/// "Forgot password" page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_request.html")]
pub struct ResetRequestTemplate {
    pub email: String,
    pub notice: Option<Flash>,
}

/// New password page template, reached from an emailed link.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset.html")]
pub struct ResetTemplate {
    pub token: String,
    /// False once the link is known to be unusable; the form is hidden.
    pub token_valid: bool,
    pub min_length: usize,
    pub notice: Option<Flash>,
}

/// Notice for signed-in accounts that have no role.
#[derive(Template, WebTemplate)]
#[template(path = "restricted.html")]
pub struct RestrictedTemplate {
    pub email: String,
}

/// Log an auth failure at the level it deserves and return the message to show.
fn failure_notice(err: &AuthError) -> Flash {
    if err.is_internal() {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Authentication error");
    } else {
        tracing::info!(error = %err, "Authentication refused");
    }
    Flash::error(err.user_message())
}

/// Store the account in the session and head for the dashboard.
async fn complete_sign_in(session: &Session, admin: &CurrentAdmin) -> Result<Response, AppError> {
    set_current_admin(session, admin).await?;
    set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Sign in
// =============================================================================

/// Render the sign-in page, or skip it when already signed in.
///
/// GET /auth/login
#[instrument(skip_all)]
pub async fn login_page(OptionalAdmin(admin): OptionalAdmin) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        email: String::new(),
        notice: None,
    }
    .into_response()
}

/// Sign in with email and password.
///
/// POST /auth/login
#[instrument(skip_all)]
pub async fn password_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    match state
        .auth()
        .sign_in_with_password(&form.email, &form.password)
        .await
    {
        Ok(admin) => complete_sign_in(&session, &admin).await,
        Err(err) => Ok(LoginTemplate {
            email: form.email,
            notice: Some(failure_notice(&err)),
        }
        .into_response()),
    }
}

/// Email a one-time sign-in link.
///
/// POST /auth/magic-link
#[instrument(skip_all)]
pub async fn request_magic_link(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> impl IntoResponse {
    match state.auth().request_magic_link(&form.email).await {
        Ok(()) => LoginTemplate {
            email: String::new(),
            notice: Some(Flash::success("Check your email for a magic link.")),
        },
        Err(err) => LoginTemplate {
            notice: Some(failure_notice(&err)),
            email: form.email,
        },
    }
}

/// Follow an emailed sign-in link.
///
/// GET /auth/magic/{token}
#[instrument(skip_all)]
pub async fn magic_link_callback(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    match state.auth().sign_in_with_magic_link(&token).await {
        Ok(admin) => complete_sign_in(&session, &admin).await,
        Err(err) => Ok(LoginTemplate {
            email: String::new(),
            notice: Some(failure_notice(&err)),
        }
        .into_response()),
    }
}

// =============================================================================
// Sign up
// =============================================================================

/// GET /auth/signup
#[instrument(skip_all)]
pub async fn signup_page(OptionalAdmin(admin): OptionalAdmin) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    SignupTemplate {
        email: String::new(),
        min_length: MIN_PASSWORD_LENGTH,
        notice: None,
    }
    .into_response()
}

/// Start a password sign-up. The account is created when the emailed
/// confirmation link is followed.
///
/// POST /auth/signup
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> impl IntoResponse {
    match state.auth().sign_up(&form.email, &form.password).await {
        Ok(()) => SignupTemplate {
            email: String::new(),
            min_length: MIN_PASSWORD_LENGTH,
            notice: Some(Flash::success(
                "Check your email to confirm your address and finish signing up.",
            )),
        },
        Err(err) => SignupTemplate {
            notice: Some(failure_notice(&err)),
            email: form.email,
            min_length: MIN_PASSWORD_LENGTH,
        },
    }
}

/// Follow an emailed sign-up confirmation link. New accounts have no role
/// until an admin grants one.
///
/// GET /auth/signup/{token}
#[instrument(skip_all)]
pub async fn confirm_signup(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    match state.auth().confirm_sign_up(&token).await {
        Ok(admin) => complete_sign_in(&session, &admin).await,
        Err(err) => Ok(LoginTemplate {
            email: String::new(),
            notice: Some(failure_notice(&err)),
        }
        .into_response()),
    }
}

// =============================================================================
// Password reset
// =============================================================================

/// GET /auth/reset
#[instrument(skip_all)]
pub async fn reset_request_page() -> impl IntoResponse {
    ResetRequestTemplate {
        email: String::new(),
        notice: None,
    }
}

/// Email a reset link. The response is the same whether or not the account
/// exists.
///
/// POST /auth/reset
#[instrument(skip_all)]
pub async fn request_reset(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> impl IntoResponse {
    match state.auth().request_password_reset(&form.email).await {
        Ok(()) => ResetRequestTemplate {
            email: String::new(),
            notice: Some(Flash::success(
                "If an account exists for that email, a reset link is on its way.",
            )),
        },
        Err(err) => ResetRequestTemplate {
            notice: Some(failure_notice(&err)),
            email: form.email,
        },
    }
}

/// GET /auth/reset/{token}
#[instrument(skip_all)]
pub async fn reset_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let (token_valid, notice) = match state.auth().reset_token_is_valid(&token).await {
        Ok(true) => (true, None),
        Ok(false) => (false, Some(failure_notice(&AuthError::InvalidToken))),
        Err(err) => (false, Some(failure_notice(&err))),
    };

    ResetTemplate {
        token,
        token_valid,
        min_length: MIN_PASSWORD_LENGTH,
        notice,
    }
}

/// Set the new password and sign in.
///
/// POST /auth/reset/{token}
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<NewPasswordForm>,
) -> Result<Response, AppError> {
    let render = |token: String, notice: Flash, token_valid: bool| {
        ResetTemplate {
            token,
            token_valid,
            min_length: MIN_PASSWORD_LENGTH,
            notice: Some(notice),
        }
        .into_response()
    };

    if form.password != form.password_confirm {
        return Ok(render(token, Flash::error("Passwords do not match."), true));
    }

    match state.auth().reset_password(&token, &form.password).await {
        Ok(admin) => complete_sign_in(&session, &admin).await,
        Err(err) => {
            let token_valid = !matches!(err, AuthError::InvalidToken);
            Ok(render(token, failure_notice(&err), token_valid))
        }
    }
}

// =============================================================================
// Sign out and restricted
// =============================================================================

/// Logout and clear session.
///
/// POST /auth/logout
#[instrument(skip_all)]
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();
    Redirect::to("/auth/login")
}

/// Shown to signed-in accounts without a role. They stay signed in so a role
/// granted later applies at their next sign-in.
///
/// GET /restricted
#[instrument(skip_all)]
pub async fn restricted(RequireSession(admin): RequireSession) -> Response {
    if admin.authorization.role().is_some() {
        return Redirect::to("/").into_response();
    }
    RestrictedTemplate {
        email: admin.email.to_string(),
    }
    .into_response()
}
