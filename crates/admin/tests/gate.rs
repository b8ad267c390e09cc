//! Router tests for the admin gate.
//!
//! The pool connects lazily and these requests never reach the database:
//! every protected request here is turned away by its extractor first.
//! Sessions are seeded through a test-only route sharing the same store.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Request, Response, StatusCode, header};
use axum::routing::post;
use axum::Router;
use http_body_util::BodyExt;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use appy_link_admin::build_router;
use appy_link_admin::config::AdminConfig;
use appy_link_admin::middleware::{create_session_layer, set_current_admin};
use appy_link_admin::models::CurrentAdmin;
use appy_link_admin::state::AppState;
use appy_link_core::access::Authorization;
use appy_link_core::env::SentrySettings;
use appy_link_core::{AccountId, AdminRole, Email};

const FORM: &str = "application/x-www-form-urlencoded";
const CLIENT_IP: &str = "198.51.100.23";

fn config() -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://appy@localhost/appy_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        session_secret: SecretString::from("k3Jx9!pQ2@vL8#mN4$wR7^zT1&yB6*cD"),
        bootstrap_admin_email: None,
        email: None,
        sentry: SentrySettings::default(),
    }
}

/// Store the given role (`none` for no role) in the caller's session.
async fn sign_in_as(session: Session, Path(role): Path<String>) -> StatusCode {
    let role = match role.as_str() {
        "none" => None,
        other => Some(other.parse::<AdminRole>().unwrap()),
    };
    let admin = CurrentAdmin {
        id: AccountId::new(1),
        email: Email::parse("tester@appylink.co.uk").unwrap(),
        authorization: Authorization::for_role(role),
    };
    set_current_admin(&session, &admin).await.unwrap();
    StatusCode::NO_CONTENT
}

fn app() -> Router {
    let config = config();
    let store = MemoryStore::default();
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://appy@localhost/appy_test")
        .unwrap();

    let test_routes = Router::new()
        .route("/test/sign-in/{role}", post(sign_in_as))
        .layer(create_session_layer(store.clone(), &config));

    let state = AppState::new(config.clone(), pool).unwrap();
    build_router(state, create_session_layer(store, &config)).merge(test_routes)
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header(header::CONTENT_TYPE, FORM)
        .header("x-forwarded-for", CLIENT_IP);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Sign in with `role` and return the `name=value` session cookie.
async fn session_for(app: &Router, role: &str) -> String {
    let response = send(app, post_form(&format!("/test/sign-in/{role}"), "", None)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

#[tokio::test]
async fn test_health() {
    let response = send(&app(), get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_signed_out_requests_go_to_login() {
    let app = app();
    for uri in ["/", "/submissions", "/providers", "/categories", "/messages", "/restricted"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/auth/login", "{uri}");
    }

    let response = send(&app, post_form("/submissions/1/approve", "status=new", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_login_page_renders_both_sign_in_forms() {
    let response = send(&app(), get("/auth/login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap()
            .contains("script-src 'none'")
    );
    assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");

    let html = body_text(response).await;
    assert!(html.contains(r#"action="/auth/magic-link""#));
    assert!(html.contains(r#"action="/auth/login""#));
    assert!(html.contains(r#"href="/auth/reset""#));
}

#[tokio::test]
async fn test_signup_and_reset_pages_render() {
    let app = app();
    let html = body_text(send(&app, get("/auth/signup", None)).await).await;
    assert!(html.contains("At least 8 characters."));

    let html = body_text(send(&app, get("/auth/reset", None)).await).await;
    assert!(html.contains("Email me a reset link"));
}

#[tokio::test]
async fn test_account_without_role_is_restricted_not_signed_out() {
    let app = app();
    let cookie = session_for(&app, "none").await;

    let response = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/restricted");

    let response = send(&app, get("/restricted", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("tester@appylink.co.uk"));
    assert!(html.contains("has not been given access"));
}

#[tokio::test]
async fn test_signed_in_visitor_skips_login_page() {
    let app = app();
    let cookie = session_for(&app, "viewer").await;
    let response = send(&app, get("/auth/login", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_viewer_cannot_write() {
    let app = app();
    let cookie = session_for(&app, "viewer").await;

    let response = send(&app, post_form("/submissions/1/approve", "status=new", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_text(response).await,
        "You do not have permission to moderate submissions."
    );

    let response = send(&app, post_form("/providers/1/hide", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, get("/providers/new", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_editor_cannot_manage_catalog() {
    let app = app();
    let cookie = session_for(&app, "editor").await;

    for uri in ["/providers/new", "/providers/1/delete", "/categories/software/edit"] {
        let response = send(&app, get(uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    let response = send(&app, post_form("/categories/software/delete", "confirm=yes", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_text(response).await,
        "You do not have permission to manage the catalog."
    );
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = app();
    let cookie = session_for(&app, "none").await;

    let response = send(&app, post_form("/auth/logout", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let response = send(&app, get("/restricted", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}
