//! Router tests against the storefront in seed mode (no database).

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use appy_link_core::env::SentrySettings;
use appy_link_storefront::build_router;
use appy_link_storefront::config::StorefrontConfig;
use appy_link_storefront::middleware::create_session_layer;
use appy_link_storefront::state::AppState;

const FORM: &str = "application/x-www-form-urlencoded";
const CLIENT_IP: &str = "203.0.113.7";

fn seed_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("k3Jx9!pQ2@vL8#mN4$wR7^zT1&yB6*cD"),
        form_cooldown_secs: 30,
        sentry: SentrySettings::default(),
    }
}

fn app() -> Router {
    let config = seed_config();
    let layer = create_session_layer(MemoryStore::default(), &config);
    build_router(AppState::new(config, None), layer)
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

fn post(uri: &str, body: &str, cookie: Option<&str>, htmx: bool) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header(header::CONTENT_TYPE, FORM)
        .header("x-forwarded-for", CLIENT_IP);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if htmx {
        builder = builder.header("hx-request", "true");
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` of the session cookie set by `response`.
fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie should be set")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

#[tokio::test]
async fn test_health_is_ok_and_seed_mode_is_ready() {
    let app = app();

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let response = send(&app, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let response = send(&app(), get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_home_shows_hero_and_local_notice() {
    let body = body_text(send(&app(), get("/", None)).await).await;
    assert!(body.contains("Find the best suppliers for your moving business"));
    assert!(body.contains("Using local data (database not configured)"));
    assert!(body.contains("MoveMan"));
}

#[tokio::test]
async fn test_listing_renders_first_page_with_local_notice() {
    let response = send(&app(), get("/providers", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("<html"));
    assert!(body.contains("Using local data (database not configured)"));
    assert!(body.contains("Showing 12 of 13 results"));
    assert!(body.contains("Load More (1 remaining)"));
    assert!(!body.contains("Old Depot Supplies"));
}

#[tokio::test]
async fn test_htmx_listing_returns_results_fragment() {
    let request = Request::get("/providers?q=moveman")
        .header("hx-request", "true")
        .body(Body::empty())
        .unwrap();
    let body = body_text(send(&app(), request).await).await;

    assert!(!body.contains("<html"));
    assert!(body.contains("Showing 1 of 1 results"));
    assert!(body.contains("MoveMan"));
    assert!(!body.contains("Load More"));
}

#[tokio::test]
async fn test_listing_with_no_matches_says_so() {
    let body = body_text(send(&app(), get("/providers?q=zzzz-nothing", None)).await).await;
    assert!(body.contains("No results. Try different filters."));
    assert!(body.contains("Showing 0 of 0 results"));
}

#[tokio::test]
async fn test_profile_of_hidden_or_unknown_provider_is_not_found() {
    let app = app();

    let response = send(&app, get("/providers/1", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("MoveMan"));

    // Old Depot Supplies is inactive.
    let response = send(&app, get("/providers/14", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/providers/999", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_toggle_persists_in_session() {
    let app = app();

    let response = send(&app, post("/providers/1/favorite", "", None, true)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("hx-trigger").unwrap(),
        "selection-updated"
    );
    let cookie = session_cookie(&response);
    assert!(body_text(response).await.contains("Saved"));

    let body = body_text(send(&app, get("/favorites", Some(&cookie))).await).await;
    assert!(body.contains("MoveMan"));
    assert!(body.contains("Favorites (1)"));

    let counts = body_text(send(&app, get("/selection/counts", Some(&cookie))).await).await;
    assert!(counts.contains("Favorites (1)"));
    assert!(counts.contains("Compare (0/3)"));
}

#[tokio::test]
async fn test_toggle_without_htmx_redirects_back() {
    let response = send(
        &app(),
        post("/providers/2/favorite", "return_to=%2Ffavorites", None, false),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/favorites");
}

#[tokio::test]
async fn test_compare_refuses_a_fourth_provider() {
    let app = app();

    let response = send(&app, post("/providers/1/compare", "", None, true)).await;
    let cookie = session_cookie(&response);
    for id in [2, 3] {
        let uri = format!("/providers/{id}/compare");
        let response = send(&app, post(&uri, "", Some(&cookie), true)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, post("/providers/4/compare", "", Some(&cookie), true)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_text(response)
            .await
            .contains("You can compare up to 3 providers")
    );

    let body = body_text(send(&app, get("/compare", Some(&cookie))).await).await;
    assert!(body.contains("Compare (3/3)"));
    assert!(body.contains("MoveMan"));
    assert!(!body.contains("Removals Manager"));
}

#[tokio::test]
async fn test_toggling_unknown_provider_is_not_found() {
    let response = send(&app(), post("/providers/999/compare", "", None, true)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_compare_empties_the_tray() {
    let app = app();

    let response = send(&app, post("/providers/1/compare", "", None, true)).await;
    let cookie = session_cookie(&response);

    let response = send(&app, post("/compare/clear", "", Some(&cookie), false)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = body_text(send(&app, get("/compare", Some(&cookie))).await).await;
    assert!(body.contains("Nothing to compare yet"));
}

#[tokio::test]
async fn test_contact_form_shows_field_errors() {
    let body = body_text(
        send(
            &app(),
            post("/contact", "name=Ann&email=not-an-email&message=short", None, false),
        )
        .await,
    )
    .await;

    assert!(body.contains("Please fix the errors below."));
    assert!(body.contains("Please enter a valid email address"));
    // Values are kept for correction.
    assert!(body.contains("value=\"Ann\""));
}

#[tokio::test]
async fn test_contact_form_queues_draft_then_throttles() {
    let app = app();
    let form = "name=Ann+Mover&email=ann%40movers.example&message=Do+you+list+crate+hire+firms%3F";

    let response = send(&app, post("/contact", form, None, false)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(body_text(response).await.contains("saved as a draft on this device"));

    let body = body_text(send(&app, post("/contact", form, Some(&cookie), false)).await).await;
    assert!(body.contains("Please wait"));
    assert!(!body.contains("saved as a draft"));
}

#[tokio::test]
async fn test_honeypot_submission_is_dropped_silently() {
    let form = "company_name=Spam+Ltd&category=software&description=Buy+cheap+things+now\
                &company_website=http%3A%2F%2Fspam.example";
    let body = body_text(send(&app(), post("/submit", form, None, false)).await).await;

    assert!(!body.contains("notice--success"));
    assert!(!body.contains("notice--error"));
    assert!(!body.contains("field-error"));
}

#[tokio::test]
async fn test_submission_with_unknown_category_is_rejected() {
    let form = "company_name=Crate+Co&category=nope&description=Plastic+crate+rental+for+office+moves";
    let body = body_text(send(&app(), post("/submit", form, None, false)).await).await;

    assert!(body.contains("Please choose a category from the list"));
    assert!(body.contains("value=\"Crate Co\""));
}

#[tokio::test]
async fn test_valid_submission_is_queued_in_seed_mode() {
    let form = "company_name=Crate+Co&category=equipment&website=https%3A%2F%2Fcrate.example\
                &description=Plastic+crate+rental+for+office+moves&discount=";
    let body = body_text(send(&app(), post("/submit", form, None, false)).await).await;

    assert!(body.contains("Your listing has been saved as a draft on this device."));
    assert!(!body.contains("value=\"Crate Co\""));
}
