//! Appy Link Admin - Moderation and catalog portal.
//!
//! This binary serves the admin portal on port 3001.
//!
//! # Architecture
//!
//! - Axum web framework with plain HTML forms (no scripts)
//! - Askama templates for server-side rendering
//! - `PostgreSQL` for the directory, accounts and sessions
//! - SMTP (lettre) for magic links and password resets
//!
//! # Security
//!
//! Sign-in is by emailed magic link or Argon2id password. What an account
//! may do depends on its role; accounts without one see a restricted notice.

#![cfg_attr(not(test), forbid(unsafe_code))]

use appy_link_admin::config::AdminConfig;
use appy_link_admin::middleware::create_session_layer;
use appy_link_admin::state::AppState;
use appy_link_admin::{build_router, db};
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let settings = &config.sentry;
    let dsn = settings.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: settings.environment.clone().map(std::borrow::Cow::Owned),
            sample_rate: settings.sample_rate,
            traces_sample_rate: settings.traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: true, // Admin events identify the signed-in account
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Sign-in still works without these settings, but with fewer paths in.
fn warn_on_degraded_sign_in(config: &AdminConfig) {
    if config.bootstrap_admin_email.is_none() {
        tracing::warn!("ADMIN_BOOTSTRAP_EMAIL not set; only accounts with a stored role can sign in");
    }
    if config.email.is_none() {
        tracing::warn!("SMTP not configured; magic links and reset links are written to the log instead of emailed");
    }
}

/// Install the log subscriber: JSON on Fly.io, human-readable text locally,
/// with warnings and errors forwarded to Sentry.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "appy_link_admin=info,tower_http=debug".into());

    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = AdminConfig::from_env().expect("Failed to load configuration");

    // Sentry before the subscriber so its tracing layer has a client
    let _sentry_guard = init_sentry(&config);

    init_tracing();

    warn_on_degraded_sign_in(&config);

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database pool created");
    tracing::info!("Migrations are applied by `appy-cli migrate`, not at startup");

    let session_layer = create_session_layer(PostgresStore::new(pool.clone()), &config);
    let state = AppState::new(config.clone(), pool).expect("Invalid SMTP configuration");

    let app = build_router(state, session_layer)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("admin listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
