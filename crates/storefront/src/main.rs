//! Appy Link Storefront - Public supplier directory.
//!
//! This binary serves the public-facing directory on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for filtering and selection toggles
//! - Askama templates for server-side rendering
//! - `PostgreSQL` for providers, categories and incoming forms
//! - Seed mode when no database URL is configured: the built-in directory is
//!   served and form submissions are kept as drafts in the visitor's session
//!
//! # Security
//!
//! This binary only reads the public directory and inserts submissions and
//! contact messages. Moderation and catalog edits live in the admin binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

use appy_link_storefront::config::StorefrontConfig;
use appy_link_storefront::middleware::create_session_layer;
use appy_link_storefront::state::AppState;
use appy_link_storefront::{build_router, db};
use axum::Router;
use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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

/// Install the log subscriber: JSON on Fly.io, human-readable text locally,
/// with warnings and errors forwarded to Sentry.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "appy_link_storefront=info,tower_http=debug".into());

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
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry before the subscriber so its tracing layer has a client
    let _sentry_guard = init_sentry(&config);

    init_tracing();

    // The pool connects lazily so a database outage degrades to seed data
    // instead of blocking startup.
    let pool = config.database_url.as_ref().map(|url| {
        db::create_pool(url).expect("Invalid database URL")
    });

    let state = AppState::new(config.clone(), pool.clone());

    let app: Router = if let Some(pool) = pool {
        tracing::info!("Database pool created");
        let store = PostgresStore::new(pool);
        build_router(state, create_session_layer(store, &config))
    } else {
        tracing::warn!("No database configured, serving built-in directory (seed mode)");
        build_router(state, create_session_layer(MemoryStore::default(), &config))
    };

    let app = app
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

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
