//! Horologe API - REST backend for the watch store.
//!
//! Serves on port 5000 by default.
//!
//! # Storage
//!
//! With `HOROLOGE_DATABASE_URL` set, data lives in `PostgreSQL` and pending
//! migrations are applied at startup. Without it the server runs on an
//! in-memory store that is lost on exit.

#![cfg_attr(not(test), forbid(unsafe_code))]

use horologe_api::config::{ApiConfig, LogFormat};
use horologe_api::db::{self, Repositories};
use horologe_api::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
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

fn init_tracing(config: &ApiConfig) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "horologe_api=info,tower_http=debug".into());

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

async fn connect(config: &ApiConfig) -> Repositories {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("HOROLOGE_DATABASE_URL is not set; using the in-memory store");
        return Repositories::in_memory();
    };

    let pool = db::create_pool(database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied");

    Repositories::postgres(pool)
}

/// How often expired bearer tokens are deleted.
const TOKEN_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// Spawn a background task that deletes expired bearer tokens.
fn spawn_token_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TOKEN_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            match state.auth().purge_expired_tokens().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired tokens removed"),
                Err(e) => tracing::warn!(error = %e, "token sweep failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let repos = connect(&config).await;
    let addr = config.socket_addr();
    let state = AppState::new(config, repos);
    spawn_token_sweeper(state.clone());

    let app = horologe_api::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    tracing::info!("api listening on {}", addr);

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
