//! Orderline Server - stream-fed order lookup service.
//!
//! This binary wires the full pipeline:
//!
//! - `PostgreSQL` for durable order storage
//! - A stream broker consumer feeding the ingestion pipeline
//! - An in-memory order cache, warm-loaded from storage at startup
//! - Axum serving `GET /order/{id}` from the cache
//!
//! # Startup order
//!
//! Storage connectivity is fatal if absent; a failed warm-load is not (the
//! service starts with a cold cache). The ingestion pipeline runs as an
//! independent task beside the HTTP listener, and both shut down on
//! SIGINT/SIGTERM with a bounded grace period.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderline_server::cache::OrderCache;
use orderline_server::config::{ServerConfig, redact_database_url};
use orderline_server::db::{self, OrderStore, PgOrderStore};
use orderline_server::ingest::{IngestPipeline, RedisStream};
use orderline_server::routes;
use orderline_server::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "orderline_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Storage connectivity is fatal at startup: serving must not begin
    // against an unreachable database.
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    let store = PgOrderStore::new(pool);
    store.ping().await.expect("Database is not reachable");
    tracing::info!(
        database = %redact_database_url(&config.database_url),
        "Database pool created"
    );

    // Warm-load the cache; a failure here is logged and the service starts
    // cold rather than not at all.
    let cache = Arc::new(OrderCache::new());
    match store.get_all_orders().await {
        Ok(orders) => {
            let loaded = cache.bulk_load(orders);
            tracing::info!(orders = loaded, "Cache warm-loaded from database");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cache warm-load failed, starting cold");
        }
    }

    // Start the ingestion pipeline as an independent task
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stream = RedisStream::connect(&config.stream).expect("Invalid stream broker URL");
    tracing::info!(
        broker = %config.stream.broker_url,
        topic = %config.stream.topic,
        "Subscribing to order stream"
    );
    let ingest = tokio::spawn(
        IngestPipeline::new(store.clone(), Arc::clone(&cache), stream).run(shutdown_rx.clone()),
    );

    // Build application state and router
    let state = AppState::new(config.clone(), cache, store);
    let app = routes::routes()
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("orderline-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let server = tokio::spawn({
        let mut shutdown = shutdown_rx;
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.changed().await;
                })
                .await
        }
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    // In-flight requests get a bounded grace period, then remaining
    // connections are forcibly closed.
    let server_abort = server.abort_handle();
    match tokio::time::timeout(config.shutdown_grace, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("HTTP server stopped"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "HTTP server error"),
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task panicked"),
        Err(_) => {
            server_abort.abort();
            tracing::warn!("Grace period expired, closing remaining connections");
        }
    }

    let ingest_abort = ingest.abort_handle();
    if tokio::time::timeout(config.shutdown_grace, ingest)
        .await
        .is_err()
    {
        ingest_abort.abort();
        tracing::warn!("Ingestion pipeline did not stop in time, aborted");
    }

    tracing::info!("Service stopped");
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
