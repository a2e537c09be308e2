#![allow(missing_docs)]

use brewhouse_server::api;
use brewhouse_server::auth::{KeyStore, Verifier};
use brewhouse_server::db::DrinkStore;
use brewhouse_server::metrics::{init_metrics, metrics_handler, metrics_middleware, MetricsState};
use brewhouse_server::state::AppState;

use axum::{middleware, routing::get, Router};
use brewhouse_config::{BrewhouseConfig, LogFormat};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Brewhouse - drinks menu API with bearer-token permissions.
#[derive(Parser)]
#[command(name = "brewhouse-server")]
#[command(about = "Drinks menu API server")]
struct Args {
    /// Path to configuration file
    #[arg(short = 'c', long = "config", env = "BREWHOUSE_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => brewhouse_config::load_from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: Failed to load config from {path}: {e}");
            std::process::exit(1);
        }),
        None => brewhouse_config::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {e}, using defaults");
            BrewhouseConfig::default()
        }),
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: Invalid configuration: {e}");
        std::process::exit(1);
    }

    init_logging(&config);

    let store = DrinkStore::connect(&config.database.dsn).await?;
    if config.database.resets_on_start() {
        tracing::warn!(dsn = %config.database.dsn, "Resetting drinks table");
        store.reset().await?;
    } else {
        store.migrate().await?;
    }

    let verifier = build_verifier(&config).await?;
    let state = Arc::new(AppState::new(store, verifier));

    let mut app = api::create_router(state, &config.server.cors_origins);

    if config.server.metrics.enabled {
        let handle = init_metrics()?;
        let metrics_routes = Router::new()
            .route(&config.server.metrics.path, get(metrics_handler))
            .with_state(handle);
        app = app
            .merge(metrics_routes)
            .layer(middleware::from_fn_with_state(
                MetricsState::new(&config.server.metrics.path),
                metrics_middleware,
            ));
        tracing::info!(path = %config.server.metrics.path, "Metrics endpoint enabled");
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Brewhouse listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Build the verifier and try to warm the key set. A failed fetch is not
/// fatal; the next lookup retries.
async fn build_verifier(
    config: &BrewhouseConfig,
) -> Result<Arc<Verifier>, Box<dyn std::error::Error>> {
    let auth = &config.auth;
    let jwks_url = auth.resolved_jwks_url().unwrap_or_default();
    let issuer = auth.resolved_issuer().unwrap_or_default();

    let keys = Arc::new(KeyStore::remote(
        jwks_url.clone(),
        auth.jwks_refresh_secs.map(Duration::from_secs),
    )?);

    match keys.refresh().await {
        Ok(count) => tracing::debug!(keys = count, "Signing keys warmed"),
        Err(e) => tracing::warn!(url = %jwks_url, error = %e, "Initial key fetch failed"),
    }

    tracing::info!(issuer = %issuer, audience = %auth.audience, "Token verification configured");
    Ok(Arc::new(
        Verifier::new(keys, issuer, auth.audience.clone()).with_leeway(auth.leeway_secs),
    ))
}

fn init_logging(config: &BrewhouseConfig) {
    let filter = if config.logging.filter.is_empty() {
        config.logging.level.as_str().to_string()
    } else {
        config.logging.filter.clone()
    };

    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));
    match config.logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
