//! `fpe-svc`: HTTP service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing, optional OTLP export).
//! 3. Initialise AWS SDK clients when any source lives in S3.
//! 4. Load the key and the field catalog; seed the [`EngineStore`].
//! 5. Spawn the catalog refresh task when a catalog source is configured.
//! 6. Build the Axum router and serve until Ctrl-C / SIGTERM.

mod aws;
mod blob;
mod config;
mod engine;
mod server;
mod telemetry;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use blob::BlobFetcher;
use config::Config;
use engine::{Engine, EngineStore};
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        rounds = cfg.feistel_rounds,
        strategy = %cfg.round_strategy,
        validate_format = cfg.validate_format,
        strict_mode = cfg.strict_mode,
        "fpe-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. AWS clients
    // -----------------------------------------------------------------------
    let aws = if cfg.uses_s3() {
        Some(aws::AwsClients::init(cfg.s3_endpoint_url.as_deref()).await)
    } else {
        None
    };
    let fetcher = BlobFetcher::new(aws);

    // -----------------------------------------------------------------------
    // 4. Key and catalog
    // -----------------------------------------------------------------------
    let key = engine::load_key(&fetcher, &cfg.key_source()?).await?;
    let catalog_source = cfg.catalog_source()?;
    let options = cfg.transform_options();

    let parsed = engine::load_catalog(&fetcher, catalog_source.as_ref()).await;
    let engines = EngineStore::with_engine(
        Engine::build(&key, options, parsed).context("failed to build transform engine")?,
    );

    // -----------------------------------------------------------------------
    // 5. Background tasks
    // -----------------------------------------------------------------------
    let _catalog_refresh = catalog_source.map(|source| {
        engine::refresh_task(
            fetcher.clone(),
            source,
            key.clone(),
            options,
            engines.clone(),
            Duration::from_secs(cfg.catalog_refresh_interval_secs),
        )
    });

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(engines));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("fpe-svc stopped");
    telemetry::shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
