//! Promo Harvester
//!
//! Single-binary service that:
//! 1. Loads account tokens from the environment or a tokens file
//! 2. Starts a harvest run at startup and again every day at a fixed local time
//! 3. Collects and redeems every promo code each account is still owed
//! 4. Optionally serves /health and /metrics

mod config;
mod metrics;
mod schedule;
mod status;

use anyhow::{Context, Result};
use gamepromo::{Backend, HttpBackend};
use harvest::RunCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::status::{RunStatus, StatusState};

/// How long the status listener may take to drain after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, filtered by LOG_LEVEL / RUST_LOG
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting promo-harvester");

    let prometheus_handle = metrics::install_recorder()?;

    let args: Vec<String> = std::env::args().collect();
    let config_path = Config::resolve_path(cli_config_path(&args));
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let daily = config.schedule.daily_schedule()?;

    info!(
        metadata_url = %config.endpoints.metadata_url,
        promo_url = %config.endpoints.promo_url,
        tokens_from_env = config.env_tokens.is_some(),
        daily_at = %daily.time(),
        run_on_start = config.schedule.run_on_start,
        "configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("failed to build HTTP client")?;
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(client, config.endpoints()));
    let coordinator = Arc::new(RunCoordinator::new(
        backend,
        config.token_source(),
        config.poll_policy(),
    ));

    let run_status = RunStatus::new();

    if config.schedule.run_on_start {
        let handles = coordinator.trigger();
        run_status.record_run(handles.len());
    }

    let trigger = schedule::spawn_daily_trigger(coordinator.clone(), daily, run_status.clone());

    let server = match config.status.listen_addr {
        Some(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind status listener to {addr}"))?;
            let app = status::build_router(StatusState {
                status: run_status.clone(),
                prometheus: prometheus_handle,
            });
            info!(addr = %addr, "status listener ready");

            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
            let handle = tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
            });
            Some((shutdown_tx, handle))
        }
        None => None,
    };

    shutdown_signal().await;

    // In-flight account workers are dropped with the runtime.
    trigger.abort();

    if let Some((shutdown_tx, handle)) = server {
        let _ = shutdown_tx.send(());
        match tokio::time::timeout(DRAIN_TIMEOUT, handle).await {
            Ok(Ok(Ok(()))) => info!("status listener stopped"),
            Ok(Ok(Err(e))) => error!(error = %e, "status listener error during shutdown"),
            Ok(Err(e)) => error!(error = %e, "status listener task panicked"),
            Err(_) => warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "status listener drain timed out"
            ),
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Value following `--config`, if any.
fn cli_config_path(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
