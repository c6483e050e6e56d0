//! Run bookkeeping and the optional status listener
//!
//! `RunStatus` is shared between the triggers and the `/health` handler.
//! Counters are plain atomics; timestamps sit behind a std mutex since no
//! lock is ever held across an await.

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use chrono::{DateTime, Local};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Upper bound on concurrent status requests.
pub const MAX_STATUS_CONNECTIONS: usize = 16;

/// Shared run counters. Cloning shares the same state.
#[derive(Clone)]
pub struct RunStatus {
    pub started_at: Instant,
    pub runs_triggered: Arc<AtomicU64>,
    pub accounts_started: Arc<AtomicU64>,
    last_run_at: Arc<Mutex<Option<DateTime<Local>>>>,
    next_run_at: Arc<Mutex<Option<DateTime<Local>>>>,
}

impl RunStatus {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            runs_triggered: Arc::new(AtomicU64::new(0)),
            accounts_started: Arc::new(AtomicU64::new(0)),
            last_run_at: Arc::new(Mutex::new(None)),
            next_run_at: Arc::new(Mutex::new(None)),
        }
    }

    /// Record a dispatched run that started `accounts` workers.
    pub fn record_run(&self, accounts: usize) {
        self.runs_triggered.fetch_add(1, Ordering::Relaxed);
        self.accounts_started
            .fetch_add(accounts as u64, Ordering::Relaxed);
        if let Ok(mut last) = self.last_run_at.lock() {
            *last = Some(Local::now());
        }
    }

    pub fn set_next_run(&self, at: DateTime<Local>) {
        if let Ok(mut next) = self.next_run_at.lock() {
            *next = Some(at);
        }
    }

    pub fn last_run(&self) -> Option<DateTime<Local>> {
        self.last_run_at.lock().ok().and_then(|g| *g)
    }

    pub fn next_run(&self) -> Option<DateTime<Local>> {
        self.next_run_at.lock().ok().and_then(|g| *g)
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// State for the status router
#[derive(Clone)]
pub struct StatusState {
    pub status: RunStatus,
    pub prometheus: PrometheusHandle,
}

pub fn build_router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            MAX_STATUS_CONNECTIONS,
        ))
        .with_state(state)
}

/// JSON summary of the harvester: uptime, run counts and schedule.
async fn health_handler(State(state): State<StatusState>) -> impl IntoResponse {
    let status = &state.status;
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": status.started_at.elapsed().as_secs(),
        "runs_triggered": status.runs_triggered.load(Ordering::Relaxed),
        "accounts_started": status.accounts_started.load(Ordering::Relaxed),
        "last_run_at": status.last_run().map(|t| t.to_rfc3339()),
        "next_run_at": status.next_run().map(|t| t.to_rfc3339()),
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus text exposition format.
async fn metrics_handler(State(state): State<StatusState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
