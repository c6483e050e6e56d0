//! Prometheus metrics exposition
//!
//! The harvest crates emit through the `metrics` facade:
//!
//! - `harvest_runs_total` (counter)
//! - `harvest_accounts_started_total` (counter)
//! - `harvest_register_attempts_total` (counter): label `promo_id`
//! - `harvest_register_attempts_per_code` (histogram): label `promo_id`
//! - `harvest_codes_redeemed_total` (counter): label `promo_id`
//! - `harvest_redeem_failures_total` (counter): label `reason`
//!
//! This module only installs the recorder.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Registration attempts before a session became ready. Polling is often
/// unbounded, so the upper buckets are wide.
pub const ATTEMPT_BUCKETS: &[f64] = &[
    1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 10000.0,
];

fn builder() -> Result<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("harvest_register_attempts_per_code".to_string()),
            ATTEMPT_BUCKETS,
        )
        .context("failed to set histogram buckets")
}

/// Install the global Prometheus recorder and return a handle for `/metrics`.
pub fn install_recorder() -> Result<PrometheusHandle> {
    builder()?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
