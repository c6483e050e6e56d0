//! Event registration loop
//!
//! A freshly logged-in session cannot create a code until the promotion
//! service has seen enough simulated progress. The registrar reports progress
//! events until the service answers `hasCode: true`.
//!
//! States: Polling (initial) → Ready (terminal). Every attempt carries a new
//! random event id, so the server never sees a resubmission of the same event.
//! A `false` answer and any failure both keep the loop in Polling.
//!
//! Pacing is explicit in `PollPolicy`. The default reproduces the official
//! client's behavior: no delay and no attempt limit, so a session the server
//! never marks ready keeps its task polling forever. That task is the only one
//! affected; other accounts run in their own tasks.

use std::num::NonZeroU64;
use std::time::Duration;

use gamepromo::{Backend, SessionToken};
use tracing::{info, warn};
use uuid::Uuid;

/// Attempts between progress log lines.
pub const PROGRESS_LOG_EVERY: u64 = 100;

/// Pacing and bound of the registration loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between attempts. Zero only yields to the scheduler.
    pub interval: Duration,
    /// `None` polls until ready.
    pub max_attempts: Option<NonZeroU64>,
}

impl PollPolicy {
    /// No delay, no limit.
    pub const UNBOUNDED: PollPolicy = PollPolicy {
        interval: Duration::ZERO,
        max_attempts: None,
    };

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none()
    }

    fn exhausted(&self, attempts: u64) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.get())
    }
}

/// How a registration loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The server reported a code is obtainable.
    Ready { attempts: u64 },
    /// `max_attempts` reached without a code.
    GaveUp { attempts: u64 },
}

/// Report progress events under `session` until a code is obtainable.
pub async fn acquire_code(
    backend: &dyn Backend,
    session: &SessionToken,
    promo_id: &str,
    policy: &PollPolicy,
) -> Acquisition {
    let attempts_total =
        metrics::counter!("harvest_register_attempts_total", "promo_id" => promo_id.to_string());
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;
        attempts_total.increment(1);

        match backend
            .register_event(session, promo_id, Uuid::new_v4())
            .await
        {
            Ok(true) => {
                info!(promo_id, attempts, "event registration granted a code");
                metrics::histogram!("harvest_register_attempts_per_code", "promo_id" => promo_id.to_string())
                    .record(attempts as f64);
                return Acquisition::Ready { attempts };
            }
            Ok(false) => {}
            Err(e) => {
                warn!(promo_id, attempts, error = %e, kind = e.kind(), "failed to register event");
            }
        }

        if attempts % PROGRESS_LOG_EVERY == 0 {
            info!(promo_id, attempts, "still registering events");
        }

        if policy.exhausted(attempts) {
            warn!(promo_id, attempts, "giving up on event registration");
            return Acquisition::GaveUp { attempts };
        }

        pause(policy.interval).await;
    }
}

async fn pause(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}
