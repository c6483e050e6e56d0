//! Fan-out of one worker task per account
//!
//! `start_all` spawns a task per token and returns immediately. Tasks share
//! nothing mutable: each owns its token copy, the backend is a stateless
//! `Arc`, and the poll policy is `Copy`. An account stuck in event
//! registration occupies only its own task.

use std::sync::Arc;

use gamepromo::{AccountToken, Backend, TokenSource};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span};

use crate::registrar::PollPolicy;
use crate::worker::AccountWorker;

/// Starts harvest runs. Built once in `main` and shared by every trigger.
pub struct RunCoordinator {
    worker: AccountWorker,
    tokens: Arc<dyn TokenSource>,
}

impl RunCoordinator {
    pub fn new(backend: Arc<dyn Backend>, tokens: Arc<dyn TokenSource>, policy: PollPolicy) -> Self {
        info!(
            interval = ?policy.interval,
            max_attempts = policy.max_attempts.map(|n| n.get()),
            "run coordinator initialized"
        );
        Self {
            worker: AccountWorker::new(backend, policy),
            tokens,
        }
    }

    /// Load tokens from the token source and start a run.
    ///
    /// A token-source failure is logged and starts nothing; the next trigger
    /// tries again.
    pub fn trigger(&self) -> Vec<JoinHandle<()>> {
        match self.tokens.load() {
            Ok(tokens) => self.start_all(tokens),
            Err(e) => {
                error!(error = %e, "failed to load account tokens, skipping run");
                Vec::new()
            }
        }
    }

    /// Spawn one independent worker task per token without waiting.
    ///
    /// Dropping the returned handles detaches the tasks.
    pub fn start_all(&self, tokens: Vec<AccountToken>) -> Vec<JoinHandle<()>> {
        info!(accounts = tokens.len(), "================ harvest run started ================");
        metrics::counter!("harvest_runs_total").increment(1);
        metrics::counter!("harvest_accounts_started_total").increment(tokens.len() as u64);

        let handles = tokens
            .into_iter()
            .map(|token| {
                let worker = self.worker.clone();
                let span = info_span!("account", account = %token.hint());
                tokio::spawn(async move { worker.run(&token).await }.instrument(span))
            })
            .collect();

        info!("================ harvest run dispatched ================");
        handles
    }
}
