//! Per-account harvest workflow
//!
//! For every promotion with remaining entitlement, and for every remaining
//! code, the worker runs one acquisition cycle:
//!
//! 1. `login` a synthetic client for the promotion
//! 2. `acquire_code` until the session is ready
//! 3. `issue` a promo code
//! 4. `redeem` it against the account
//!
//! Cycles run strictly one after another. A failed step abandons only the
//! current cycle; the next one starts from a fresh login.

use std::sync::Arc;

use gamepromo::{AccountToken, Backend};
use tracing::{debug, info};

use crate::entitlement::fetch_entitlements;
use crate::redeem::redeem;
use crate::registrar::{Acquisition, PollPolicy, acquire_code};
use crate::session::{issue, login};

/// Runs the full workflow for one account at a time. Cheap to clone.
#[derive(Clone)]
pub struct AccountWorker {
    backend: Arc<dyn Backend>,
    policy: PollPolicy,
}

impl AccountWorker {
    pub fn new(backend: Arc<dyn Backend>, policy: PollPolicy) -> Self {
        Self { backend, policy }
    }

    /// Collect every code still claimable today for `account`.
    pub async fn run(&self, account: &AccountToken) {
        let entitlements = fetch_entitlements(self.backend.as_ref(), account).await;

        let mut applied = 0u32;
        let mut attempted = 0u32;
        for entitlement in &entitlements {
            for repetition in 1..=entitlement.remaining {
                attempted += 1;
                if self
                    .collect_one(account, &entitlement.promo_id, repetition)
                    .await
                {
                    applied += 1;
                }
            }
        }

        info!(attempted, applied, "account run finished");
    }

    /// One login → register → issue → redeem cycle. True when a code was applied.
    async fn collect_one(&self, account: &AccountToken, promo_id: &str, repetition: u32) -> bool {
        let backend = self.backend.as_ref();
        debug!(promo_id, repetition, "starting acquisition cycle");

        let Some(session) = login(backend, promo_id).await else {
            return false;
        };

        match acquire_code(backend, &session, promo_id, &self.policy).await {
            Acquisition::Ready { .. } => {}
            Acquisition::GaveUp { .. } => return false,
        }

        let code = issue(backend, &session, promo_id).await;
        redeem(backend, account, promo_id, code.as_deref().unwrap_or_default())
            .await
            .is_applied()
    }
}
