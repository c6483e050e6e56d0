//! Remaining daily entitlement per promotion
//!
//! The metadata service lists the promotions and, separately, how many codes
//! the account already received today for each. Every promotion caps at
//! `DAILY_KEY_CAP` codes per day regardless of its advertised `keysPerDay`.
//! A promotion with no state entry is not claimable.

use std::collections::HashMap;

use gamepromo::{AccountToken, Backend, DAILY_KEY_CAP, Error, PromosResponse};
use tracing::{debug, info, warn};

/// Codes still claimable today for one promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    pub promo_id: String,
    /// Always in `1..=DAILY_KEY_CAP`.
    pub remaining: u32,
}

/// Derive entitlements from a `get-promos` body, in promotion order.
///
/// Missing or empty lists yield nothing. Two open states for the same
/// promotion make the body ambiguous and are rejected as malformed.
pub fn compute_entitlements(response: &PromosResponse) -> Result<Vec<Entitlement>, Error> {
    let (promos, states) = match (&response.promos, &response.states) {
        (Some(promos), Some(states)) if !promos.is_empty() && !states.is_empty() => {
            (promos, states)
        }
        _ => {
            debug!("promo or state list missing or empty");
            return Ok(Vec::new());
        }
    };

    let mut open: HashMap<&str, u32> = HashMap::new();
    for state in states
        .iter()
        .filter(|s| s.receive_keys_today < DAILY_KEY_CAP)
    {
        if open
            .insert(state.promo_id.as_str(), state.receive_keys_today)
            .is_some()
        {
            return Err(Error::Parse(format!(
                "duplicate state for promo {}",
                state.promo_id
            )));
        }
    }

    Ok(promos
        .iter()
        .filter_map(|promo| {
            open.get(promo.promo_id.as_str())
                .map(|received| Entitlement {
                    promo_id: promo.promo_id.clone(),
                    remaining: DAILY_KEY_CAP - received,
                })
        })
        .collect())
}

/// Ask the metadata service what is left to claim today for `account`.
///
/// Never fails: transport, parse and shape problems are logged and yield an
/// empty list for this account only.
pub async fn fetch_entitlements(backend: &dyn Backend, account: &AccountToken) -> Vec<Entitlement> {
    let entitlements = match backend.get_promos(account).await {
        Ok(response) => compute_entitlements(&response),
        Err(e) => Err(e),
    };

    match entitlements {
        Ok(entitlements) if entitlements.is_empty() => {
            info!("already received all available promo codes, waiting for the next day");
            entitlements
        }
        Ok(entitlements) => {
            let total: u32 = entitlements.iter().map(|e| e.remaining).sum();
            info!(
                promos = entitlements.len(),
                codes = total,
                "promo codes available today"
            );
            entitlements
        }
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "failed to get promos");
            Vec::new()
        }
    }
}
