//! Promo code redemption against the account

use gamepromo::{AccountToken, Backend, Error};
use tracing::{error, info};

/// Result of one redemption.
#[derive(Debug, Clone, PartialEq)]
pub enum Redemption {
    /// Code accepted. The backend may omit the balance.
    Applied { balance_diamonds: Option<f64> },
    /// No code to redeem; nothing was sent.
    NoCode,
    /// The backend rejected the code or answered without account data.
    Failed(Error),
}

impl Redemption {
    pub fn is_applied(&self) -> bool {
        matches!(self, Redemption::Applied { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Redemption::Applied { .. } => "applied",
            Redemption::NoCode => "no_code",
            Redemption::Failed(e) => e.kind(),
        }
    }
}

/// Redeem `code` for `account`. Blank codes short-circuit without a request.
pub async fn redeem(
    backend: &dyn Backend,
    account: &AccountToken,
    promo_id: &str,
    code: &str,
) -> Redemption {
    let outcome = if code.trim().is_empty() {
        error!(promo_id, "promo code does not exist, skipping redemption");
        Redemption::NoCode
    } else {
        match backend.apply_promo(account, code).await {
            Ok(user) => {
                match user.balance_diamonds {
                    Some(balance) => info!(promo_id, balance_diamonds = balance, "applied promo code"),
                    None => info!(promo_id, "applied promo code, balance not reported"),
                }
                Redemption::Applied {
                    balance_diamonds: user.balance_diamonds,
                }
            }
            Err(e) => {
                error!(promo_id, error = %e, kind = e.kind(), "failed to apply promo code");
                Redemption::Failed(e)
            }
        }
    };

    if outcome.is_applied() {
        metrics::counter!("harvest_codes_redeemed_total", "promo_id" => promo_id.to_string())
            .increment(1);
    } else {
        metrics::counter!("harvest_redeem_failures_total", "reason" => outcome.label())
            .increment(1);
    }
    outcome
}
