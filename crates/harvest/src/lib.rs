//! Daily promo code harvesting for game accounts
//!
//! Drives the promo backends on behalf of each account until the day's codes
//! are collected. Works against any `gamepromo::Backend`.
//!
//! Run flow:
//! 1. A trigger calls `RunCoordinator::trigger` (at startup and once a day)
//! 2. The coordinator loads account tokens and spawns one task per account
//! 3. Each `AccountWorker` fetches its entitlements from `get-promos`
//! 4. Per remaining code: `login` → `acquire_code` → `issue` → `redeem`
//! 5. Outcomes are logged and counted; nothing is persisted

pub mod coordinator;
pub mod entitlement;
pub mod redeem;
pub mod registrar;
pub mod session;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use coordinator::RunCoordinator;
pub use entitlement::{Entitlement, compute_entitlements, fetch_entitlements};
pub use redeem::{Redemption, redeem};
pub use registrar::{Acquisition, PROGRESS_LOG_EVERY, PollPolicy, acquire_code};
pub use session::{issue, login};
pub use worker::AccountWorker;
