//! Client login and code issuance
//!
//! Both are single calls with no retry. A `None` tells the worker to abandon
//! the current repetition.

use gamepromo::{Backend, SessionToken};
use tracing::{debug, warn};
use uuid::Uuid;

/// Register a synthetic client for `promo_id` and obtain its session token.
pub async fn login(backend: &dyn Backend, promo_id: &str) -> Option<SessionToken> {
    let client_id = Uuid::new_v4();
    match backend.login_client(promo_id, client_id).await {
        Ok(session) => {
            debug!(promo_id, %client_id, "client logged in");
            Some(session)
        }
        Err(e) => {
            warn!(promo_id, error = %e, kind = e.kind(), "failed to log in client");
            None
        }
    }
}

/// Exchange a ready session for a promo code.
pub async fn issue(backend: &dyn Backend, session: &SessionToken, promo_id: &str) -> Option<String> {
    match backend.create_code(session, promo_id).await {
        Ok(code) => {
            debug!(promo_id, "promo code issued");
            Some(code)
        }
        Err(e) => {
            warn!(promo_id, error = %e, kind = e.kind(), "failed to create code");
            None
        }
    }
}
