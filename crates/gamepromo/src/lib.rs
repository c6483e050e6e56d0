//! Client library for the game's promo backends
//!
//! Two services are involved in collecting a reward code:
//! - the game's metadata service (`get-promos`, `apply-promo`), authenticated
//!   with the account's long-lived bearer token
//! - the cross-game promotion service (`login-client`, `register-event`,
//!   `create-code`), authenticated with a short-lived session token
//!
//! The `Backend` trait is the seam the harvest workflow talks to. `HttpBackend`
//! is the production implementation; tests substitute scripted backends.
//!
//! Every call reports failures through `Error`, which mirrors the three ways a
//! call can come back without a usable result: transport, parse, empty field.

pub mod constants;
pub mod credentials;
pub mod error;
pub mod http;
pub mod token_source;
pub mod wire;

pub use constants::*;
pub use credentials::{AccountToken, SessionToken};
pub use error::{Error, Result};
pub use http::{Endpoints, HttpBackend};
pub use token_source::{FileTokenSource, StaticTokenSource, TokenSource};
pub use wire::{DailyState, InterludeUser, Promo, PromosResponse};

use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

/// Boxed future returned by `Backend` methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The five backend calls a harvest cycle needs.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn Backend>`).
/// Random identifiers (client id, event id) are generated by the caller and
/// passed in, so implementations stay deterministic.
pub trait Backend: Send + Sync {
    /// Promotions and today's per-promotion counters for an account.
    fn get_promos<'a>(&'a self, account: &'a AccountToken) -> BackendFuture<'a, PromosResponse>;

    /// Redeem `code` for `account`. Fails with `Error::Empty` when the response
    /// carries no `interludeUser`.
    fn apply_promo<'a>(
        &'a self,
        account: &'a AccountToken,
        code: &'a str,
    ) -> BackendFuture<'a, InterludeUser>;

    /// Register a synthetic client for `promo_id` and return its session token.
    fn login_client<'a>(
        &'a self,
        promo_id: &'a str,
        client_id: Uuid,
    ) -> BackendFuture<'a, SessionToken>;

    /// Report one progress event; resolves to the server's `hasCode` flag.
    fn register_event<'a>(
        &'a self,
        session: &'a SessionToken,
        promo_id: &'a str,
        event_id: Uuid,
    ) -> BackendFuture<'a, bool>;

    /// Exchange a ready session for a one-time promo code (never blank).
    fn create_code<'a>(
        &'a self,
        session: &'a SessionToken,
        promo_id: &'a str,
    ) -> BackendFuture<'a, String>;
}
