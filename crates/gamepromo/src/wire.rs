//! JSON request and response bodies
//!
//! Field names follow the backends' camelCase. Response fields the backends
//! may omit are `Option` so a missing value surfaces as `Error::Empty` rather
//! than a parse failure.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A daily reward campaign as listed by `get-promos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Promo {
    pub promo_id: String,
    #[serde(default)]
    pub keys_per_day: u32,
}

/// Per-account, per-promotion counter. The backend resets it at day boundary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyState {
    pub promo_id: String,
    pub receive_keys_today: u32,
}

/// Body of `get-promos`. Either list may be absent or null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PromosResponse {
    #[serde(default)]
    pub promos: Option<Vec<Promo>>,
    #[serde(default)]
    pub states: Option<Vec<DailyState>>,
}

/// Account snapshot returned by `apply-promo`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterludeUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub balance_diamonds: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyPromoResponse {
    #[serde(default)]
    pub interlude_user: Option<InterludeUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginClientResponse {
    #[serde(default)]
    pub client_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterEventResponse {
    #[serde(default)]
    pub has_code: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCodeResponse {
    #[serde(default)]
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyPromoRequest<'a> {
    pub promo_code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginClientRequest<'a> {
    pub app_token: &'a str,
    pub client_id: Uuid,
    pub client_origin: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterEventRequest<'a> {
    pub event_id: Uuid,
    pub event_origin: &'static str,
    pub promo_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCodeRequest<'a> {
    pub promo_id: &'a str,
}
