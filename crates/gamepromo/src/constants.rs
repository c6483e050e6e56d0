//! Endpoint and client-identity constants
//!
//! These values identify the official game client to both backends. None of
//! them are secrets.

/// Game metadata service (promo listing and redemption)
pub const METADATA_BASE_URL: &str = "https://api.hamsterkombatgame.io";

/// Cross-game promotion service (client login, events, code issuance)
pub const PROMO_BASE_URL: &str = "https://api.gamepromo.io";

/// Web origin sent as `Origin` and `Referer` on account-authenticated calls
pub const GAME_ORIGIN: &str = "https://hamsterkombatgame.io";

pub const GET_PROMOS_PATH: &str = "/interlude/get-promos";
pub const APPLY_PROMO_PATH: &str = "/interlude/apply-promo";
pub const LOGIN_CLIENT_PATH: &str = "/promo/login-client";
pub const REGISTER_EVENT_PATH: &str = "/promo/register-event";
pub const CREATE_CODE_PATH: &str = "/promo/create-code";

/// `clientOrigin` reported when registering a synthetic client
pub const CLIENT_ORIGIN: &str = "ios";

/// `eventOrigin` reported with every progress event. The official client
/// literally sends the string "undefined".
pub const EVENT_ORIGIN: &str = "undefined";

/// Codes an account can receive per promotion per day, whatever the
/// promotion's advertised `keysPerDay` says.
pub const DAILY_KEY_CAP: u32 = 4;
