//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Account tokens never live in the TOML itself: they come from the
//! HARVEST_TOKENS env var or from a separate tokens file.

use common::Secret;
use gamepromo::{
    Endpoints, FileTokenSource, GAME_ORIGIN, METADATA_BASE_URL, PROMO_BASE_URL,
    StaticTokenSource, TokenSource,
};
use harvest::PollPolicy;
use serde::Deserialize;
use std::net::SocketAddr;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::schedule::DailySchedule;

/// Env var holding comma-separated account tokens; overrides `tokens_file`
pub const TOKENS_ENV: &str = "HARVEST_TOKENS";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub accounts: AccountsConfig,
    pub endpoints: EndpointsConfig,
    pub polling: PollingConfig,
    pub schedule: ScheduleConfig,
    pub status: StatusConfig,
    /// Tokens from HARVEST_TOKENS, resolved at load time
    #[serde(skip)]
    pub env_tokens: Option<Secret<String>>,
}

/// Where account tokens come from
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Key of the token list inside the tokens file
    pub key: String,
    /// TOML file mapping keys to arrays of tokens
    pub tokens_file: Option<PathBuf>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            key: "hamster.token".to_string(),
            tokens_file: None,
        }
    }
}

/// Backend base URLs
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub metadata_url: String,
    pub promo_url: String,
    pub game_origin: String,
    /// Per-request timeout; an expired request counts as a transport failure
    pub timeout_secs: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            metadata_url: METADATA_BASE_URL.to_string(),
            promo_url: PROMO_BASE_URL.to_string(),
            game_origin: GAME_ORIGIN.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Event registration pacing. Defaults poll back-to-back without limit.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// 0 = unbounded
    pub max_attempts: u64,
}

/// Daily trigger
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local time of day, `HH:MM` or `HH:MM:SS`
    pub daily_at: String,
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_at: "07:10".to_string(),
            run_on_start: true,
        }
    }
}

/// Optional /health + /metrics listener
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub listen_addr: Option<SocketAddr>,
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Token resolution order:
    /// 1. HARVEST_TOKENS env var
    /// 2. accounts.tokens_file
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        for (name, url) in [
            ("metadata_url", &config.endpoints.metadata_url),
            ("promo_url", &config.endpoints.promo_url),
            ("game_origin", &config.endpoints.game_origin),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }

        if config.endpoints.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.accounts.key.trim().is_empty() {
            return Err(common::Error::Config("accounts.key must not be empty".into()));
        }

        config.schedule.daily_schedule()?;

        if let Ok(tokens) = std::env::var(TOKENS_ENV) {
            config.env_tokens = Some(Secret::new(tokens));
        }

        if config.env_tokens.is_none() && config.accounts.tokens_file.is_none() {
            return Err(common::Error::Config(format!(
                "no token source: set {TOKENS_ENV} or accounts.tokens_file"
            )));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("promo-harvester.toml")
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            metadata_url: self.endpoints.metadata_url.clone(),
            promo_url: self.endpoints.promo_url.clone(),
            game_origin: self.endpoints.game_origin.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoints.timeout_secs)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.polling.interval_ms),
            max_attempts: NonZeroU64::new(self.polling.max_attempts),
        }
    }

    /// Env tokens win over the tokens file.
    pub fn token_source(&self) -> Arc<dyn TokenSource> {
        match (&self.env_tokens, &self.accounts.tokens_file) {
            (Some(tokens), _) => Arc::new(StaticTokenSource::from_list(tokens.expose())),
            (None, Some(path)) => Arc::new(FileTokenSource::new(
                path.clone(),
                self.accounts.key.clone(),
            )),
            (None, None) => Arc::new(StaticTokenSource::default()),
        }
    }
}

impl ScheduleConfig {
    pub fn daily_schedule(&self) -> common::Result<DailySchedule> {
        DailySchedule::parse(&self.daily_at)
    }
}
