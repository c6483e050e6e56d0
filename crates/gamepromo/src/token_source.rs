//! Account token providers
//!
//! A run starts one worker per account token. Tokens are looked up by a
//! configuration key (e.g. `hamster.token`) so one tokens file can hold the
//! accounts of several games side by side:
//!
//! ```toml
//! "hamster.token" = ["1718000000abc...", "1718000001def..."]
//! ```
//!
//! The file is re-read on every run, so edits take effect at the next trigger
//! without a restart.

use std::path::PathBuf;

use common::{Error, Result};
use tracing::{debug, warn};

use crate::credentials::AccountToken;

/// Supplies the ordered list of account tokens for a run.
pub trait TokenSource: Send + Sync {
    fn load(&self) -> Result<Vec<AccountToken>>;
}

/// Fixed token list, e.g. from the `HARVEST_TOKENS` environment variable.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSource {
    tokens: Vec<AccountToken>,
}

impl StaticTokenSource {
    pub fn new(tokens: Vec<AccountToken>) -> Self {
        Self { tokens }
    }

    /// Parse a comma- or newline-separated list, skipping blank entries.
    pub fn from_list(raw: &str) -> Self {
        let tokens = raw
            .split([',', '\n'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(AccountToken::new)
            .collect();
        Self { tokens }
    }
}

impl TokenSource for StaticTokenSource {
    fn load(&self) -> Result<Vec<AccountToken>> {
        Ok(self.tokens.clone())
    }
}

/// TOML file mapping configuration keys to arrays of tokens.
#[derive(Debug, Clone)]
pub struct FileTokenSource {
    path: PathBuf,
    key: String,
}

impl FileTokenSource {
    pub fn new(path: PathBuf, key: impl Into<String>) -> Self {
        Self {
            path,
            key: key.into(),
        }
    }
}

impl TokenSource for FileTokenSource {
    fn load(&self) -> Result<Vec<AccountToken>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Tokens(format!("reading {}: {e}", self.path.display()))
        })?;
        let table: toml::Table = toml::from_str(&contents)?;

        let entries = table
            .get(&self.key)
            .ok_or_else(|| {
                Error::Tokens(format!(
                    "key {} not found in {}",
                    self.key,
                    self.path.display()
                ))
            })?
            .as_array()
            .ok_or_else(|| Error::Tokens(format!("{} must be an array of strings", self.key)))?;

        let mut tokens = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match entry.as_str().map(str::trim) {
                Some("") => warn!(key = %self.key, index, "skipping blank token"),
                Some(token) => tokens.push(AccountToken::new(token)),
                None => {
                    return Err(Error::Tokens(format!(
                        "{}[{index}] is not a string",
                        self.key
                    )));
                }
            }
        }

        debug!(path = %self.path.display(), key = %self.key, accounts = tokens.len(), "loaded account tokens");
        Ok(tokens)
    }
}
