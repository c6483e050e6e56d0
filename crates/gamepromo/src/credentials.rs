//! Bearer credentials for the two backends
//!
//! Both token kinds wrap `common::Secret`, so they never show up in `Debug`
//! output or logs. Use `hint()` to tell accounts apart in log lines.

use common::Secret;

/// Long-lived bearer token identifying one game account.
#[derive(Debug, Clone)]
pub struct AccountToken(Secret<String>);

impl AccountToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Secret::new(token.into()))
    }

    /// Raw token for the `Authorization` header.
    pub fn bearer(&self) -> &str {
        self.0.expose()
    }

    /// Masked suffix for log lines.
    pub fn hint(&self) -> String {
        self.0.hint()
    }
}

/// Short-lived token returned by `login-client`, scoped to one promotion and
/// one code. Never reused across acquisition cycles.
#[derive(Debug)]
pub struct SessionToken(Secret<String>);

impl SessionToken {
    /// Wrap a session token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let secret = Secret::new(token.into());
        if secret.is_blank() {
            return None;
        }
        Some(Self(secret))
    }

    /// Raw token for the `Authorization` header.
    pub fn bearer(&self) -> &str {
        self.0.expose()
    }
}
