//! Error types for backend calls

/// Why a backend call produced no usable result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Network/IO failure or a non-success HTTP status
    #[error("transport error: {0}")]
    Transport(String),

    /// Body is not in the expected shape
    #[error("unexpected response: {0}")]
    Parse(String),

    /// Expected field missing or blank
    #[error("response missing {0}")]
    Empty(&'static str),
}

impl Error {
    /// Short label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) => "transport",
            Error::Parse(_) => "parse",
            Error::Empty(_) => "empty",
        }
    }
}

/// Result alias for backend calls.
pub type Result<T> = std::result::Result<T, Error>;
