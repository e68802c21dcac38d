use membench_types::{BackendKind, BackendKindParseError};
use thiserror::Error;

/// Failure of a single `add` or `search` call. Recoverable per task.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Misconfiguration detected before any task is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownBackend(#[from] BackendKindParseError),
    #[error("backend '{kind}' requires {variable} to be set")]
    MissingBaseUrl {
        kind: BackendKind,
        variable: String,
    },
    #[error("invalid value for {variable}: {reason}")]
    InvalidValue { variable: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}
