//! Error taxonomy and the clonable descriptor stored in slices

use serde::Serialize;
use thiserror::Error;

/// Network or HTTP failure reported by a [`Transport`](crate::api::Transport)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TransportError {
    /// HTTP status, when the server answered at all
    pub status: Option<u16>,
    /// Server-provided message, or the client error text
    pub message: String,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl TransportError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Error without a status code (unreachable host, timeout, bad URL)
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

/// Client-side input problems, caught before anything is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("password and confirmation do not match")]
    PasswordMismatch,
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("email address is not valid")]
    InvalidEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("session expired")]
    SessionExpired,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("could not encode request: {0}")]
    Encode(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// HTTP status carried by a transport failure
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Transport(err) => err.status,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    MalformedResponse,
    SessionExpired,
    Validation,
    Config,
    Storage,
    Encode,
}

/// Failure descriptor kept in a slice's `error` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ErrorInfo {
    pub fn session_expired() -> Self {
        Self::from(&AppError::SessionExpired)
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind == ErrorKind::SessionExpired
    }
}

impl From<&AppError> for ErrorInfo {
    fn from(err: &AppError) -> Self {
        let (kind, message) = match err {
            // Keep the bare server message; the status lives in its own field
            AppError::Transport(t) => (ErrorKind::Transport, t.message.clone()),
            AppError::MalformedResponse(_) => (ErrorKind::MalformedResponse, err.to_string()),
            AppError::SessionExpired => (ErrorKind::SessionExpired, err.to_string()),
            AppError::Validation(_) => (ErrorKind::Validation, err.to_string()),
            AppError::Config(_) => (ErrorKind::Config, err.to_string()),
            AppError::Storage(_) => (ErrorKind::Storage, err.to_string()),
            AppError::Encode(_) => (ErrorKind::Encode, err.to_string()),
        };
        Self {
            kind,
            status: err.status(),
            message,
        }
    }
}

impl From<AppError> for ErrorInfo {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}
