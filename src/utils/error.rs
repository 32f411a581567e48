use thiserror::Error;

use crate::monitor::CycleReport;

/// Failure while assembling the application from configuration.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure reported by a source adapter for a single search.
///
/// The orchestrator logs these and moves on to the next phrase or source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("automation session lost: {0}")]
    Session(String),

    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    /// Whether a retry within the same adapter call has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            AdapterError::Network(_) | AdapterError::Timeout(_) | AdapterError::Session(_) => true,
            AdapterError::Status(code) => *code == 429 || *code >= 500,
            AdapterError::Parse(_) | AdapterError::Other(_) => false,
        }
    }

    pub fn is_session_loss(&self) -> bool {
        matches!(self, AdapterError::Session(_))
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            AdapterError::Status(status.as_u16())
        } else {
            AdapterError::Network(err.to_string())
        }
    }
}

/// Seen-listing store failure. Always fatal to the running cycle.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("invalid notifier configuration: {0}")]
    Config(String),

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<lettre::error::Error> for NotifierError {
    fn from(err: lettre::error::Error) -> Self {
        NotifierError::Message(err.to_string())
    }
}

impl From<lettre::address::AddressError> for NotifierError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotifierError::Config(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotifierError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        NotifierError::Transport(err.to_string())
    }
}

/// Outcome of a cycle that did not complete cleanly.
#[derive(Error, Debug)]
pub enum CycleError {
    /// The store failed mid-cycle; nothing was sent.
    #[error("seen-listing store failed, cycle aborted: {0}")]
    Store(#[from] StoreError),

    /// Dedup bookkeeping completed but one or more digest batches were not delivered.
    #[error("{failed} of {total} digest batches failed to send: {last_error}")]
    Notification {
        report: Box<CycleReport>,
        failed: usize,
        total: usize,
        last_error: NotifierError,
    },
}
