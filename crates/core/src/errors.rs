use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the entire crypto-portfolio-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Snapshot / File ─────────────────────────────────────────────
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u16),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    // ── Remote price service ────────────────────────────────────────
    #[error("Price service error: {0}")]
    Remote(#[from] RemoteError),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

/// Why a proposed transaction was not admitted.
///
/// Rejections are never fatal and never leave rows behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("quantity must be at least 0.00000001 and below 1000000000000, with at most 8 decimal places (got {0})")]
    InvalidQuantity(Decimal),

    #[error("price per unit must be at least 0.00000001 and below 1000000000000, with at most 8 decimal places (got {0})")]
    InvalidPrice(Decimal),

    #[error("coin not found: {0}")]
    UnknownCoin(String),

    #[error("coin not held, nothing to sell: {0}")]
    NotHeld(String),

    #[error("insufficient balance, available: {available}")]
    InsufficientBalance { available: Decimal, requested: Decimal },
}

/// Classification of a failed call to the remote price service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteErrorKind {
    Timeout,
    Connection,
    HttpStatus,
    Other,
}

impl std::fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteErrorKind::Timeout => write!(f, "timeout"),
            RemoteErrorKind::Connection => write!(f, "connection"),
            RemoteErrorKind::HttpStatus => write!(f, "http-status"),
            RemoteErrorKind::Other => write!(f, "other"),
        }
    }
}

/// A classified remote failure. This is what the price gateway keeps in its
/// last-error slot.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A response arrived but its body could not be understood.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Other, message)
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Remote(RemoteError::malformed(e.to_string()))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            RemoteErrorKind::Timeout
        } else if e.is_connect() {
            RemoteErrorKind::Connection
        } else if e.is_status() {
            RemoteErrorKind::HttpStatus
        } else {
            RemoteErrorKind::Other
        };

        // reqwest messages embed the full URL; API keys may ride in the query.
        let msg = e.to_string();
        let message = match msg.find('?') {
            Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
            None => msg,
        };
        RemoteError { kind, message }
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Remote(RemoteError::from(e))
    }
}

impl CoreError {
    /// Collapse any error into the remote-failure taxonomy.
    /// Non-remote errors land in `Other`.
    pub fn into_remote(self) -> RemoteError {
        match self {
            CoreError::Remote(e) => e,
            other => RemoteError::new(RemoteErrorKind::Other, other.to_string()),
        }
    }
}
