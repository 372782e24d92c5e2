//! Error types for exchange connectivity.

use keel_core::{CoreError, OrderId};
use thiserror::Error;

/// Errors surfaced by exchange client implementations.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Network-level failure, including request timeouts. Retryable for
    /// reads; fatal for writes, whose effect on the book is unknown.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The exchange refused the action (e.g. editing a partially-filled
    /// order).
    #[error("rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for exchange operations.
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;
