//! Error types for keel-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Division by a zero amount. Monetary division must fail fast rather
    /// than produce an undefined quantity.
    #[error("division by zero amount")]
    DivisionByZero,

    #[error("decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
