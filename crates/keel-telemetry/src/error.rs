//! Error types for keel-telemetry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics encode error: {0}")]
    Encode(#[from] prometheus::Error),
}

pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;
