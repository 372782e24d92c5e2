//! Application-level error types.

use keel_exchange::ExchangeError;
use keel_plan::{ExecuteError, PlanError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("product {0} not listed on exchange")]
    ProductNotFound(String),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Fail-stop: a plan write failed and the run must halt.
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
