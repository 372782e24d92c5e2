//! Reconciliation loop and application plumbing for keel.

pub mod allocation;
pub mod config;
pub mod engine;
pub mod error;
pub mod scan;

pub use allocation::allocate;
pub use config::{AppConfig, ExchangeConfig, MetricsConfig, PairConfig, RunMode};
pub use engine::{CycleOutcome, EngineState, PairEngine};
pub use error::{AppError, AppResult};
