//! Error types for planning and execution.

use keel_core::CoreError;
use keel_exchange::ExchangeError;
use thiserror::Error;

/// Errors raised while building a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Arithmetic failed (e.g. a zero market price reached a division).
    /// The cycle must abort rather than plan with an undefined amount.
    #[error("arithmetic error while planning: {0}")]
    Arithmetic(#[from] CoreError),
}

/// A step failed while applying a plan.
///
/// Fail-stop: after this error the ledger's belief about in-flight orders
/// may be wrong, so the run must halt and exchange state be re-inspected
/// before restarting.
#[derive(Debug, Error)]
#[error("plan step failed: {step}: {source}")]
pub struct ExecuteError {
    /// Rendered form of the offending step.
    pub step: String,
    #[source]
    pub source: ExchangeError,
}
