//! Plan construction and execution.
//!
//! Each reconciliation cycle builds one [`Plan`], the ordered list of
//! exchange actions that move actual state toward desired state, and then
//! applies it step by step, halting on the first failure.

pub mod builder;
pub mod error;
pub mod executor;
pub mod plan;

pub use builder::{PlanBuilder, PlanOutput, PlannerConfig, SellPricePolicy};
pub use error::{ExecuteError, PlanError};
pub use executor::{PlanExecutor, StepOutcome};
pub use plan::{Plan, Step};
