//! Fail-stop plan application.

use tracing::{error, info};

use crate::error::ExecuteError;
use crate::plan::{Plan, Step};
use keel_core::OrderId;
use keel_exchange::ExchangeClient;

/// Result of one applied step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A create step succeeded; the exchange assigned this id.
    Created(OrderId),
    /// An edit or cancel succeeded.
    Applied,
}

/// Applies a plan's steps strictly in order, one exchange call per step.
///
/// The first failure aborts the whole run: exchange actions are not
/// transactional, and after a failed write the only safe recovery is
/// re-deriving state from a fresh snapshot, under an operator's eyes, not
/// automatically.
pub struct PlanExecutor<'a, C: ExchangeClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: ExchangeClient + ?Sized> PlanExecutor<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Apply every step in order. Outcomes are index-aligned with the
    /// plan's steps.
    pub async fn execute(&self, plan: &Plan) -> Result<Vec<StepOutcome>, ExecuteError> {
        let mut outcomes = Vec::with_capacity(plan.len());

        for step in plan.steps() {
            info!(step = %step, "applying step");
            let outcome = self.apply(step).await.map_err(|source| {
                error!(step = %step, error = %source, "step failed");
                ExecuteError {
                    step: step.to_string(),
                    source,
                }
            })?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn apply(&self, step: &Step) -> Result<StepOutcome, keel_exchange::ExchangeError> {
        match *step {
            Step::CreateLimitOrder {
                product_id,
                side,
                quantity,
                price,
            } => {
                let order_id = self
                    .client
                    .create_limit_order(product_id, side, quantity, price)
                    .await?;
                info!(order = %order_id, "order created");
                Ok(StepOutcome::Created(order_id))
            }
            Step::EditOrder {
                order_id,
                quantity,
                price,
            } => {
                self.client.edit_order(order_id, quantity, price).await?;
                Ok(StepOutcome::Applied)
            }
            Step::CancelOrder { order_id } => {
                self.client.cancel_order(order_id).await?;
                Ok(StepOutcome::Applied)
            }
        }
    }
}
