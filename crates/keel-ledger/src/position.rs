//! A single tracked inventory position.

use chrono::Utc;
use keel_core::{Amount, Execution, ExecutionId, OrderId};

/// One unit of inventory, opened by a buy-side execution and pending sale.
///
/// Lifecycle: created when a previously-unseen execution is observed on a
/// tracked buy order; mutated as quantity is merged between sibling
/// positions or a closing order is assigned; closed when the closing order
/// reaches a terminal status or the position is merged away. Closed
/// positions are never removed from the ledger; they are the budget
/// accounting and idempotency record for the life of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// The fill that created this position. Globally unique: the ledger
    /// never creates two positions for one execution id.
    pub opening_execution_id: ExecutionId,
    /// Price the inventory was acquired at.
    pub opening_price: Amount,
    /// Current quantity. Zeroed when the position is merged away.
    pub quantity: Amount,
    /// The sell order closing this position, once placed.
    pub closing_order_id: Option<OrderId>,
    /// Terminal flag: fully sold or merged into a sibling.
    pub closed: bool,
    /// Unix milliseconds at ingestion.
    pub opened_at_ms: i64,
}

impl Position {
    /// Open a position from a buy-side fill.
    #[must_use]
    pub fn from_execution(execution: &Execution) -> Self {
        Self {
            opening_execution_id: execution.id,
            opening_price: execution.price,
            quantity: execution.quantity,
            closing_order_id: None,
            closed: false,
            opened_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Capital committed to this position at its opening price.
    #[must_use]
    pub fn notional(&self) -> Amount {
        self.quantity.multiply(self.opening_price)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    #[must_use]
    pub fn has_closing_order(&self) -> bool {
        self.closing_order_id.is_some()
    }
}
