//! The plan: an ordered sequence of exchange actions.

use std::fmt;

use keel_core::{Amount, OrderId, OrderSide, ProductId};

/// One exchange action. A closed set: planning emits nothing else, and the
/// executor dispatches by matching the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateLimitOrder {
        product_id: ProductId,
        side: OrderSide,
        quantity: Amount,
        price: Amount,
    },
    EditOrder {
        order_id: OrderId,
        quantity: Amount,
        price: Amount,
    },
    CancelOrder {
        order_id: OrderId,
    },
}

impl Step {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateLimitOrder { .. } => "create",
            Self::EditOrder { .. } => "edit",
            Self::CancelOrder { .. } => "cancel",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateLimitOrder {
                product_id,
                side,
                quantity,
                price,
            } => write!(
                f,
                "Create limit order. Product: {product_id}; Side: {side}; Quantity: {quantity}; Price: {price}"
            ),
            Self::EditOrder {
                order_id,
                quantity,
                price,
            } => write!(
                f,
                "Edit order {order_id}. Quantity: {quantity}; Price: {price}"
            ),
            Self::CancelOrder { order_id } => write!(f, "Cancel order {order_id}"),
        }
    }
}

/// Ordered steps for one cycle. Built fresh every cycle, immutable once
/// queued, discarded after execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Returns its index within the plan.
    pub fn queue_step(&mut self, step: Step) -> usize {
        self.steps.push(step);
        self.steps.len() - 1
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
