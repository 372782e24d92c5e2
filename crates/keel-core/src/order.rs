//! Order and execution types.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Exchange-assigned execution (fill) identifier.
///
/// Globally unique; the idempotency key for position ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub u64);

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ExecutionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order status as reported by the exchange.
///
/// Anything other than `Live` is terminal: the order can no longer rest on
/// the book or accrue fills. Statuses this model does not name map to
/// `Unknown`, which is treated as terminal rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Live,
    Filled,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        !self.is_live()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One fill event belonging to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub price: Amount,
    pub quantity: Amount,
}

/// An order as known to the exchange, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub status: OrderStatus,
    /// Currency-pair code, e.g. `ETHBTC`.
    pub pair_code: String,
    pub price: Amount,
    pub quantity: Amount,
    pub filled_quantity: Amount,
    pub executions: Vec<Execution>,
}

impl Order {
    /// Whether the exchange will accept an edit for this order.
    ///
    /// Exchange constraint: partially-filled orders cannot be edited, only
    /// cancelled.
    #[inline]
    pub fn can_edit(&self) -> bool {
        self.status.is_live() && self.filled_quantity.is_zero()
    }

    /// Quantity still resting on the book.
    pub fn remaining_quantity(&self) -> Amount {
        self.quantity - self.filled_quantity
    }
}
