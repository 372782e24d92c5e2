//! Per-cycle read-only view of exchange state.

use crate::order::{Order, OrderId};
use crate::product::Product;

/// Everything the engine knows about the exchange for one cycle: the traded
/// product and the account's orders (live and historical, bounded by the
/// exchange's pagination limit).
///
/// Rebuilt from scratch every cycle. Local actions (creates, edits,
/// cancels) are not guaranteed to be reflected instantly, so nothing here
/// is cached across cycles; staleness is bounded by the cycle period.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub product: Product,
    pub orders: Vec<Order>,
}

impl MarketSnapshot {
    pub fn new(product: Product, orders: Vec<Order>) -> Self {
        Self { product, orders }
    }

    /// Look up an order by id. `None` means "not yet visible", not deleted.
    pub fn find_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    /// Orders still resting on the book.
    pub fn live_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|order| order.status.is_live())
    }
}
