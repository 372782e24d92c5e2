//! Unified exchange client trait.
//!
//! The [`ExchangeClient`] trait is the single seam between the
//! reconciliation engine and the outside world. Implementors own
//! exchange-specific serialization, signing and error mapping; everything
//! crossing this boundary is already an [`Amount`] or a core domain type.

use async_trait::async_trait;

use crate::error::ExchangeResult;
use keel_core::{Amount, Order, OrderId, OrderSide, Product, ProductId};

/// Exchange operations the engine needs.
///
/// All methods are async; callers apply their own read-vs-write failure
/// policy (reads retry on the next cycle, writes are fail-stop).
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetch all tradable products with current bid/ask and volume.
    async fn fetch_products(&self) -> ExchangeResult<Vec<Product>>;

    /// Fetch the account's orders, including executions and filled
    /// quantity, bounded by the exchange's pagination limit.
    async fn fetch_orders(&self) -> ExchangeResult<Vec<Order>>;

    /// Fetch a single order by id.
    async fn fetch_order(&self, id: OrderId) -> ExchangeResult<Order>;

    /// Place a limit order; returns the exchange-assigned id.
    async fn create_limit_order(
        &self,
        product_id: ProductId,
        side: OrderSide,
        quantity: Amount,
        price: Amount,
    ) -> ExchangeResult<OrderId>;

    /// Re-price and/or re-size a resting order.
    async fn edit_order(&self, id: OrderId, quantity: Amount, price: Amount)
        -> ExchangeResult<()>;

    /// Cancel a resting order.
    async fn cancel_order(&self, id: OrderId) -> ExchangeResult<()>;
}
