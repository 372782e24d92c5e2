//! In-memory exchange for tests and paper trading.
//!
//! `PaperExchange` keeps a book of resting orders behind a mutex and lets
//! the caller script market moves and fills. It enforces the same
//! constraints the real exchange does: partially-filled orders cannot be
//! edited, terminal orders cannot be cancelled.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::client::ExchangeClient;
use crate::error::{ExchangeError, ExchangeResult};
use keel_core::{
    Amount, Execution, ExecutionId, Order, OrderId, OrderSide, OrderStatus, Product, ProductId,
};

#[derive(Debug)]
struct PaperState {
    product: Product,
    orders: BTreeMap<OrderId, Order>,
    fail_next_write: bool,
}

/// Simulated exchange implementing [`ExchangeClient`].
pub struct PaperExchange {
    state: Mutex<PaperState>,
    next_order_id: AtomicU64,
    next_execution_id: AtomicU64,
}

impl PaperExchange {
    pub fn new(product: Product) -> Self {
        Self {
            state: Mutex::new(PaperState {
                product,
                orders: BTreeMap::new(),
                fail_next_write: false,
            }),
            next_order_id: AtomicU64::new(1),
            next_execution_id: AtomicU64::new(1),
        }
    }

    /// Move the quoted market.
    pub fn set_market(&self, bid: Amount, ask: Amount) {
        let mut state = self.state.lock();
        state.product.market_bid = bid;
        state.product.market_ask = ask;
    }

    /// Script a fill against a resting order. Appends an execution, bumps
    /// the filled quantity, and flips the order to `Filled` once fully
    /// consumed.
    ///
    /// Panics if the order does not exist or is not live; tests that fill
    /// an unknown order are broken tests.
    pub fn fill(&self, order_id: OrderId, quantity: Amount, price: Amount) -> ExecutionId {
        let mut state = self.state.lock();
        let order = state
            .orders
            .get_mut(&order_id)
            .unwrap_or_else(|| panic!("fill on unknown order {order_id}"));
        assert!(
            order.status.is_live(),
            "fill on non-live order {order_id}"
        );

        let execution_id = ExecutionId(self.next_execution_id.fetch_add(1, Ordering::SeqCst));
        order.executions.push(Execution {
            id: execution_id,
            price,
            quantity,
        });
        order.filled_quantity += quantity;
        if order.filled_quantity >= order.quantity {
            order.status = OrderStatus::Filled;
        }
        execution_id
    }

    /// Make the next write operation (create/edit/cancel) fail with a
    /// rejection. One-shot.
    pub fn fail_next_write(&self) {
        self.state.lock().fail_next_write = true;
    }

    /// Inspect an order, for assertions.
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.state.lock().orders.get(&id).cloned()
    }

    /// Number of orders ever created.
    pub fn order_count(&self) -> usize {
        self.state.lock().orders.len()
    }

    fn check_write_allowed(state: &mut PaperState) -> ExchangeResult<()> {
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(ExchangeError::Rejected("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeClient for PaperExchange {
    async fn fetch_products(&self) -> ExchangeResult<Vec<Product>> {
        Ok(vec![self.state.lock().product.clone()])
    }

    async fn fetch_orders(&self) -> ExchangeResult<Vec<Order>> {
        Ok(self.state.lock().orders.values().cloned().collect())
    }

    async fn fetch_order(&self, id: OrderId) -> ExchangeResult<Order> {
        self.state
            .lock()
            .orders
            .get(&id)
            .cloned()
            .ok_or(ExchangeError::OrderNotFound(id))
    }

    async fn create_limit_order(
        &self,
        _product_id: ProductId,
        side: OrderSide,
        quantity: Amount,
        price: Amount,
    ) -> ExchangeResult<OrderId> {
        let mut state = self.state.lock();
        Self::check_write_allowed(&mut state)?;
        if !quantity.is_positive() || !price.is_positive() {
            return Err(ExchangeError::Rejected(
                "quantity and price must be positive".to_string(),
            ));
        }

        let id = OrderId(self.next_order_id.fetch_add(1, Ordering::SeqCst));
        let pair_code = state.product.pair_code.clone();
        state.orders.insert(
            id,
            Order {
                id,
                side,
                status: OrderStatus::Live,
                pair_code,
                price,
                quantity,
                filled_quantity: Amount::ZERO,
                executions: Vec::new(),
            },
        );
        debug!(order = %id, %side, %quantity, %price, "paper order created");
        Ok(id)
    }

    async fn edit_order(
        &self,
        id: OrderId,
        quantity: Amount,
        price: Amount,
    ) -> ExchangeResult<()> {
        let mut state = self.state.lock();
        Self::check_write_allowed(&mut state)?;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(ExchangeError::OrderNotFound(id))?;
        if !order.can_edit() {
            return Err(ExchangeError::Rejected(format!(
                "order {id} is not editable"
            )));
        }
        order.quantity = quantity;
        order.price = price;
        Ok(())
    }

    async fn cancel_order(&self, id: OrderId) -> ExchangeResult<()> {
        let mut state = self.state.lock();
        Self::check_write_allowed(&mut state)?;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(ExchangeError::OrderNotFound(id))?;
        if order.status.is_terminal() {
            return Err(ExchangeError::Rejected(format!(
                "order {id} is already terminal"
            )));
        }
        order.status = OrderStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId(1),
            base_currency: "ETH".to_string(),
            quoted_currency: "BTC".to_string(),
            pair_code: "ETHBTC".to_string(),
            market_ask: Amount::from_scaled(102),
            market_bid: Amount::from_scaled(100),
            volume_24h: Amount::ZERO,
            disabled: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let exchange = PaperExchange::new(product());
        let id = exchange
            .create_limit_order(
                ProductId(1),
                OrderSide::Buy,
                Amount::from_scaled(1_000),
                Amount::from_scaled(101),
            )
            .await
            .unwrap();

        let order = exchange.fetch_order(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Live);
        assert!(order.can_edit());
    }

    #[tokio::test]
    async fn test_partial_fill_blocks_edit() {
        let exchange = PaperExchange::new(product());
        let id = exchange
            .create_limit_order(
                ProductId(1),
                OrderSide::Buy,
                Amount::from_scaled(1_000),
                Amount::from_scaled(101),
            )
            .await
            .unwrap();

        exchange.fill(id, Amount::from_scaled(400), Amount::from_scaled(101));

        let order = exchange.fetch_order(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Live);
        assert!(!order.can_edit());

        let err = exchange
            .edit_order(id, Amount::from_scaled(900), Amount::from_scaled(102))
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_full_fill_is_terminal() {
        let exchange = PaperExchange::new(product());
        let id = exchange
            .create_limit_order(
                ProductId(1),
                OrderSide::Sell,
                Amount::from_scaled(1_000),
                Amount::from_scaled(102),
            )
            .await
            .unwrap();

        exchange.fill(id, Amount::from_scaled(1_000), Amount::from_scaled(102));

        let order = exchange.fetch_order(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(exchange.cancel_order(id).await.is_err());
    }

    #[tokio::test]
    async fn test_injected_write_failure_is_one_shot() {
        let exchange = PaperExchange::new(product());
        exchange.fail_next_write();

        let err = exchange
            .create_limit_order(
                ProductId(1),
                OrderSide::Buy,
                Amount::from_scaled(1_000),
                Amount::from_scaled(101),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExchangeError::Rejected(_)));

        assert!(exchange
            .create_limit_order(
                ProductId(1),
                OrderSide::Buy,
                Amount::from_scaled(1_000),
                Amount::from_scaled(101),
            )
            .await
            .is_ok());
    }
}
