//! Core domain types for the keel market-making engine.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Amount`: scaled fixed-point integer for all prices, quantities and
//!   balances
//! - `Product`, `Order`, `Execution`: the exchange-side state model
//! - `MarketSnapshot`: the per-cycle read-only view of the exchange

pub mod amount;
pub mod error;
pub mod order;
pub mod product;
pub mod snapshot;

pub use amount::{Amount, SCALE};
pub use error::{CoreError, Result};
pub use order::{Execution, ExecutionId, Order, OrderId, OrderSide, OrderStatus};
pub use product::{minimum_order_quantity, Product, ProductId};
pub use snapshot::MarketSnapshot;
