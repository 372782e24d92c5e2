//! Wire DTOs for the exchange REST API.
//!
//! The exchange quotes every numeric field as a decimal string; conversion
//! into [`Amount`] happens here and nowhere else. Products with an empty
//! bid or ask (books with no quotes) are skipped rather than rejected.

use serde::{Deserialize, Serialize};

use crate::error::{ExchangeError, ExchangeResult};
use keel_core::{
    Amount, Execution, ExecutionId, Order, OrderId, OrderSide, OrderStatus, Product, ProductId,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ProductModel {
    pub id: String,
    pub base_currency: String,
    pub quoted_currency: String,
    pub currency_pair_code: String,
    #[serde(default)]
    pub market_ask: Option<String>,
    #[serde(default)]
    pub market_bid: Option<String>,
    #[serde(default)]
    pub volume_24h: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl ProductModel {
    /// Convert into a core `Product`. Returns `Ok(None)` for quoteless
    /// books (empty bid or ask), which the original feed emits routinely.
    pub(crate) fn into_product(self) -> ExchangeResult<Option<Product>> {
        let market_ask = match self.market_ask.as_deref() {
            None | Some("") => return Ok(None),
            Some(raw) => raw.parse::<Amount>()?,
        };
        let market_bid = match self.market_bid.as_deref() {
            None | Some("") => return Ok(None),
            Some(raw) => raw.parse::<Amount>()?,
        };
        let volume_24h = match self.volume_24h.as_deref() {
            None | Some("") => Amount::ZERO,
            Some(raw) => raw.parse::<Amount>()?,
        };
        let id = self
            .id
            .parse::<u32>()
            .map_err(|e| ExchangeError::Decode(format!("product id {:?}: {e}", self.id)))?;

        Ok(Some(Product {
            id: ProductId(id),
            base_currency: self.base_currency,
            quoted_currency: self.quoted_currency,
            pair_code: self.currency_pair_code,
            market_ask,
            market_bid,
            volume_24h,
            disabled: self.disabled,
        }))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersPage {
    pub models: Vec<OrderModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderModel {
    pub id: u64,
    pub side: OrderSide,
    pub status: OrderStatus,
    pub currency_pair_code: String,
    pub price: Amount,
    pub quantity: Amount,
    #[serde(default)]
    pub filled_quantity: Option<Amount>,
    #[serde(default)]
    pub executions: Vec<ExecutionModel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExecutionModel {
    pub id: u64,
    pub price: Amount,
    pub quantity: Amount,
}

impl OrderModel {
    pub(crate) fn into_order(self) -> Order {
        let executions: Vec<Execution> = self
            .executions
            .into_iter()
            .map(|e| Execution {
                id: ExecutionId(e.id),
                price: e.price,
                quantity: e.quantity,
            })
            .collect();

        // Older API versions omit filled_quantity; the executions are
        // authoritative either way.
        let filled_quantity = self
            .filled_quantity
            .unwrap_or_else(|| executions.iter().map(|e| e.quantity).sum());

        Order {
            id: OrderId(self.id),
            side: self.side,
            status: self.status,
            pair_code: self.currency_pair_code,
            price: self.price,
            quantity: self.quantity,
            filled_quantity,
            executions,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateOrderRequest {
    pub order: NewOrderPayload,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewOrderPayload {
    pub order_type: &'static str,
    pub product_id: u32,
    pub side: OrderSide,
    pub quantity: Amount,
    pub price: Amount,
}

#[derive(Debug, Serialize)]
pub(crate) struct EditOrderRequest {
    pub order: EditOrderPayload,
}

#[derive(Debug, Serialize)]
pub(crate) struct EditOrderPayload {
    pub quantity: Amount,
    pub price: Amount,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateOrderResponse {
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_with_quotes_parses() {
        let raw = r#"{
            "id": "27",
            "base_currency": "ETH",
            "quoted_currency": "BTC",
            "currency_pair_code": "ETHBTC",
            "market_ask": "0.07350000",
            "market_bid": "0.07340000",
            "volume_24h": "1250.5",
            "disabled": false
        }"#;
        let model: ProductModel = serde_json::from_str(raw).unwrap();
        let product = model.into_product().unwrap().unwrap();
        assert_eq!(product.id, ProductId(27));
        assert_eq!(product.market_ask, Amount::from_scaled(7_350_000));
        assert_eq!(product.market_bid, Amount::from_scaled(7_340_000));
        assert_eq!(product.volume_24h, Amount::from_scaled(125_050_000_000));
    }

    #[test]
    fn test_quoteless_product_is_skipped() {
        let raw = r#"{
            "id": "31",
            "base_currency": "XYZ",
            "quoted_currency": "BTC",
            "currency_pair_code": "XYZBTC",
            "market_ask": "",
            "market_bid": "0.00000100"
        }"#;
        let model: ProductModel = serde_json::from_str(raw).unwrap();
        assert!(model.into_product().unwrap().is_none());
    }

    #[test]
    fn test_orders_page_parses_with_executions() {
        let raw = r#"{
            "models": [{
                "id": 9001,
                "side": "buy",
                "status": "live",
                "currency_pair_code": "ETHBTC",
                "price": "0.07340001",
                "quantity": "10.00000000",
                "executions": [
                    {"id": 55, "price": "0.07340001", "quantity": "2.50000000"}
                ]
            }]
        }"#;
        let page: OrdersPage = serde_json::from_str(raw).unwrap();
        let order = page.models.into_iter().next().unwrap().into_order();
        assert_eq!(order.id, OrderId(9001));
        assert_eq!(order.side, OrderSide::Buy);
        // filled_quantity was absent, so it is derived from executions.
        assert_eq!(order.filled_quantity, Amount::from_scaled(250_000_000));
        assert_eq!(order.executions[0].id, ExecutionId(55));
        assert!(!order.can_edit());
    }

    #[test]
    fn test_create_request_serializes_decimal_strings() {
        let request = CreateOrderRequest {
            order: NewOrderPayload {
                order_type: "limit",
                product_id: 27,
                side: OrderSide::Sell,
                quantity: Amount::from_scaled(500_000_000),
                price: Amount::from_scaled(7_350_000),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"order":{"order_type":"limit","product_id":27,"side":"sell","quantity":"5.00000000","price":"0.07350000"}}"#
        );
    }
}
