//! REST adapter for the exchange HTTP API.
//!
//! Public data (products) is fetched unauthenticated; account endpoints are
//! signed with HMAC-SHA256 over `nonce + method + path + body`, sent as hex
//! alongside the token id and nonce headers. The nonce is the current Unix
//! time in milliseconds.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::client::ExchangeClient;
use crate::error::{ExchangeError, ExchangeResult};
use crate::wire::{
    CreateOrderRequest, CreateOrderResponse, EditOrderPayload, EditOrderRequest, NewOrderPayload,
    OrderModel, OrdersPage, ProductModel,
};
use keel_core::{Amount, Order, OrderId, OrderSide, Product, ProductId};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size requested from the orders endpoint.
const ORDERS_PAGE_LIMIT: u32 = 100;

const HEADER_TOKEN_ID: &str = "X-Api-Token-Id";
const HEADER_NONCE: &str = "X-Api-Nonce";
const HEADER_SIGNATURE: &str = "X-Api-Signature";

/// API credentials. The secret is wiped from memory on drop and never
/// logged.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    token_id: String,
    secret: String,
}

impl Credentials {
    pub fn new(token_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token_id", &self.token_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// REST implementation of [`ExchangeClient`].
pub struct RestClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl RestClient {
    /// Create a client with the default request timeout.
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> ExchangeResult<Self> {
        Self::with_timeout(base_url, credentials, DEFAULT_TIMEOUT)
    }

    /// Create an unauthenticated client for public data only (products).
    /// Private endpoints will be rejected by the exchange.
    pub fn public(base_url: impl Into<String>) -> ExchangeResult<Self> {
        Self::new(base_url, Credentials::new("", ""))
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> ExchangeResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Hex HMAC-SHA256 over `nonce + method + path_and_query + body`.
    fn sign(&self, nonce: u64, method: &str, path_and_query: &str, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.credentials.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(nonce.to_string().as_bytes());
        mac.update(method.as_bytes());
        mac.update(path_and_query.as_bytes());
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signed(&self, method: Method, path_and_query: &str, body: &str) -> RequestBuilder {
        let nonce = chrono::Utc::now().timestamp_millis() as u64;
        let signature = self.sign(nonce, method.as_str(), path_and_query, body);
        self.http
            .request(method, format!("{}{}", self.base_url, path_and_query))
            .header(HEADER_TOKEN_ID, &self.credentials.token_id)
            .header(HEADER_NONCE, nonce)
            .header(HEADER_SIGNATURE, signature)
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ExchangeError::Decode(e.to_string()))
    }

    async fn expect_success(response: reqwest::Response) -> ExchangeResult<()> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeClient for RestClient {
    async fn fetch_products(&self) -> ExchangeResult<Vec<Product>> {
        debug!(url = %self.base_url, "fetching products");
        let response = self
            .http
            .get(format!("{}/products", self.base_url))
            .send()
            .await?;
        let models: Vec<ProductModel> = Self::read_json(response).await?;

        let mut products = Vec::with_capacity(models.len());
        for model in models {
            if let Some(product) = model.into_product()? {
                products.push(product);
            }
        }
        Ok(products)
    }

    async fn fetch_orders(&self) -> ExchangeResult<Vec<Order>> {
        let path = format!("/orders?limit={ORDERS_PAGE_LIMIT}&with_details=1");
        let response = self.signed(Method::GET, &path, "").send().await?;
        let page: OrdersPage = Self::read_json(response).await?;
        Ok(page.models.into_iter().map(OrderModel::into_order).collect())
    }

    async fn fetch_order(&self, id: OrderId) -> ExchangeResult<Order> {
        let path = format!("/orders/{id}");
        let response = self.signed(Method::GET, &path, "").send().await?;
        if response.status().as_u16() == 404 {
            return Err(ExchangeError::OrderNotFound(id));
        }
        let model: OrderModel = Self::read_json(response).await?;
        Ok(model.into_order())
    }

    async fn create_limit_order(
        &self,
        product_id: ProductId,
        side: OrderSide,
        quantity: Amount,
        price: Amount,
    ) -> ExchangeResult<OrderId> {
        let payload = CreateOrderRequest {
            order: NewOrderPayload {
                order_type: "limit",
                product_id: product_id.0,
                side,
                quantity,
                price,
            },
        };
        let body = serde_json::to_string(&payload)
            .map_err(|e| ExchangeError::Decode(e.to_string()))?;
        debug!(%side, %quantity, %price, product = %product_id, "creating limit order");

        let response = self
            .signed(Method::POST, "/orders", &body)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        let created: CreateOrderResponse = Self::read_json(response).await?;
        Ok(OrderId(created.id))
    }

    async fn edit_order(
        &self,
        id: OrderId,
        quantity: Amount,
        price: Amount,
    ) -> ExchangeResult<()> {
        let payload = EditOrderRequest {
            order: EditOrderPayload { quantity, price },
        };
        let body = serde_json::to_string(&payload)
            .map_err(|e| ExchangeError::Decode(e.to_string()))?;
        debug!(order = %id, %quantity, %price, "editing order");

        let path = format!("/orders/{id}");
        let response = self
            .signed(Method::PUT, &path, &body)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        Self::expect_success(response).await
    }

    async fn cancel_order(&self, id: OrderId) -> ExchangeResult<()> {
        debug!(order = %id, "cancelling order");
        let path = format!("/orders/{id}/cancel");
        let response = self.signed(Method::PUT, &path, "").send().await?;
        Self::expect_success(response).await
    }
}
