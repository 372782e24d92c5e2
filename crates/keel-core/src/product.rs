//! Tradable product (currency pair) types.

use crate::amount::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange-assigned product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProductId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// One tradable pair as quoted by the exchange.
///
/// Immutable per reconciliation cycle; owned by the market snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Base currency code, e.g. `ETH` in `ETHBTC`.
    pub base_currency: String,
    /// Quoted currency code, e.g. `BTC` in `ETHBTC`.
    pub quoted_currency: String,
    /// Currency-pair code, e.g. `ETHBTC`.
    pub pair_code: String,
    pub market_ask: Amount,
    pub market_bid: Amount,
    pub volume_24h: Amount,
    pub disabled: bool,
}

impl Product {
    /// Current bid/ask spread.
    pub fn spread(&self) -> Amount {
        self.market_ask - self.market_bid
    }

    /// Midpoint of bid and ask, for reporting only.
    pub fn mid_price(&self) -> Amount {
        Amount::from_scaled((self.market_bid.scaled() + self.market_ask.scaled()) / 2)
    }
}

/// Smallest order quantity the exchange accepts for a base currency.
///
/// Orders below this are rejected server-side; the planner consults it
/// before emitting creates, and the position merge pass exists to rescue
/// fragments that fall under it.
pub fn minimum_order_quantity(base_currency: &str) -> Amount {
    match base_currency {
        "BTC" => Amount::from_scaled(100_000),        // 0.001
        "ETH" | "LTC" | "BCH" => Amount::from_scaled(1_000_000), // 0.01
        "XMR" | "DASH" => Amount::from_scaled(1_000_000),
        _ => Amount::from_scaled(100_000_000), // 1.0
    }
}
