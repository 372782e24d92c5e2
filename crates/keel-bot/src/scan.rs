//! Market scanner: ranks books by spread-times-volume weight.
//!
//! An operator aid for choosing which pairs to trade; the engine itself
//! takes its pair list from configuration.

use std::fmt;

use keel_core::{Amount, Product};

/// Per-product report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReport {
    pub pair_code: String,
    pub bid: Amount,
    pub ask: Amount,
    pub spread: Amount,
    pub volume_24h: Amount,
    /// 24h volume denominated in the quote currency, at the mid price.
    pub volume_quote: Amount,
    /// Ranking weight: spread * volume. Wide, busy books score highest.
    pub weight: Amount,
}

impl ProductReport {
    pub fn build(product: &Product) -> Self {
        let spread = product.spread();
        let mid = product.mid_price();
        Self {
            pair_code: product.pair_code.clone(),
            bid: product.market_bid,
            ask: product.market_ask,
            spread,
            volume_24h: product.volume_24h,
            volume_quote: product.volume_24h.multiply(mid),
            weight: spread.multiply(product.volume_24h),
        }
    }
}

impl fmt::Display for ProductReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.pair_code)?;
        writeln!(f, "- Bid: {}", self.bid)?;
        writeln!(f, "- Ask: {}", self.ask)?;
        writeln!(f, "- Spread: {}", self.spread)?;
        writeln!(f, "- Volume: {}", self.volume_24h)?;
        writeln!(f, "- Volume (quote): {}", self.volume_quote)?;
        writeln!(f, "- Weight: {}", self.weight)
    }
}

/// Build reports for every enabled product quoted in `quoted_currency`,
/// best weight first.
pub fn rank_products(products: &[Product], quoted_currency: &str) -> Vec<ProductReport> {
    let mut reports: Vec<ProductReport> = products
        .iter()
        .filter(|p| p.quoted_currency == quoted_currency && !p.disabled)
        .map(ProductReport::build)
        .collect();
    reports.sort_by(|a, b| b.weight.cmp(&a.weight));
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::ProductId;

    fn product(pair: &str, quote: &str, bid: i64, ask: i64, volume: i64, disabled: bool) -> Product {
        Product {
            id: ProductId(1),
            base_currency: pair.trim_end_matches(quote).to_string(),
            quoted_currency: quote.to_string(),
            pair_code: pair.to_string(),
            market_ask: Amount::from_scaled(ask),
            market_bid: Amount::from_scaled(bid),
            volume_24h: Amount::from_scaled(volume),
            disabled,
        }
    }

    #[test]
    fn test_ranking_orders_by_weight() {
        let products = vec![
            // spread 2, volume 10^9 -> weight 20
            product("ETHBTC", "BTC", 100, 102, 1_000_000_000, false),
            // spread 10, volume 10^9 -> weight 100
            product("LTCBTC", "BTC", 100, 110, 1_000_000_000, false),
            // wrong quote currency
            product("LTCETH", "ETH", 100, 200, 1_000_000_000, false),
            // disabled
            product("XMRBTC", "BTC", 100, 200, 1_000_000_000, true),
        ];
        let reports = rank_products(&products, "BTC");
        let pairs: Vec<&str> = reports.iter().map(|r| r.pair_code.as_str()).collect();
        assert_eq!(pairs, vec!["LTCBTC", "ETHBTC"]);
        assert_eq!(reports[0].weight, Amount::from_scaled(100));
    }
}
