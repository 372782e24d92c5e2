//! keel-paper: scripted demo run against the in-memory exchange.
//!
//! Walks one budget through its full lifecycle: entry order, partial and
//! full fills, closing orders, liquidation. Useful for eyeballing the
//! engine's behavior without touching a real exchange.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use keel_bot::{AppConfig, CycleOutcome, ExchangeConfig, MetricsConfig, PairConfig, PairEngine, RunMode};
use keel_core::{Amount, OrderId, Product, ProductId};
use keel_exchange::PaperExchange;
use keel_plan::SellPricePolicy;

fn demo_product() -> Product {
    Product {
        id: ProductId(1),
        base_currency: "ETH".to_string(),
        quoted_currency: "BTC".to_string(),
        pair_code: "ETHBTC".to_string(),
        market_ask: Amount::from_scaled(7_350_000),
        market_bid: Amount::from_scaled(7_340_000),
        volume_24h: Amount::from_scaled(125_000_000_000),
        disabled: false,
    }
}

fn demo_config() -> AppConfig {
    AppConfig {
        capital: Amount::from_scaled(100_000_000), // 1 BTC
        minimum_split: 1.01,
        cycle_interval_ms: 1_000,
        mode: RunMode::Budget,
        sell_price_policy: SellPricePolicy::AtAsk,
        pairs: vec![PairConfig {
            base_currency: "ETH".to_string(),
            quoted_currency: "BTC".to_string(),
        }],
        exchange: ExchangeConfig::default(),
        metrics: MetricsConfig::default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    keel_telemetry::init_logging();

    let exchange = Arc::new(PaperExchange::new(demo_product()));
    let config = demo_config();
    let pair = config.pairs[0].clone();
    let mut engine = PairEngine::new(exchange.clone(), pair, config.capital, &config);

    // Cycle 1: the entry order lands one tick above the bid.
    engine.run_cycle().await?;
    let entry = exchange.order(OrderId(1)).expect("entry order");
    info!(price = %entry.price, quantity = %entry.quantity, "entry order resting");

    // A taker lifts half of it.
    let half = Amount::from_scaled(entry.quantity.scaled() / 2);
    exchange.fill(OrderId(1), half, entry.price);

    // Cycle 2: the fill becomes a position with a closing order.
    engine.run_cycle().await?;

    // The rest of the entry trades, then both closing orders get taken.
    exchange.fill(OrderId(1), entry.quantity - half, entry.price);
    engine.run_cycle().await?;

    for raw in 2..=exchange.order_count() as u64 {
        let id = OrderId(raw);
        if let Some(order) = exchange.order(id) {
            if order.status.is_live() {
                exchange.fill(id, order.remaining_quantity(), order.price);
            }
        }
    }

    for _ in 0..5 {
        if engine.run_cycle().await? == CycleOutcome::Closed {
            break;
        }
    }

    let positions = engine.ledger().positions();
    info!(
        state = ?engine.state(),
        positions = positions.len(),
        open = engine.ledger().open_positions().count(),
        orders = exchange.order_count(),
        "paper run complete"
    );
    for position in positions {
        info!(
            execution = %position.opening_execution_id,
            price = %position.opening_price,
            quantity = %position.quantity,
            closed = position.closed,
            "position"
        );
    }

    Ok(())
}
