//! Prometheus metrics for the keel engine.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally: a registration
//! failure means duplicate metric names, a fatal configuration error that
//! should crash at startup, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_gauge_vec, register_int_counter_vec, register_int_gauge_vec, GaugeVec, IntCounterVec,
    IntGaugeVec,
};

use keel_core::Product;

/// Current market bid per pair.
pub static MARKET_BID: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("keel_market_bid", "Current market bid", &["pair"]).unwrap()
});

/// Current market ask per pair.
pub static MARKET_ASK: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("keel_market_ask", "Current market ask", &["pair"]).unwrap()
});

/// 24-hour traded volume per pair.
pub static MARKET_VOLUME_24H: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "keel_market_volume_24h",
        "24 hour traded volume",
        &["pair"]
    )
    .unwrap()
});

/// Reconciliation cycles by outcome (ok, skipped, closed).
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "keel_cycles_total",
        "Reconciliation cycles by outcome",
        &["pair", "outcome"]
    )
    .unwrap()
});

/// Applied plan steps by kind (create, edit, cancel).
pub static PLAN_STEPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "keel_plan_steps_total",
        "Applied plan steps by kind",
        &["pair", "kind"]
    )
    .unwrap()
});

/// Capital still available to the buy side.
pub static REMAINING_BUDGET: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "keel_remaining_budget",
        "Capital available to the buy side",
        &["pair"]
    )
    .unwrap()
});

/// Open (unsold) positions per pair.
pub static OPEN_POSITIONS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "keel_open_positions",
        "Open positions pending sale",
        &["pair"]
    )
    .unwrap()
});

/// Closed positions per pair, cumulative for the run.
pub static CLOSED_POSITIONS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "keel_closed_positions",
        "Positions closed since start",
        &["pair"]
    )
    .unwrap()
});

/// Publish per-pair market gauges from a fresh product snapshot.
///
/// Gauges cross the lossy f64 boundary; that is fine for observability and
/// never feeds back into engine arithmetic.
pub fn record_market(product: &Product) {
    let pair = product.pair_code.as_str();
    MARKET_BID
        .with_label_values(&[pair])
        .set(product.market_bid.to_decimal());
    MARKET_ASK
        .with_label_values(&[pair])
        .set(product.market_ask.to_decimal());
    MARKET_VOLUME_24H
        .with_label_values(&[pair])
        .set(product.volume_24h.to_decimal());
}
