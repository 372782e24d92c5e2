//! The reconciliation loop: one engine per traded pair.
//!
//! Per tick: fetch a fresh snapshot, update the ledger (close positions,
//! ingest fills), compute the remaining budget, build a plan and execute
//! it. Everything the plan changes on the exchange is observed only on the
//! next cycle's snapshot; the design is eventually consistent, never
//! transactional.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::{AppConfig, PairConfig, RunMode};
use crate::error::{AppError, AppResult};
use keel_core::{minimum_order_quantity, Amount, MarketSnapshot, OrderId};
use keel_exchange::ExchangeClient;
use keel_ledger::PositionLedger;
use keel_plan::{PlanBuilder, PlanExecutor, PlanOutput, PlannerConfig, StepOutcome};
use keel_telemetry::metrics;

/// Loop state. `Closed` is terminal and only reachable in budget mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Closed,
}

/// What one reconciliation cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Snapshot processed and plan (possibly empty) applied.
    Completed,
    /// Transient failure; nothing was trusted or applied. The next tick
    /// retries from scratch.
    Skipped,
    /// The portfolio is fully liquidated; the run is over.
    Closed,
}

impl CycleOutcome {
    fn metric_label(self) -> &'static str {
        match self {
            Self::Completed => "ok",
            Self::Skipped => "skipped",
            Self::Closed => "closed",
        }
    }
}

/// Reconciliation engine for a single pair.
///
/// Owns its ledger and buy-order history outright; nothing here is shared
/// between pairs, so independent engines never interfere.
pub struct PairEngine<C: ExchangeClient> {
    client: Arc<C>,
    pair: PairConfig,
    pair_code: String,
    capital: Amount,
    mode: RunMode,
    cycle_interval: std::time::Duration,
    builder: PlanBuilder,
    ledger: PositionLedger,
    /// Every entry order this run has created, oldest first. All of them
    /// stay tracked: a terminal buy order's executions must still be
    /// ingested.
    buy_orders: Vec<OrderId>,
    state: EngineState,
}

impl<C: ExchangeClient> PairEngine<C> {
    pub fn new(client: Arc<C>, pair: PairConfig, capital: Amount, config: &AppConfig) -> Self {
        let planner = PlannerConfig::new(
            config.minimum_split,
            config.sell_price_policy,
            minimum_order_quantity(&pair.base_currency),
        );
        let pair_code = pair.pair_code();
        Self {
            client,
            pair,
            pair_code,
            capital,
            mode: config.mode,
            cycle_interval: config.cycle_interval(),
            builder: PlanBuilder::new(planner),
            ledger: PositionLedger::new(),
            buy_orders: Vec::new(),
            state: EngineState::Running,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn pair_code(&self) -> &str {
        &self.pair_code
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Drive cycles on a timer until the portfolio closes or shutdown is
    /// signalled. Cycles never overlap: the body of a tick runs to
    /// completion before the next tick is honored, and missed ticks are
    /// skipped rather than queued. The shutdown signal is only checked
    /// between cycles, so an in-flight plan always finishes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> AppResult<()> {
        let mut interval = tokio::time::interval(self.cycle_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(pair = %self.pair_code, capital = %self.capital, "engine starting");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.run_cycle().await? == CycleOutcome::Closed {
                        info!(pair = %self.pair_code, "all positions closed");
                        return Ok(());
                    }
                }
                _ = shutdown.changed() => {
                    info!(pair = %self.pair_code, "shutdown signal received");
                    return Ok(());
                }
            }
        }
    }

    /// One reconciliation pass. Public so tests and the paper binary can
    /// step the engine deterministically without a timer.
    pub async fn run_cycle(&mut self) -> AppResult<CycleOutcome> {
        if self.state == EngineState::Closed {
            return Ok(CycleOutcome::Closed);
        }

        let outcome = self.cycle_inner().await?;
        metrics::CYCLES_TOTAL
            .with_label_values(&[self.pair_code.as_str(), outcome.metric_label()])
            .inc();
        Ok(outcome)
    }

    async fn cycle_inner(&mut self) -> AppResult<CycleOutcome> {
        // Transient read failures abort the cycle; no partial state is
        // trusted. The next tick re-fetches everything.
        let snapshot = match self.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(pair = %self.pair_code, error = %err, "snapshot fetch failed, skipping cycle");
                return Ok(CycleOutcome::Skipped);
            }
        };
        metrics::record_market(&snapshot.product);

        self.ledger.mark_closed(&snapshot);
        self.ledger.detect_new_positions(&snapshot, &self.buy_orders);

        // Liquidation check happens before planning: once everything is
        // terminal the recovered budget must not seed a fresh entry order.
        if self.mode == RunMode::Budget && self.portfolio_closed(&snapshot) {
            self.state = EngineState::Closed;
            self.publish_gauges(&snapshot);
            return Ok(CycleOutcome::Closed);
        }

        let current_buy_order = self.current_buy_order();
        let output = match self.builder.build(
            &snapshot,
            &mut self.ledger,
            current_buy_order,
            self.capital,
        ) {
            Ok(output) => output,
            Err(err) => {
                // Arithmetic failure (e.g. a zero market price). Abort the
                // cycle rather than plan with an undefined amount.
                error!(pair = %self.pair_code, error = %err, "plan build failed, skipping cycle");
                return Ok(CycleOutcome::Skipped);
            }
        };

        if !output.plan.is_empty() {
            // Write failures are fatal: after one, the ledger's belief
            // about in-flight orders may be wrong and the error carries the
            // offending step for the operator.
            let outcomes = PlanExecutor::new(self.client.as_ref())
                .execute(&output.plan)
                .await?;
            for step in output.plan.steps() {
                metrics::PLAN_STEPS_TOTAL
                    .with_label_values(&[self.pair_code.as_str(), step.kind()])
                    .inc();
            }
            self.bind_outcomes(&output, &outcomes);
        }

        self.publish_gauges(&snapshot);
        Ok(CycleOutcome::Completed)
    }

    /// Fetch the product and the account's orders for this cycle.
    async fn fetch_snapshot(&self) -> AppResult<MarketSnapshot> {
        let products = self.client.fetch_products().await?;
        let product = products
            .into_iter()
            .find(|p| {
                p.base_currency == self.pair.base_currency
                    && p.quoted_currency == self.pair.quoted_currency
            })
            .ok_or_else(|| AppError::ProductNotFound(self.pair_code.clone()))?;

        let orders = self.client.fetch_orders().await?;
        Ok(MarketSnapshot::new(product, orders))
    }

    fn current_buy_order(&self) -> Option<OrderId> {
        self.buy_orders.last().copied()
    }

    /// Bind exchange-assigned ids from this cycle's creates back into the
    /// trackers: the buy entry id joins the tracked list, each sell id
    /// becomes its position's closing order.
    fn bind_outcomes(&mut self, output: &PlanOutput, outcomes: &[StepOutcome]) {
        if let Some(index) = output.buy_create_index {
            if let Some(StepOutcome::Created(order_id)) = outcomes.get(index) {
                info!(pair = %self.pair_code, order = %order_id, "tracking new buy order");
                self.buy_orders.push(*order_id);
            }
        }
        for &(index, execution_id) in &output.sell_creates {
            if let Some(StepOutcome::Created(order_id)) = outcomes.get(index) {
                info!(
                    pair = %self.pair_code,
                    position = %execution_id,
                    order = %order_id,
                    "closing order placed"
                );
                self.ledger.assign_closing_order(execution_id, *order_id);
            }
        }
    }

    fn publish_gauges(&self, snapshot: &MarketSnapshot) {
        let budget = self.ledger.remaining_budget(self.capital, snapshot);
        metrics::REMAINING_BUDGET
            .with_label_values(&[self.pair_code.as_str()])
            .set(budget.to_decimal());

        let open = self.ledger.open_positions().count();
        let total = self.ledger.positions().len();
        metrics::OPEN_POSITIONS
            .with_label_values(&[self.pair_code.as_str()])
            .set(open as i64);
        metrics::CLOSED_POSITIONS
            .with_label_values(&[self.pair_code.as_str()])
            .set((total - open) as i64);
    }

    /// A budget run is over when every tracked buy order and every
    /// position's closing order is terminal. Orders not yet visible in the
    /// snapshot count as still pending, never as done.
    fn portfolio_closed(&self, snapshot: &MarketSnapshot) -> bool {
        if self.buy_orders.is_empty() {
            // Brand new run; nothing has even been placed yet.
            return false;
        }
        for &order_id in &self.buy_orders {
            match snapshot.find_order(order_id) {
                Some(order) if order.status.is_terminal() => {}
                _ => return false,
            }
        }
        for position in self.ledger.positions() {
            if position.closed && position.quantity.is_zero() && !position.has_closing_order() {
                // Merged away; its quantity lives in another position.
                continue;
            }
            let Some(order_id) = position.closing_order_id else {
                return false;
            };
            match snapshot.find_order(order_id) {
                Some(order) if order.status.is_terminal() => {}
                _ => return false,
            }
        }
        true
    }
}
