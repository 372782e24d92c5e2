//! Plan construction: diff desired state against the snapshot.
//!
//! Two sub-algorithms run per cycle against the same snapshot and append to
//! one plan. Buy-side tracking keeps a single entry order pinned just above
//! the market bid; sell-side tracking places and re-prices one closing
//! order per open position, merging fragments first so nothing gets stuck
//! below the exchange minimum.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PlanError;
use crate::plan::{Plan, Step};
use keel_core::{Amount, ExecutionId, MarketSnapshot, OrderId, OrderSide};
use keel_ledger::PositionLedger;

/// Which ask the sell side quotes when creating a closing order.
///
/// Re-pricing edits always target `max(market_ask, min_ask)`: undercutting
/// on edits would shave one tick off the bot's own resting ask every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellPricePolicy {
    /// Quote at the current market ask.
    #[default]
    AtAsk,
    /// Undercut the current market ask by one minimal unit.
    InsideAsk,
}

impl SellPricePolicy {
    fn create_ask(self, market_ask: Amount) -> Amount {
        match self {
            Self::AtAsk => market_ask,
            Self::InsideAsk => market_ask - Amount::MINIMAL_UNIT,
        }
    }
}

/// Planner configuration, fixed for the life of a run.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Required sell/buy price ratio as a scaled amount (e.g. 1.01 scaled).
    /// Converted from the configured float once, at construction.
    pub minimum_split: Amount,
    pub sell_price_policy: SellPricePolicy,
    /// Smallest quantity the exchange accepts for this product.
    pub min_order_quantity: Amount,
}

impl PlannerConfig {
    /// Build from the configured profit ratio (>= 1.0).
    pub fn new(
        minimum_split: f64,
        sell_price_policy: SellPricePolicy,
        min_order_quantity: Amount,
    ) -> Self {
        Self {
            minimum_split: Amount::from_decimal(minimum_split),
            sell_price_policy,
            min_order_quantity,
        }
    }
}

/// A built plan plus the provenance the engine needs to bind
/// exchange-assigned order ids after execution.
#[derive(Debug, Default)]
pub struct PlanOutput {
    pub plan: Plan,
    /// Index of the buy-entry create step, if one was queued.
    pub buy_create_index: Option<usize>,
    /// Indices of sell create steps and the position each one closes.
    pub sell_creates: Vec<(usize, ExecutionId)>,
}

/// Builds one plan per cycle from snapshot + ledger + budget.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    config: PlannerConfig,
}

impl PlanBuilder {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Compute the actions required to converge toward desired state.
    ///
    /// Mutates the ledger only through merges; every other effect is a
    /// queued step, observed on a later cycle's snapshot.
    pub fn build(
        &self,
        snapshot: &MarketSnapshot,
        ledger: &mut PositionLedger,
        current_buy: Option<OrderId>,
        capital: Amount,
    ) -> Result<PlanOutput, PlanError> {
        let mut output = PlanOutput::default();

        if snapshot.product.disabled {
            warn!(pair = %snapshot.product.pair_code, "product disabled, skipping cycle plan");
            return Ok(output);
        }

        self.plan_buy_side(snapshot, ledger, current_buy, capital, &mut output)?;
        self.plan_sell_side(snapshot, ledger, &mut output);

        Ok(output)
    }

    /// Keep one buy order resting just above the market bid, sized to the
    /// remaining budget.
    fn plan_buy_side(
        &self,
        snapshot: &MarketSnapshot,
        ledger: &PositionLedger,
        current_buy: Option<OrderId>,
        capital: Amount,
        output: &mut PlanOutput,
    ) -> Result<(), PlanError> {
        let product = &snapshot.product;
        let budget = ledger.remaining_budget(capital, snapshot);

        // Never bid at or above the ask: crossing our own sell orders
        // would pay taker fees to trade with ourselves. A fresh entry
        // outbids the book by one tick; a lagging order is pulled up to
        // the bid itself.
        let ask_cap = product.market_ask - Amount::MINIMAL_UNIT;
        let entry_price = std::cmp::min(product.market_bid + Amount::MINIMAL_UNIT, ask_cap);
        let track_price = std::cmp::min(product.market_bid, ask_cap);

        if let Some(order_id) = current_buy {
            let Some(order) = snapshot.find_order(order_id) else {
                // Created recently and not yet visible; touch nothing.
                debug!(order = %order_id, "buy order not in snapshot yet");
                return Ok(());
            };

            if order.status.is_live() {
                if order.price >= product.market_bid {
                    // Already best-positioned.
                    return Ok(());
                }
                if !budget.is_positive() {
                    // All capital is committed to inventory; a resting buy
                    // would overspend if it filled.
                    info!(order = %order_id, "no budget left, cancelling buy order");
                    output.plan.queue_step(Step::CancelOrder { order_id });
                    return Ok(());
                }
                if !track_price.is_positive() {
                    warn!(
                        bid = %product.market_bid,
                        ask = %product.market_ask,
                        "degenerate market, leaving buy order as is"
                    );
                    return Ok(());
                }
                if order.can_edit() {
                    let quantity = budget.divide(track_price)?;
                    info!(
                        order = %order_id,
                        old_price = %order.price,
                        new_price = %track_price,
                        "buy order below market bid, repricing"
                    );
                    output.plan.queue_step(Step::EditOrder {
                        order_id,
                        quantity,
                        price: track_price,
                    });
                } else {
                    // Partially filled: the exchange refuses edits. Cancel
                    // now; the replacement is created on a later cycle,
                    // once no live buy order remains.
                    info!(order = %order_id, "buy order partially filled, cancelling");
                    output.plan.queue_step(Step::CancelOrder { order_id });
                }
                return Ok(());
            }
            // Terminal: fall through to the create path.
        }

        if !budget.is_positive() {
            return Ok(());
        }
        if !entry_price.is_positive() {
            warn!(
                bid = %product.market_bid,
                ask = %product.market_ask,
                "degenerate market, no buy price available"
            );
            return Ok(());
        }

        let quantity = budget.divide(entry_price)?;
        if quantity < self.config.min_order_quantity {
            debug!(%quantity, "buy quantity below exchange minimum, waiting");
            return Ok(());
        }

        let index = output.plan.queue_step(Step::CreateLimitOrder {
            product_id: product.id,
            side: OrderSide::Buy,
            quantity,
            price: entry_price,
        });
        output.buy_create_index = Some(index);
        Ok(())
    }

    /// Place or re-price one closing order per open position.
    fn plan_sell_side(
        &self,
        snapshot: &MarketSnapshot,
        ledger: &mut PositionLedger,
        output: &mut PlanOutput,
    ) {
        let market_ask = snapshot.product.market_ask;

        for execution_id in ledger.open_execution_ids() {
            let Some(position) = ledger.get(execution_id) else {
                continue;
            };
            if !position.quantity.is_positive() {
                // Merged away earlier in this same pass.
                continue;
            }
            let opening_price = position.opening_price;
            let quantity = position.quantity;
            let closing_order_id = position.closing_order_id;

            // The profit floor: never offer below opening price times the
            // configured split.
            let min_ask = opening_price.multiply(self.config.minimum_split);

            match closing_order_id {
                None => {
                    if let Some(merge) = ledger.try_merge(execution_id, snapshot) {
                        info!(
                            source = %execution_id,
                            absorbed_by = %merge.absorbed_by,
                            "merged position instead of creating sell order"
                        );
                        if let Some(resize) = merge.resize {
                            output.plan.queue_step(Step::EditOrder {
                                order_id: resize.order_id,
                                quantity: resize.quantity,
                                price: resize.price,
                            });
                        }
                        continue;
                    }

                    if quantity < self.config.min_order_quantity {
                        debug!(
                            position = %execution_id,
                            %quantity,
                            "fragment below exchange minimum, no merge candidate yet"
                        );
                        continue;
                    }

                    let price = std::cmp::max(
                        self.config.sell_price_policy.create_ask(market_ask),
                        min_ask,
                    );
                    let index = output.plan.queue_step(Step::CreateLimitOrder {
                        product_id: snapshot.product.id,
                        side: OrderSide::Sell,
                        quantity,
                        price,
                    });
                    output.sell_creates.push((index, execution_id));
                }
                Some(order_id) => {
                    let Some(order) = snapshot.find_order(order_id) else {
                        // Not yet visible; retried next cycle.
                        continue;
                    };
                    if !order.status.is_live() {
                        // Terminal: mark_closed picks it up next cycle.
                        continue;
                    }
                    let target = std::cmp::max(market_ask, min_ask);
                    if order.price != target && order.can_edit() {
                        info!(
                            order = %order_id,
                            old_price = %order.price,
                            new_price = %target,
                            "repricing sell order"
                        );
                        output.plan.queue_step(Step::EditOrder {
                            order_id,
                            quantity: order.quantity,
                            price: target,
                        });
                    }
                }
            }
        }
    }
}
