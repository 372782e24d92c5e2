//! The position ledger and its reconciliation operations.

use tracing::{debug, info};

use crate::position::Position;
use keel_core::{Amount, ExecutionId, MarketSnapshot, OrderId};

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// The surviving position that absorbed the source quantity.
    pub absorbed_by: ExecutionId,
    /// Resize the absorbing position's live closing order needs, if it has
    /// one. The caller is responsible for queueing the edit.
    pub resize: Option<OrderResize>,
}

/// An order edit the exchange must receive to keep a closing order in sync
/// with its merged position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderResize {
    pub order_id: OrderId,
    pub quantity: Amount,
    /// Unchanged from the resting order; carried so the edit call is
    /// self-contained.
    pub price: Amount,
}

/// All positions opened during a run, open and closed alike.
///
/// Owned by exactly one engine instance; every mutation happens on the
/// cycle's single mutating owner, so no interior locking is needed.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: Vec<Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn get(&self, id: ExecutionId) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.opening_execution_id == id)
    }

    /// Open (non-closed) positions.
    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| p.is_open())
    }

    /// Execution ids of open positions, in ingestion order. Snapshotted so
    /// callers can mutate the ledger while iterating.
    pub fn open_execution_ids(&self) -> Vec<ExecutionId> {
        self.open_positions()
            .map(|p| p.opening_execution_id)
            .collect()
    }

    /// Whether any position (open or closed) was opened by this execution.
    pub fn contains_execution(&self, id: ExecutionId) -> bool {
        self.positions
            .iter()
            .any(|p| p.opening_execution_id == id)
    }

    /// Record the sell order placed to close a position.
    pub fn assign_closing_order(&mut self, id: ExecutionId, order_id: OrderId) {
        if let Some(position) = self.position_mut(id) {
            position.closing_order_id = Some(order_id);
        }
    }

    /// Close every open position whose closing order has reached a terminal
    /// status in this snapshot. Idempotent; absent orders are left alone
    /// ("not yet visible", not deleted).
    pub fn mark_closed(&mut self, snapshot: &MarketSnapshot) -> usize {
        let mut newly_closed = 0;
        for position in self.positions.iter_mut().filter(|p| p.is_open()) {
            let Some(order_id) = position.closing_order_id else {
                continue;
            };
            let Some(order) = snapshot.find_order(order_id) else {
                continue;
            };
            if order.status.is_terminal() {
                position.closed = true;
                newly_closed += 1;
                info!(
                    execution = %position.opening_execution_id,
                    order = %order_id,
                    status = %order.status,
                    "position closed"
                );
            }
        }
        newly_closed
    }

    /// Ingest fills from the tracked buy orders: every execution id not yet
    /// represented by any position (open or closed) opens a new one.
    /// Exactly-once: re-running over a growing execution list never
    /// duplicates a position.
    pub fn detect_new_positions(
        &mut self,
        snapshot: &MarketSnapshot,
        tracked_buy_orders: &[OrderId],
    ) -> usize {
        let mut created = 0;
        for &order_id in tracked_buy_orders {
            let Some(order) = snapshot.find_order(order_id) else {
                continue;
            };
            for execution in &order.executions {
                if self.contains_execution(execution.id) {
                    continue;
                }
                info!(
                    execution = %execution.id,
                    price = %execution.price,
                    quantity = %execution.quantity,
                    "new open position"
                );
                self.positions.push(Position::from_execution(execution));
                created += 1;
            }
        }
        created
    }

    /// Capital available for the buy side.
    ///
    /// Committed notional of open positions is subtracted; fills on their
    /// closing orders release capital back as they land. Closed positions
    /// contribute to neither term, so the budget is continuous across a
    /// close: released quantity converges to the committed quantity and
    /// then both drop out together.
    pub fn remaining_budget(&self, capital: Amount, snapshot: &MarketSnapshot) -> Amount {
        let mut budget = capital;
        for position in self.open_positions() {
            budget -= position.notional();
            let Some(order_id) = position.closing_order_id else {
                continue;
            };
            if let Some(order) = snapshot.find_order(order_id) {
                budget += order.filled_quantity.multiply(position.opening_price);
            }
        }
        budget
    }

    /// Try to fold `source` into a sibling position with the same opening
    /// price, to keep sellable quantities above the exchange minimum.
    ///
    /// A candidate must be open, hold quantity, and have a closing order
    /// that is either absent or still editable. On success the source is
    /// zeroed and closed; if the candidate's closing order is live, the
    /// returned [`OrderResize`] must be applied to keep it in sync.
    ///
    /// The source must not have a closing order of its own: its inventory
    /// would otherwise be double-counted by two resting sells.
    pub fn try_merge(
        &mut self,
        source: ExecutionId,
        snapshot: &MarketSnapshot,
    ) -> Option<MergeResult> {
        let source_index = self
            .positions
            .iter()
            .position(|p| p.opening_execution_id == source)?;
        {
            let src = &self.positions[source_index];
            if src.closed || !src.quantity.is_positive() || src.has_closing_order() {
                return None;
            }
        }

        let opening_price = self.positions[source_index].opening_price;
        let candidate_index = self.positions.iter().enumerate().position(|(i, p)| {
            i != source_index
                && p.is_open()
                && p.quantity.is_positive()
                && p.opening_price == opening_price
                && match p.closing_order_id {
                    None => true,
                    Some(order_id) => snapshot
                        .find_order(order_id)
                        .is_some_and(|order| order.can_edit()),
                }
        })?;

        let source_quantity = self.positions[source_index].quantity;
        let (absorbed_by, resize) = {
            let candidate = &mut self.positions[candidate_index];
            candidate.quantity += source_quantity;
            let quantity = candidate.quantity;
            let resize = candidate.closing_order_id.and_then(|order_id| {
                // Candidate eligibility proved the order is present and
                // editable.
                snapshot.find_order(order_id).map(|order| OrderResize {
                    order_id,
                    quantity,
                    price: order.price,
                })
            });
            (candidate.opening_execution_id, resize)
        };

        let src = &mut self.positions[source_index];
        src.quantity = Amount::ZERO;
        src.closed = true;

        debug!(
            source = %source,
            absorbed_by = %absorbed_by,
            quantity = %source_quantity,
            "position merged"
        );
        Some(MergeResult {
            absorbed_by,
            resize,
        })
    }

    fn position_mut(&mut self, id: ExecutionId) -> Option<&mut Position> {
        self.positions
            .iter_mut()
            .find(|p| p.opening_execution_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::{Execution, Order, OrderSide, OrderStatus, Product, ProductId};

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

    fn buy_order(id: u64, executions: Vec<(u64, i64, i64)>) -> Order {
        let executions: Vec<Execution> = executions
            .into_iter()
            .map(|(eid, price, quantity)| Execution {
                id: ExecutionId(eid),
                price: Amount::from_scaled(price),
                quantity: Amount::from_scaled(quantity),
            })
            .collect();
        let filled_quantity = executions.iter().map(|e| e.quantity).sum();
        Order {
            id: OrderId(id),
            side: OrderSide::Buy,
            status: OrderStatus::Live,
            pair_code: "ETHBTC".to_string(),
            price: Amount::from_scaled(100),
            quantity: Amount::from_scaled(1_000_000),
            filled_quantity,
            executions,
        }
    }

    fn sell_order(id: u64, status: OrderStatus, quantity: i64, filled: i64, price: i64) -> Order {
        Order {
            id: OrderId(id),
            side: OrderSide::Sell,
            status,
            pair_code: "ETHBTC".to_string(),
            price: Amount::from_scaled(price),
            quantity: Amount::from_scaled(quantity),
            filled_quantity: Amount::from_scaled(filled),
            executions: Vec::new(),
        }
    }

    fn snapshot(orders: Vec<Order>) -> MarketSnapshot {
        MarketSnapshot::new(product(), orders)
    }

    #[test]
    fn test_detect_is_exactly_once() {
        let mut ledger = PositionLedger::new();
        let tracked = [OrderId(1)];

        let snap = snapshot(vec![buy_order(1, vec![(10, 100, 500)])]);
        assert_eq!(ledger.detect_new_positions(&snap, &tracked), 1);

        // Same execution again plus one new one: only the new one lands.
        let snap = snapshot(vec![buy_order(1, vec![(10, 100, 500), (11, 101, 300)])]);
        assert_eq!(ledger.detect_new_positions(&snap, &tracked), 1);
        assert_eq!(ledger.positions().len(), 2);

        // Even a closed position blocks re-ingestion.
        ledger.assign_closing_order(ExecutionId(10), OrderId(2));
        let snap = snapshot(vec![
            buy_order(1, vec![(10, 100, 500), (11, 101, 300)]),
            sell_order(2, OrderStatus::Filled, 500, 500, 102),
        ]);
        ledger.mark_closed(&snap);
        assert_eq!(ledger.detect_new_positions(&snap, &tracked), 0);
        assert_eq!(ledger.positions().len(), 2);
    }

    #[test]
    fn test_mark_closed_is_idempotent_and_skips_absent() {
        let mut ledger = PositionLedger::new();
        let tracked = [OrderId(1)];
        let snap = snapshot(vec![buy_order(1, vec![(10, 100, 500)])]);
        ledger.detect_new_positions(&snap, &tracked);
        ledger.assign_closing_order(ExecutionId(10), OrderId(7));

        // Closing order not visible yet: nothing closes.
        assert_eq!(ledger.mark_closed(&snap), 0);
        assert!(ledger.get(ExecutionId(10)).unwrap().is_open());

        let snap = snapshot(vec![
            buy_order(1, vec![(10, 100, 500)]),
            sell_order(7, OrderStatus::Filled, 500, 500, 102),
        ]);
        assert_eq!(ledger.mark_closed(&snap), 1);
        assert_eq!(ledger.mark_closed(&snap), 0);
        assert!(!ledger.get(ExecutionId(10)).unwrap().is_open());
    }

    #[test]
    fn test_remaining_budget_releases_on_sell_fills() {
        let capital = Amount::from_scaled(1_000_000);
        let mut ledger = PositionLedger::new();
        let tracked = [OrderId(1)];

        let snap = snapshot(vec![buy_order(1, vec![(10, 100_000_001, 5_000)])]);
        ledger.detect_new_positions(&snap, &tracked);

        // Committed: 5000 * 1.00000001 truncated = 5000.
        let committed = Amount::from_scaled(5_000);
        assert_eq!(
            ledger.remaining_budget(capital, &snap),
            capital - committed
        );

        // A half-filled closing order releases half the notional.
        ledger.assign_closing_order(ExecutionId(10), OrderId(9));
        let snap = snapshot(vec![
            buy_order(1, vec![(10, 100_000_001, 5_000)]),
            sell_order(9, OrderStatus::Live, 5_000, 2_500, 102),
        ]);
        let released = Amount::from_scaled(2_500).multiply(Amount::from_scaled(100_000_001));
        assert_eq!(
            ledger.remaining_budget(capital, &snap),
            capital - committed + released
        );

        // Fully filled and marked closed: budget returns to capital.
        let snap = snapshot(vec![
            buy_order(1, vec![(10, 100_000_001, 5_000)]),
            sell_order(9, OrderStatus::Filled, 5_000, 5_000, 102),
        ]);
        ledger.mark_closed(&snap);
        assert_eq!(ledger.remaining_budget(capital, &snap), capital);
    }

    #[test]
    fn test_try_merge_without_closing_order() {
        let mut ledger = PositionLedger::new();
        let tracked = [OrderId(1)];
        let snap = snapshot(vec![buy_order(
            1,
            vec![(10, 100, 500), (11, 100, 300)],
        )]);
        ledger.detect_new_positions(&snap, &tracked);

        let before: Amount = ledger.positions().iter().map(|p| p.quantity).sum();
        let result = ledger.try_merge(ExecutionId(11), &snap).unwrap();
        assert_eq!(result.absorbed_by, ExecutionId(10));
        assert!(result.resize.is_none());

        let after: Amount = ledger.positions().iter().map(|p| p.quantity).sum();
        assert_eq!(before, after);
        assert_eq!(
            ledger.get(ExecutionId(10)).unwrap().quantity,
            Amount::from_scaled(800)
        );
        let source = ledger.get(ExecutionId(11)).unwrap();
        assert!(source.closed);
        assert!(source.quantity.is_zero());
    }

    #[test]
    fn test_try_merge_resizes_editable_closing_order() {
        let mut ledger = PositionLedger::new();
        let tracked = [OrderId(1)];
        let snap = snapshot(vec![
            buy_order(1, vec![(10, 100, 500), (11, 100, 300)]),
            sell_order(5, OrderStatus::Live, 500, 0, 110),
        ]);
        ledger.detect_new_positions(&snap, &tracked);
        ledger.assign_closing_order(ExecutionId(10), OrderId(5));

        let result = ledger.try_merge(ExecutionId(11), &snap).unwrap();
        let resize = result.resize.unwrap();
        assert_eq!(resize.order_id, OrderId(5));
        assert_eq!(resize.quantity, Amount::from_scaled(800));
        assert_eq!(resize.price, Amount::from_scaled(110));
    }

    #[test]
    fn test_try_merge_refuses_unmergeable_candidates() {
        let mut ledger = PositionLedger::new();
        let tracked = [OrderId(1)];
        let snap = snapshot(vec![
            // Same price twice, different price once.
            buy_order(1, vec![(10, 100, 500), (11, 101, 300), (12, 100, 200)]),
            // Candidate 10's closing order is partially filled: not editable.
            sell_order(5, OrderStatus::Live, 500, 100, 110),
        ]);
        ledger.detect_new_positions(&snap, &tracked);
        ledger.assign_closing_order(ExecutionId(10), OrderId(5));

        // Different opening price: no candidate at all for 11.
        assert!(ledger.try_merge(ExecutionId(11), &snap).is_none());
        // Price matches 10, but its closing order cannot be edited.
        assert!(ledger.try_merge(ExecutionId(12), &snap).is_none());
        // A source that already has a closing order refuses to merge.
        ledger.assign_closing_order(ExecutionId(12), OrderId(6));
        assert!(ledger.try_merge(ExecutionId(12), &snap).is_none());
    }
}
