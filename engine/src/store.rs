//! In-memory entity store with transactional rollback.
//!
//! Tables mirror the persisted schema: assets, orders, trades, portfolios,
//! positions, risk limits, reservations, the audit log, and the outbox.
//! [`Store::transaction`] snapshots the whole store and restores it if the
//! closure fails, so a settlement either commits every row or none.

use chrono::{DateTime, NaiveDate, Utc};
use rustc_hash::FxHashMap;

use matchbook::{
    AssetId, Money, Order, OrderId, Price, Seq, Size, Ticker, Timestamp, TradeId, UserId,
};
use matchbook_risk::RiskLimits;

use crate::audit::{AuditAction, AuditRow};
use crate::error::{EngineError, Result};
use crate::outbox::TradeEvent;

/// A listed asset. Never mutated after creation; per-asset statistics live
/// in [`MarketStats`].
#[derive(Clone, Debug, serde::Serialize)]
pub struct AssetRow {
    pub id: AssetId,
    pub ticker: Ticker,
    pub name: String,
}

/// Rolling per-asset market statistics.
#[derive(Clone, Copy, Debug, Default, serde::Serialize)]
pub struct MarketStats {
    pub last_price: Option<Price>,
    pub volume: Size,
}

/// A persisted order with its wall-clock lifecycle timestamps.
#[derive(Clone, Debug, serde::Serialize)]
pub struct OrderRow {
    pub order: Order,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the order reaches `Filled`
    pub executed_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    pub fn new(order: Order, now: DateTime<Utc>) -> Self {
        Self {
            order,
            created_at: now,
            updated_at: now,
            executed_at: None,
        }
    }
}

/// An executed trade. Immutable; `seq` is gap-free per asset.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TradeRow {
    pub id: TradeId,
    pub asset: AssetId,
    pub seq: Seq,
    pub buy_order: OrderId,
    pub sell_order: OrderId,
    pub buyer: UserId,
    pub seller: UserId,
    pub price: Price,
    pub size: Size,
    pub executed_at: DateTime<Utc>,
}

/// A user's cash account.
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct Portfolio {
    pub user: UserId,
    pub cash_balance: Money,
    /// Cash available for new buys after outstanding reservations
    pub buying_power: Money,
}

/// A long position in one asset. Deleted when flat.
#[derive(Clone, Copy, Debug, serde::Serialize)]
pub struct Position {
    pub user: UserId,
    pub asset: AssetId,
    pub quantity: Size,
    /// Volume-weighted average acquisition cost, scale 4
    pub average_cost: Money,
}

/// The whole entity store. `Clone` is the transaction snapshot.
#[derive(Clone, Debug, Default)]
pub struct Store {
    assets: FxHashMap<AssetId, AssetRow>,
    tickers: FxHashMap<Ticker, AssetId>,
    stats: FxHashMap<AssetId, MarketStats>,
    orders: FxHashMap<OrderId, OrderRow>,
    trades: Vec<TradeRow>,
    portfolios: FxHashMap<UserId, Portfolio>,
    positions: FxHashMap<(UserId, AssetId), Position>,
    limits: FxHashMap<UserId, RiskLimits>,
    /// Outstanding buy-side buying-power reservations by order
    reservations: FxHashMap<OrderId, Money>,
    audit: Vec<AuditRow>,
    outbox: Vec<TradeEvent>,
    next_asset_id: u32,
    next_order_id: u64,
    next_trade_id: u64,
    next_audit_id: u64,
    next_priority: Timestamp,
    next_seq: FxHashMap<AssetId, Seq>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` atomically: on `Err` every table is restored to its state at
    /// entry.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    // === Assets ===

    pub fn insert_asset(&mut self, ticker: Ticker, name: &str) -> Result<AssetId> {
        if self.tickers.contains_key(&ticker) {
            return Err(EngineError::DuplicateTicker(ticker));
        }
        self.next_asset_id += 1;
        let id = AssetId(self.next_asset_id);
        self.assets.insert(
            id,
            AssetRow {
                id,
                ticker,
                name: name.to_string(),
            },
        );
        self.tickers.insert(ticker, id);
        self.stats.insert(id, MarketStats::default());
        Ok(id)
    }

    pub fn asset(&self, id: AssetId) -> Option<&AssetRow> {
        self.assets.get(&id)
    }

    pub fn asset_by_ticker(&self, ticker: Ticker) -> Option<&AssetRow> {
        self.tickers.get(&ticker).and_then(|id| self.assets.get(id))
    }

    pub fn stats(&self, id: AssetId) -> MarketStats {
        self.stats.get(&id).copied().unwrap_or_default()
    }

    pub fn stats_mut(&mut self, id: AssetId) -> &mut MarketStats {
        self.stats.entry(id).or_default()
    }

    // === Id generation ===

    pub fn next_order_id(&mut self) -> OrderId {
        self.next_order_id += 1;
        OrderId(self.next_order_id)
    }

    /// Allocate the next trade id and the asset's next sequence number.
    pub fn next_trade(&mut self, asset: AssetId) -> (TradeId, Seq) {
        self.next_trade_id += 1;
        let seq = self.next_seq.entry(asset).or_insert(0);
        *seq += 1;
        (TradeId(self.next_trade_id), *seq)
    }

    /// The latest committed sequence number for an asset (0 before any trade).
    pub fn last_seq(&self, asset: AssetId) -> Seq {
        self.next_seq.get(&asset).copied().unwrap_or(0)
    }

    /// Next logical priority timestamp for time ordering.
    pub fn next_priority(&mut self) -> Timestamp {
        self.next_priority += 1;
        self.next_priority
    }

    // === Orders ===

    pub fn insert_order(&mut self, row: OrderRow) {
        self.orders.insert(row.order.id, row);
    }

    pub fn order(&self, id: OrderId) -> Option<&OrderRow> {
        self.orders.get(&id)
    }

    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut OrderRow> {
        self.orders.get_mut(&id)
    }

    /// Count of the user's pending or part-filled orders across all assets.
    pub fn open_order_count(&self, user: UserId) -> u32 {
        self.orders
            .values()
            .filter(|row| row.order.user == user && row.order.status.is_open())
            .count() as u32
    }

    // === Trades ===

    pub fn insert_trade(&mut self, row: TradeRow) {
        self.trades.push(row);
    }

    pub fn trades(&self) -> &[TradeRow] {
        &self.trades
    }

    pub fn trades_for_asset(&self, asset: AssetId) -> Vec<TradeRow> {
        self.trades
            .iter()
            .filter(|t| t.asset == asset)
            .cloned()
            .collect()
    }

    /// Fills the user participated in on `day` (UTC). A self-trade counts
    /// once per role, like the buyer/seller tallies it mirrors.
    pub fn fills_today(&self, user: UserId, day: NaiveDate) -> u32 {
        self.trades
            .iter()
            .filter(|t| t.executed_at.date_naive() == day)
            .map(|t| (t.buyer == user) as u32 + (t.seller == user) as u32)
            .sum()
    }

    /// Realized P&L on `day`: sell revenue minus buy cost, in the same
    /// rounded cents that moved through the cash ledger.
    pub fn pnl_today(&self, user: UserId, day: NaiveDate) -> Result<Money> {
        let mut pnl = Money::ZERO;
        for trade in &self.trades {
            if trade.executed_at.date_naive() != day {
                continue;
            }
            let gross = trade.price.checked_mul(trade.size)?.round_cents();
            if trade.seller == user {
                pnl = pnl.checked_add(gross)?;
            }
            if trade.buyer == user {
                pnl = pnl.checked_sub(gross)?;
            }
        }
        Ok(pnl)
    }

    // === Portfolios and positions ===

    /// Get the user's portfolio, creating it with `initial_cash` on first
    /// activity.
    pub fn ensure_portfolio(&mut self, user: UserId, initial_cash: Money) -> &mut Portfolio {
        self.portfolios.entry(user).or_insert_with(|| Portfolio {
            user,
            cash_balance: initial_cash,
            buying_power: initial_cash,
        })
    }

    pub fn portfolio(&self, user: UserId) -> Option<&Portfolio> {
        self.portfolios.get(&user)
    }

    pub fn portfolio_mut(&mut self, user: UserId) -> Option<&mut Portfolio> {
        self.portfolios.get_mut(&user)
    }

    pub fn position(&self, user: UserId, asset: AssetId) -> Option<&Position> {
        self.positions.get(&(user, asset))
    }

    pub fn set_position(&mut self, position: Position) {
        self.positions
            .insert((position.user, position.asset), position);
    }

    pub fn remove_position(&mut self, user: UserId, asset: AssetId) -> Option<Position> {
        self.positions.remove(&(user, asset))
    }

    pub fn positions_for(&self, user: UserId) -> Vec<Position> {
        self.positions
            .values()
            .filter(|p| p.user == user)
            .copied()
            .collect()
    }

    // === Risk limits ===

    /// Get the user's limits, seeding `defaults` on first access.
    pub fn ensure_limits(&mut self, user: UserId, defaults: &RiskLimits) -> &RiskLimits {
        self.limits.entry(user).or_insert_with(|| defaults.clone())
    }

    pub fn limits(&self, user: UserId) -> Option<&RiskLimits> {
        self.limits.get(&user)
    }

    pub fn set_limits(&mut self, user: UserId, limits: RiskLimits) {
        self.limits.insert(user, limits);
    }

    // === Reservations ===

    pub fn reservation(&self, order: OrderId) -> Money {
        self.reservations.get(&order).copied().unwrap_or(Money::ZERO)
    }

    pub fn set_reservation(&mut self, order: OrderId, amount: Money) {
        self.reservations.insert(order, amount);
    }

    /// Consume up to `requested` from the order's outstanding reservation.
    /// Returns the amount actually consumed.
    pub fn consume_reservation(&mut self, order: OrderId, requested: Money) -> Money {
        let Some(remaining) = self.reservations.get_mut(&order) else {
            return Money::ZERO;
        };
        let consumed = Money(requested.0.min(remaining.0).max(0));
        remaining.0 -= consumed.0;
        consumed
    }

    /// Remove and return whatever reservation is left for the order.
    pub fn take_reservation(&mut self, order: OrderId) -> Money {
        self.reservations.remove(&order).unwrap_or(Money::ZERO)
    }

    /// Sum of all outstanding reservations (conservation checks).
    pub fn total_reserved(&self) -> Money {
        Money(self.reservations.values().map(|m| m.0).sum())
    }

    // === Audit ===

    pub fn append_audit(
        &mut self,
        user: Option<UserId>,
        action: AuditAction,
        details: serde_json::Value,
        ts: DateTime<Utc>,
    ) {
        self.next_audit_id += 1;
        self.audit.push(AuditRow {
            id: self.next_audit_id,
            user,
            action,
            details,
            ts,
        });
    }

    pub fn audit(&self) -> &[AuditRow] {
        &self.audit
    }

    // === Outbox ===

    pub fn push_event(&mut self, event: TradeEvent) {
        self.outbox.push(event);
    }

    /// Hand all pending events to the publisher, clearing the outbox.
    pub fn drain_events(&mut self) -> Vec<TradeEvent> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbook::{OrderRequest, Side};

    fn aapl(store: &mut Store) -> AssetId {
        store
            .insert_asset(Ticker::new("AAPL").unwrap(), "Apple Inc.")
            .unwrap()
    }

    fn trade(asset: AssetId, buyer: u32, seller: u32, price: i64, size: i64) -> TradeRow {
        TradeRow {
            id: TradeId(1),
            asset,
            seq: 1,
            buy_order: OrderId(1),
            sell_order: OrderId(2),
            buyer: UserId(buyer),
            seller: UserId(seller),
            price: Price(price),
            size: Size(size),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_ticker_is_refused() {
        let mut store = Store::new();
        aapl(&mut store);
        let err = store
            .insert_asset(Ticker::new("AAPL").unwrap(), "Apple again")
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateTicker(_)));
    }

    #[test]
    fn seq_is_per_asset() {
        let mut store = Store::new();
        let a = aapl(&mut store);
        let b = store
            .insert_asset(Ticker::new("MSFT").unwrap(), "Microsoft")
            .unwrap();

        assert_eq!(store.next_trade(a).1, 1);
        assert_eq!(store.next_trade(a).1, 2);
        assert_eq!(store.next_trade(b).1, 1);
        assert_eq!(store.last_seq(a), 2);
        assert_eq!(store.last_seq(b), 1);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let mut store = Store::new();
        let asset = aapl(&mut store);
        store.ensure_portfolio(UserId(1), Money(100_0000));

        let result: Result<()> = store.transaction(|s| {
            s.insert_trade(trade(asset, 1, 2, 100_00, 1_00));
            s.portfolio_mut(UserId(1)).unwrap().cash_balance = Money::ZERO;
            s.set_reservation(OrderId(9), Money(50_0000));
            Err(EngineError::internal("boom"))
        });

        assert!(result.is_err());
        assert!(store.trades().is_empty());
        assert_eq!(
            store.portfolio(UserId(1)).unwrap().cash_balance,
            Money(100_0000)
        );
        assert_eq!(store.reservation(OrderId(9)), Money::ZERO);
    }

    #[test]
    fn transaction_commits_on_ok() {
        let mut store = Store::new();
        let asset = aapl(&mut store);
        store
            .transaction(|s| {
                s.insert_trade(trade(asset, 1, 2, 100_00, 1_00));
                Ok(())
            })
            .unwrap();
        assert_eq!(store.trades().len(), 1);
    }

    #[test]
    fn open_order_count_ignores_terminal_orders() {
        let mut store = Store::new();
        let asset = aapl(&mut store);
        let now = Utc::now();

        let req = OrderRequest::limit(Side::Buy, Price(100_00), Size(1_00)).unwrap();
        let mut o1 = Order::new(store.next_order_id(), UserId(1), asset, req, 1);
        store.insert_order(OrderRow::new(o1.clone(), now));

        o1.id = store.next_order_id();
        o1.status = matchbook::OrderStatus::Filled;
        store.insert_order(OrderRow::new(o1.clone(), now));

        o1.id = store.next_order_id();
        o1.user = UserId(2);
        o1.status = matchbook::OrderStatus::Pending;
        store.insert_order(OrderRow::new(o1, now));

        assert_eq!(store.open_order_count(UserId(1)), 1);
        assert_eq!(store.open_order_count(UserId(2)), 1);
    }

    #[test]
    fn daily_counters_bucket_on_utc_date() {
        let mut store = Store::new();
        let asset = aapl(&mut store);
        let today = Utc::now().date_naive();

        let mut yesterday = trade(asset, 1, 2, 100_00, 1_00);
        yesterday.executed_at -= chrono::Duration::days(1);
        store.insert_trade(yesterday);
        store.insert_trade(trade(asset, 1, 2, 100_00, 1_00));
        store.insert_trade(trade(asset, 2, 1, 110_00, 1_00));

        assert_eq!(store.fills_today(UserId(1), today), 2);
        assert_eq!(store.fills_today(UserId(2), today), 2);

        // User 1 today: bought 1.00 @ 100, sold 1.00 @ 110 → +10.00
        assert_eq!(store.pnl_today(UserId(1), today).unwrap(), Money(10_0000));
        assert_eq!(store.pnl_today(UserId(2), today).unwrap(), Money(-10_0000));
    }

    #[test]
    fn self_trade_counts_both_roles() {
        let mut store = Store::new();
        let asset = aapl(&mut store);
        let today = Utc::now().date_naive();
        store.insert_trade(trade(asset, 7, 7, 100_00, 1_00));

        assert_eq!(store.fills_today(UserId(7), today), 2);
        assert_eq!(store.pnl_today(UserId(7), today).unwrap(), Money::ZERO);
    }

    #[test]
    fn reservation_consume_and_take() {
        let mut store = Store::new();
        store.set_reservation(OrderId(1), Money(100_0000));

        assert_eq!(
            store.consume_reservation(OrderId(1), Money(30_0000)),
            Money(30_0000)
        );
        // Requests above the remainder are clamped
        assert_eq!(
            store.consume_reservation(OrderId(1), Money(90_0000)),
            Money(70_0000)
        );
        assert_eq!(store.consume_reservation(OrderId(1), Money(1)), Money::ZERO);
        assert_eq!(store.take_reservation(OrderId(1)), Money::ZERO);

        store.set_reservation(OrderId(2), Money(5_0000));
        assert_eq!(store.take_reservation(OrderId(2)), Money(5_0000));
        assert_eq!(store.total_reserved(), Money::ZERO);
    }

    #[test]
    fn ensure_portfolio_seeds_once() {
        let mut store = Store::new();
        store.ensure_portfolio(UserId(1), Money(100_000_0000));
        store.portfolio_mut(UserId(1)).unwrap().cash_balance = Money(1_0000);

        let p = store.ensure_portfolio(UserId(1), Money(100_000_0000));
        assert_eq!(p.cash_balance, Money(1_0000));
    }
}
