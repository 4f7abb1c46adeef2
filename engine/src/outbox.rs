//! Transactional outbox for trade events.
//!
//! Settlement appends one event per trade inside its transaction, so an
//! event exists exactly when its trade committed. A publisher worker drains
//! the outbox afterwards; nothing is ever published from inside the
//! critical section.

use chrono::{DateTime, Utc};
use matchbook::{OrderId, Price, Size, Ticker, TradeId, UserId};

/// A committed trade, ready for downstream publication.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TradeEvent {
    pub trade_id: TradeId,
    pub asset: Ticker,
    pub price: Price,
    pub size: Size,
    pub buy_order: OrderId,
    pub sell_order: OrderId,
    pub buyer: UserId,
    pub seller: UserId,
    pub executed_at: DateTime<Utc>,
}
