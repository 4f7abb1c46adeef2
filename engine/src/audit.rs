//! Append-only audit trail.
//!
//! Every material event — admissions, fills, cancels, rejections, position
//! changes — lands here as one structured entry, written inside the same
//! transaction as the state change it describes.

use chrono::{DateTime, Utc};
use matchbook::{Order, UserId};
use serde_json::json;

use crate::store::TradeRow;

/// Audit action types, serialized with their wire names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditAction {
    OrderCreated,
    OrderFilled,
    OrderCancelled,
    OrderRejected,
    TradeExecuted,
    PositionOpened,
    PositionClosed,
    RiskLimitViolated,
}

impl AuditAction {
    /// Wire-stable action string.
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::OrderCreated => "ORDER_CREATED",
            AuditAction::OrderFilled => "ORDER_FILLED",
            AuditAction::OrderCancelled => "ORDER_CANCELLED",
            AuditAction::OrderRejected => "ORDER_REJECTED",
            AuditAction::TradeExecuted => "TRADE_EXECUTED",
            AuditAction::PositionOpened => "POSITION_OPENED",
            AuditAction::PositionClosed => "POSITION_CLOSED",
            AuditAction::RiskLimitViolated => "RISK_LIMIT_VIOLATED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for AuditAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One audit entry. `user` is `None` for system actions such as
/// `TRADE_EXECUTED`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AuditRow {
    pub id: u64,
    pub user: Option<UserId>,
    pub action: AuditAction,
    pub details: serde_json::Value,
    pub ts: DateTime<Utc>,
}

/// Detail payload describing an order.
pub(crate) fn order_details(order: &Order) -> serde_json::Value {
    json!({
        "order_id": order.id.0,
        "side": order.side.to_string(),
        "order_type": order.kind.to_string(),
        "price": order.price.to_string(),
        "size": order.size_original.to_string(),
    })
}

/// Detail payload describing a trade.
pub(crate) fn trade_details(trade: &TradeRow) -> serde_json::Value {
    json!({
        "trade_id": trade.id.0,
        "seq": trade.seq,
        "price": trade.price.to_string(),
        "size": trade.size.to_string(),
        "buyer": trade.buyer.0,
        "seller": trade.seller.0,
        "buy_order_id": trade.buy_order.0,
        "sell_order_id": trade.sell_order.0,
    })
}
