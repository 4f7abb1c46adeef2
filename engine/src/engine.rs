//! The engine coordinator: per-asset serialization of risk → match → settle.
//!
//! Each asset's book lives behind its own mutex, and that guard is held for
//! the whole submit-match-settle-commit sequence, so time priority, the risk
//! snapshot, and per-asset trade sequencing can never be torn by
//! interleaving. Operations on different assets run in parallel; the store
//! lock is always taken after the asset guard, never before.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use rustc_hash::FxHashMap;
use serde_json::json;

use matchbook::{
    AssetBook, AssetId, DepthLevel, Money, Order, OrderId, OrderRequest, OrderStatus, Price, Seq,
    Side, Size, Ticker, TradeId, UserId,
};
use matchbook_risk::{AccountView, RejectReason, RiskLimits, assess};

use crate::audit::{self, AuditAction, AuditRow};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::outbox::TradeEvent;
use crate::settlement;
use crate::store::{OrderRow, Portfolio, Position, Store, TradeRow};

/// One fill reported back to the submitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Fill {
    pub trade_id: TradeId,
    pub price: Price,
    pub size: Size,
}

/// Response to a successful order submission.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SubmitReport {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub fills: Vec<Fill>,
}

/// Response to a successful cancellation.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CancelReport {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Size that was still open when cancelled
    pub cancelled_size: Size,
    /// Buying power returned to the owner (buys only)
    pub released: Money,
}

/// Aggregated depth plus the asset's tape position.
#[derive(Clone, Debug, serde::Serialize)]
pub struct DepthSnapshot {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub last_price: Option<Price>,
    pub seq: Seq,
}

/// How a submission resolved inside the transaction.
enum Submission {
    Accepted { status: OrderStatus, fills: Vec<Fill> },
    Rejected(RejectReason),
    NoLiquidity,
}

/// The exchange engine.
///
/// Shared across threads behind an `Arc`; all methods take `&self`.
pub struct Engine {
    config: EngineConfig,
    books: RwLock<FxHashMap<AssetId, Arc<Mutex<AssetBook>>>>,
    store: Mutex<Store>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            books: RwLock::new(FxHashMap::default()),
            store: Mutex::new(Store::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Asset registry ===

    /// List a new asset and create its empty book.
    pub fn register_asset(&self, ticker: &str, name: &str) -> Result<AssetId> {
        let ticker =
            Ticker::new(ticker).ok_or_else(|| EngineError::InvalidTicker(ticker.to_string()))?;
        let id = self.store()?.insert_asset(ticker, name)?;
        self.books
            .write()
            .map_err(|_| EngineError::internal("book registry poisoned"))?
            .insert(id, Arc::new(Mutex::new(AssetBook::new())));
        log::info!("listed {ticker} as {id}");
        Ok(id)
    }

    // === Order submission ===

    /// Submit an order: risk gate, match, settle, commit — one atomic unit
    /// under the asset's guard.
    pub fn submit_order(
        &self,
        user: UserId,
        ticker: &str,
        request: OrderRequest,
    ) -> Result<SubmitReport> {
        let (asset, ticker) = self.resolve_asset(ticker)?;
        let handle = self.book_handle(asset)?;
        let mut book = lock_book(&handle)?;
        let mut store = self.store()?;

        let order_id = store.next_order_id();
        let priority = store.next_priority();
        let order = Order::new(order_id, user, asset, request, priority);
        let reference = book.best_opposite(order.side);
        let now = Utc::now();

        log::debug!(
            "submit {order_id} {user} {ticker} {} {} {} @ {}",
            order.side,
            order.kind,
            order.size_original,
            order.price
        );

        let backup = book.clone();
        let config = &self.config;
        let outcome = store.transaction(|s| {
            s.ensure_portfolio(user, config.initial_cash);
            let limits = s.ensure_limits(user, &config.default_limits).clone();

            // A market order facing an empty opposite side can never fill;
            // reject it before the gate reserves anything.
            if order.kind == matchbook::OrderType::Market && reference.is_none() {
                let mut row = OrderRow::new(order.clone(), now);
                row.order.status = OrderStatus::Rejected;
                s.insert_order(row);
                s.append_audit(
                    Some(user),
                    AuditAction::OrderRejected,
                    json!({
                        "order_id": order_id.0,
                        "rejection_reason": "no liquidity for market order",
                    }),
                    now,
                );
                return Ok(Submission::NoLiquidity);
            }

            let view = account_view(s, user, asset, now)?;

            let admission = match assess(&order, reference, &view, &limits) {
                Ok(admission) => admission,
                Err(reason) => {
                    let mut row = OrderRow::new(order.clone(), now);
                    row.order.status = OrderStatus::Rejected;
                    s.insert_order(row);
                    reject_audit(s, &order, &reason, now);
                    return Ok(Submission::Rejected(reason));
                }
            };

            s.insert_order(OrderRow::new(order.clone(), now));
            if let Some(reserve) = admission.reserve {
                let portfolio = s
                    .portfolio_mut(user)
                    .ok_or_else(|| EngineError::internal("portfolio vanished"))?;
                portfolio.buying_power = portfolio.buying_power.checked_sub(reserve)?;
                s.set_reservation(order_id, reserve);
            }
            s.append_audit(
                Some(user),
                AuditAction::OrderCreated,
                audit::order_details(&order),
                now,
            );

            let placement = book.place(order.clone());
            // A market order that passed the pre-check has a crossing maker
            debug_assert!(!placement.no_liquidity());

            let fills = settlement::settle(s, &placement, ticker, now)?;
            Ok(Submission::Accepted {
                status: placement.order.status,
                fills,
            })
        });

        match outcome {
            Ok(Submission::Accepted { status, fills }) => {
                log::info!("order {order_id} {status}, {} fill(s)", fills.len());
                Ok(SubmitReport {
                    order_id,
                    status,
                    fills,
                })
            }
            Ok(Submission::Rejected(reason)) => {
                log::info!("order {order_id} rejected: {reason}");
                Err(reason.into())
            }
            Ok(Submission::NoLiquidity) => {
                log::info!("order {order_id} rejected: no liquidity");
                Err(EngineError::NoLiquidity)
            }
            Err(err) => {
                // The store rolled back; put the book back with it.
                *book = backup;
                log::error!("submit {order_id} rolled back: {err}");
                Err(err)
            }
        }
    }

    // === Cancellation ===

    /// Cancel an open order, restoring any reserved buying power.
    pub fn cancel_order(&self, user: UserId, order_id: OrderId) -> Result<CancelReport> {
        // Find the asset first, then re-check everything under its guard.
        let asset = {
            let store = self.store()?;
            store
                .order(order_id)
                .ok_or(EngineError::OrderNotFound(order_id))?
                .order
                .asset
        };
        let handle = self.book_handle(asset)?;
        let mut book = lock_book(&handle)?;
        let mut store = self.store()?;

        let row = store
            .order(order_id)
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if row.order.user != user {
            return Err(EngineError::Forbidden(order_id));
        }
        if !row.order.status.is_open() {
            return Err(EngineError::NotCancellable(order_id, row.order.status));
        }

        let now = Utc::now();
        let backup = book.clone();
        let outcome = store.transaction(|s| {
            let removed = book
                .remove(order_id)
                .map_err(|_| EngineError::internal(format!("open order {order_id} not in book")))?;

            let row = s
                .order_mut(order_id)
                .ok_or_else(|| EngineError::internal("order row vanished"))?;
            row.order.status = OrderStatus::Cancelled;
            row.updated_at = now;
            let order = row.order.clone();

            let released = if order.side == Side::Buy {
                settlement::release_reservation(s, user, order_id)?
            } else {
                Money::ZERO
            };

            s.append_audit(
                Some(user),
                AuditAction::OrderCancelled,
                audit::order_details(&order),
                now,
            );

            Ok(CancelReport {
                order_id,
                status: OrderStatus::Cancelled,
                cancelled_size: removed.size_remaining,
                released,
            })
        });

        match outcome {
            Ok(report) => {
                log::info!(
                    "order {order_id} cancelled, released {}",
                    report.released
                );
                Ok(report)
            }
            Err(err) => {
                *book = backup;
                log::error!("cancel {order_id} rolled back: {err}");
                Err(err)
            }
        }
    }

    // === Market data ===

    /// Snapshot the top `levels` of the asset's book. Read-only.
    pub fn depth(&self, ticker: &str, levels: usize) -> Result<DepthSnapshot> {
        let (asset, _) = self.resolve_asset(ticker)?;
        let handle = self.book_handle(asset)?;
        let book = lock_book(&handle)?;
        let depth = book.depth(levels)?;
        let store = self.store()?;
        let stats = store.stats(asset);
        Ok(DepthSnapshot {
            bids: depth.bids,
            asks: depth.asks,
            last_price: stats.last_price,
            seq: store.last_seq(asset),
        })
    }

    // === Outbox ===

    /// Drain committed trade events for downstream publication.
    pub fn drain_events(&self) -> Result<Vec<TradeEvent>> {
        Ok(self.store()?.drain_events())
    }

    // === Account access ===

    pub fn portfolio(&self, user: UserId) -> Result<Option<Portfolio>> {
        Ok(self.store()?.portfolio(user).copied())
    }

    pub fn position(&self, user: UserId, ticker: &str) -> Result<Option<Position>> {
        let (asset, _) = self.resolve_asset(ticker)?;
        Ok(self.store()?.position(user, asset).copied())
    }

    pub fn risk_limits(&self, user: UserId) -> Result<Option<RiskLimits>> {
        Ok(self.store()?.limits(user).cloned())
    }

    /// Replace a user's risk limits. Refuses limits that fail validation.
    pub fn set_risk_limits(&self, user: UserId, limits: RiskLimits) -> Result<()> {
        limits
            .validate()
            .map_err(|msg| EngineError::internal(format!("invalid risk limits: {msg}")))?;
        self.store()?.set_limits(user, limits);
        Ok(())
    }

    pub fn order(&self, order_id: OrderId) -> Result<Option<OrderRow>> {
        Ok(self.store()?.order(order_id).cloned())
    }

    pub fn trades(&self, ticker: &str) -> Result<Vec<TradeRow>> {
        let (asset, _) = self.resolve_asset(ticker)?;
        Ok(self.store()?.trades_for_asset(asset))
    }

    pub fn audit_log(&self) -> Result<Vec<AuditRow>> {
        Ok(self.store()?.audit().to_vec())
    }

    /// Sum of every outstanding buy reservation (conservation checks).
    pub fn total_reserved(&self) -> Result<Money> {
        Ok(self.store()?.total_reserved())
    }

    // === Internals ===

    fn resolve_asset(&self, ticker: &str) -> Result<(AssetId, Ticker)> {
        let parsed =
            Ticker::new(ticker).ok_or_else(|| EngineError::AssetNotFound(ticker.to_string()))?;
        let store = self.store()?;
        let row = store
            .asset_by_ticker(parsed)
            .ok_or_else(|| EngineError::AssetNotFound(ticker.to_string()))?;
        Ok((row.id, row.ticker))
    }

    fn book_handle(&self, asset: AssetId) -> Result<Arc<Mutex<AssetBook>>> {
        self.books
            .read()
            .map_err(|_| EngineError::internal("book registry poisoned"))?
            .get(&asset)
            .cloned()
            .ok_or_else(|| EngineError::internal(format!("no book for {asset}")))
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|_| EngineError::internal("store lock poisoned"))
    }
}

fn lock_book(handle: &Arc<Mutex<AssetBook>>) -> Result<MutexGuard<'_, AssetBook>> {
    handle
        .lock()
        .map_err(|_| EngineError::internal("asset guard poisoned"))
}

/// Assemble the consistent account snapshot the risk gate reads.
fn account_view(
    store: &Store,
    user: UserId,
    asset: AssetId,
    now: chrono::DateTime<Utc>,
) -> Result<AccountView> {
    let today = now.date_naive();
    Ok(AccountView {
        buying_power: store
            .portfolio(user)
            .map(|p| p.buying_power)
            .unwrap_or(Money::ZERO),
        position_qty: store
            .position(user, asset)
            .map(|p| p.quantity)
            .unwrap_or(Size::ZERO),
        open_orders: store.open_order_count(user),
        fills_today: store.fills_today(user, today),
        pnl_today: store.pnl_today(user, today)?,
    })
}

/// Audit a gate rejection: always `ORDER_REJECTED`, plus
/// `RISK_LIMIT_VIOLATED` when an actual limit fired (as opposed to a
/// missing quote or arithmetic overflow).
fn reject_audit(
    store: &mut Store,
    order: &Order,
    reason: &RejectReason,
    now: chrono::DateTime<Utc>,
) {
    let mut details = audit::order_details(order);
    details["rejection_reason"] = json!(reason.to_string());
    store.append_audit(Some(order.user), AuditAction::OrderRejected, details, now);

    if !matches!(
        reason,
        RejectReason::NoReferencePrice | RejectReason::Overflow
    ) {
        store.append_audit(
            Some(order.user),
            AuditAction::RiskLimitViolated,
            json!({
                "order_id": order.id.0,
                "violation": reason.to_string(),
            }),
            now,
        );
    }
}
