//! Settlement: applying trade effects to accounts, positions, and the
//! audit trail.
//!
//! Runs entirely inside the coordinator's store transaction. Every step
//! either commits with the trade or rolls back with it; audit appends are
//! best effort and never trigger a second rollback.

use chrono::{DateTime, Utc};
use matchbook::{
    AssetId, Money, OrderId, OrderStatus, OrderType, Placement, Price, Side, Size, Ticker,
    TradeEffect, UserId,
};
use serde_json::json;

use crate::audit::{self, AuditAction};
use crate::engine::Fill;
use crate::error::{EngineError, Result};
use crate::outbox::TradeEvent;
use crate::store::{Position, Store, TradeRow};

/// Apply a placement's trade effects.
///
/// For each effect: write the trade row with the asset's next `seq`, update
/// both order rows, move positions and cash, consume the buyer's
/// reservation, and append the audit entries. Finally syncs the taker's row
/// to its post-match state and releases any reservation left on orders that
/// went terminal.
pub(crate) fn settle(
    store: &mut Store,
    placement: &Placement,
    ticker: Ticker,
    now: DateTime<Utc>,
) -> Result<Vec<Fill>> {
    let taker = &placement.order;
    let mut fills = Vec::with_capacity(placement.effects.len());

    for effect in &placement.effects {
        let fill = settle_effect(store, taker.id, taker.side, effect, taker.asset, ticker, now)?;
        fills.push(fill);
    }

    // Sync the taker's row to its final state.
    let row = store
        .order_mut(taker.id)
        .ok_or_else(|| EngineError::internal(format!("no row for taker {}", taker.id)))?;
    row.order = taker.clone();
    row.updated_at = now;
    if taker.status == OrderStatus::Filled {
        row.executed_at = Some(now);
    }
    if taker.status == OrderStatus::Filled {
        store.append_audit(
            Some(taker.user),
            AuditAction::OrderFilled,
            audit::order_details(taker),
            now,
        );
    }

    // A buy that can no longer fill has no claim on its leftover reservation.
    if taker.side == Side::Buy && taker.status.is_terminal() {
        release_reservation(store, taker.user, taker.id)?;
    }

    Ok(fills)
}

/// Settle one maker × taker fill.
fn settle_effect(
    store: &mut Store,
    taker_id: OrderId,
    taker_side: Side,
    effect: &TradeEffect,
    asset: AssetId,
    ticker: Ticker,
    now: DateTime<Utc>,
) -> Result<Fill> {
    let maker_order = store
        .order(effect.maker)
        .ok_or_else(|| EngineError::internal(format!("no row for maker {}", effect.maker)))?
        .order
        .clone();

    let (buy_order, sell_order, buyer, seller) = match taker_side {
        Side::Buy => (taker_id, effect.maker, taker_user(store, taker_id)?, maker_order.user),
        Side::Sell => (effect.maker, taker_id, maker_order.user, taker_user(store, taker_id)?),
    };

    // 1. The trade row, with the asset's next gap-free seq
    let (trade_id, seq) = store.next_trade(asset);
    let trade = TradeRow {
        id: trade_id,
        asset,
        seq,
        buy_order,
        sell_order,
        buyer,
        seller,
        price: effect.price,
        size: effect.size,
        executed_at: now,
    };
    log::debug!(
        "trade {trade_id} seq {seq}: {} {} @ {} ({buyer} from {seller})",
        ticker,
        effect.size,
        effect.price
    );
    store.insert_trade(trade.clone());

    // 2. Maker row mirrors the book mutation
    let maker_row = store
        .order_mut(effect.maker)
        .ok_or_else(|| EngineError::internal(format!("no row for maker {}", effect.maker)))?;
    maker_row.order.fill(effect.size);
    maker_row.updated_at = now;
    let maker_filled = maker_row.order.status == OrderStatus::Filled;
    if maker_filled {
        maker_row.executed_at = Some(now);
        let maker = maker_row.order.clone();
        store.append_audit(
            Some(maker.user),
            AuditAction::OrderFilled,
            audit::order_details(&maker),
            now,
        );
    }

    // 3. Positions: buyer gains at VWAP, seller sheds at unchanged cost
    apply_buy_position(store, buyer, asset, ticker, effect.size, effect.price, now)?;
    apply_sell_position(store, seller, asset, ticker, effect.size, now)?;

    // 4. Cash and buying power
    let gross = effect.price.checked_mul(effect.size)?.round_cents();
    let buy_side_order = if taker_side == Side::Buy {
        store
            .order(taker_id)
            .ok_or_else(|| EngineError::internal("taker row vanished"))?
            .order
            .clone()
    } else {
        maker_order
    };
    // The slice of the original reservation this fill stands on: priced at
    // the buy order's own limit; a market buy was reserved at an estimate,
    // so it consumes at the trade price.
    let basis = match buy_side_order.kind {
        OrderType::Limit => buy_side_order.price,
        OrderType::Market => effect.price,
    };
    let requested = basis.checked_mul(effect.size)?.round_cents();
    let consumed = store.consume_reservation(buy_side_order.id, requested);

    let buyer_pf = store
        .portfolio_mut(buyer)
        .ok_or_else(|| EngineError::internal(format!("no portfolio for buyer {buyer}")))?;
    buyer_pf.cash_balance = buyer_pf.cash_balance.checked_sub(gross)?;
    // Consumed reservation covers the spend; any improvement flows back
    buyer_pf.buying_power = buyer_pf.buying_power.checked_add(consumed)?.checked_sub(gross)?;

    let seller_pf = store
        .portfolio_mut(seller)
        .ok_or_else(|| EngineError::internal(format!("no portfolio for seller {seller}")))?;
    seller_pf.cash_balance = seller_pf.cash_balance.checked_add(gross)?;
    seller_pf.buying_power = seller_pf.buying_power.checked_add(gross)?;

    // 5. System audit entry for the trade
    store.append_audit(None, AuditAction::TradeExecuted, audit::trade_details(&trade), now);

    // 6. Market statistics
    let stats = store.stats_mut(asset);
    stats.last_price = Some(effect.price);
    stats.volume = stats.volume.checked_add(effect.size)?;

    // 7. Outbox event, inside the same transaction
    store.push_event(TradeEvent {
        trade_id,
        asset: ticker,
        price: effect.price,
        size: effect.size,
        buy_order,
        sell_order,
        buyer,
        seller,
        executed_at: now,
    });

    // A filled buy-side maker keeps no residual hold (per-fill rounding can
    // leave one behind)
    if maker_filled && buy_side_order.id == effect.maker {
        release_reservation(store, buyer, effect.maker)?;
    }

    Ok(Fill {
        trade_id,
        price: effect.price,
        size: effect.size,
    })
}

fn taker_user(store: &Store, taker_id: OrderId) -> Result<UserId> {
    Ok(store
        .order(taker_id)
        .ok_or_else(|| EngineError::internal(format!("no row for taker {taker_id}")))?
        .order
        .user)
}

/// Return an order's outstanding reservation to its owner's buying power.
/// Returns the released amount (zero when nothing was reserved).
pub(crate) fn release_reservation(
    store: &mut Store,
    user: UserId,
    order: OrderId,
) -> Result<Money> {
    let remaining = store.take_reservation(order);
    if remaining > Money::ZERO {
        let portfolio = store
            .portfolio_mut(user)
            .ok_or_else(|| EngineError::internal(format!("no portfolio for {user}")))?;
        portfolio.buying_power = portfolio.buying_power.checked_add(remaining)?;
    }
    Ok(remaining)
}

/// Buyer side of a fill: open or grow the position, recomputing the
/// volume-weighted average cost.
fn apply_buy_position(
    store: &mut Store,
    user: UserId,
    asset: AssetId,
    ticker: Ticker,
    size: Size,
    price: Price,
    now: DateTime<Utc>,
) -> Result<()> {
    match store.position(user, asset).copied() {
        None => {
            let position = Position {
                user,
                asset,
                quantity: size,
                average_cost: price.to_money()?,
            };
            store.set_position(position);
            store.append_audit(
                Some(user),
                AuditAction::PositionOpened,
                json!({
                    "asset": ticker.as_str(),
                    "quantity": size.to_string(),
                    "average_cost": position.average_cost.to_string(),
                }),
                now,
            );
        }
        Some(mut position) => {
            let old_cost = position.average_cost.checked_mul_size(position.quantity)?;
            let fill_cost = price.checked_mul(size)?;
            let new_qty = position.quantity.checked_add(size)?;
            position.average_cost = old_cost.checked_add(fill_cost)?.div_size(new_qty)?;
            position.quantity = new_qty;
            store.set_position(position);
        }
    }
    Ok(())
}

/// Seller side of a fill: shrink the position, deleting the row on flat.
/// Average cost never changes on a sale. Sales with no tracked position
/// (or past flat) leave no row behind.
fn apply_sell_position(
    store: &mut Store,
    user: UserId,
    asset: AssetId,
    ticker: Ticker,
    size: Size,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(mut position) = store.position(user, asset).copied() else {
        return Ok(());
    };
    let new_qty = position.quantity.checked_sub(size)?;
    if new_qty > Size::ZERO {
        position.quantity = new_qty;
        store.set_position(position);
    } else {
        store.remove_position(user, asset);
        store.append_audit(
            Some(user),
            AuditAction::PositionClosed,
            json!({
                "asset": ticker.as_str(),
                "final_quantity": new_qty.to_string(),
            }),
            now,
        );
    }
    Ok(())
}
