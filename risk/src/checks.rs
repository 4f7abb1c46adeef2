//! The pre-trade checks, in gate order.

use matchbook::{Money, Order, OrderType, Price, Side, Size};

use crate::config::RiskLimits;
use crate::report::{Admission, RejectReason};

/// The consistent account snapshot a gate decision reads.
///
/// Assembled by the engine inside the asset's critical section, so every
/// field reflects the same instant.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccountView {
    /// Cash available for new buys after existing reservations
    pub buying_power: Money,
    /// Signed position quantity in the order's asset
    pub position_qty: Size,
    /// The user's pending or part-filled orders, across all assets
    pub open_orders: u32,
    /// Fills the user participated in since UTC midnight
    pub fills_today: u32,
    /// Realized P&L since UTC midnight (sell revenue minus buy cost)
    pub pnl_today: Money,
}

/// The price a market order is checked against: the best opposite quote.
fn check_price(order: &Order, reference: Option<Price>) -> Result<Price, RejectReason> {
    match order.kind {
        OrderType::Limit => Ok(order.price),
        OrderType::Market => reference.ok_or(RejectReason::NoReferencePrice),
    }
}

/// Assess an order against the user's limits. First failing check wins.
///
/// A disabled gate admits everything, but still computes the buy-side
/// reservation when a price is available — the buying-power ledger runs
/// whether or not the limits do.
pub fn assess(
    order: &Order,
    reference: Option<Price>,
    view: &AccountView,
    limits: &RiskLimits,
) -> Result<Admission, RejectReason> {
    if !limits.enabled {
        let reserve = match (order.side, check_price(order, reference)) {
            (Side::Buy, Ok(price)) => {
                Some(price.checked_mul(order.size_original)?.round_cents())
            }
            _ => None,
        };
        return Ok(Admission { reserve });
    }

    let price = check_price(order, reference)?;
    let notional = price.checked_mul(order.size_original)?;

    // 1. Single-order value
    if notional > limits.max_order_size {
        return Err(RejectReason::OrderValueExceedsLimit {
            notional,
            limit: limits.max_order_size,
        });
    }

    // 2. Projected position value
    let projected_qty = match order.side {
        Side::Buy => view.position_qty.checked_add(order.size_original)?,
        Side::Sell => view.position_qty.checked_sub(order.size_original)?,
    };
    let projected = price.checked_mul(projected_qty.abs())?;
    if projected > limits.max_position_size {
        return Err(RejectReason::PositionExceedsLimit {
            notional: projected,
            limit: limits.max_position_size,
        });
    }

    // 3. Daily fill count
    if view.fills_today >= limits.max_daily_trades {
        return Err(RejectReason::DailyTradeLimit {
            limit: limits.max_daily_trades,
        });
    }

    // 4. Open order count
    if view.open_orders >= limits.max_open_orders {
        return Err(RejectReason::OpenOrderLimit {
            limit: limits.max_open_orders,
        });
    }

    // 5. Daily loss
    if view.pnl_today.is_negative() {
        let loss = Money(-view.pnl_today.0);
        if loss >= limits.max_daily_loss {
            return Err(RejectReason::DailyLossLimit {
                pnl: view.pnl_today,
                limit: limits.max_daily_loss,
            });
        }
    }

    // 6. Buying power (buys only); this amount becomes the reservation
    let reserve = match order.side {
        Side::Buy => {
            let required = notional.round_cents();
            if view.buying_power < required {
                return Err(RejectReason::InsufficientBuyingPower {
                    required,
                    available: view.buying_power,
                });
            }
            Some(required)
        }
        Side::Sell => None,
    };

    Ok(Admission { reserve })
}
