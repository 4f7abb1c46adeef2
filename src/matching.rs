//! Matching: crossing an incoming order against the book.
//!
//! Price-time priority throughout:
//! 1. Better prices fill first (higher bids, lower asks)
//! 2. Within a price, strict FIFO by arrival
//! 3. Trades execute at the resting (maker) order's price

use crate::decimal::{Price, Size};
use crate::order::{Order, OrderStatus, OrderType, Side};
use crate::types::OrderId;

use crate::book::AssetBook;

/// One fill produced by matching: maker × taker at the maker's price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TradeEffect {
    /// Resting order that was hit
    pub maker: OrderId,
    /// Incoming order that crossed
    pub taker: OrderId,
    /// Execution price (the maker's limit price)
    pub price: Price,
    /// Size exchanged
    pub size: Size,
    /// True if this fill consumed the maker entirely
    pub maker_done: bool,
}

/// Outcome of placing an order: the order's final state plus its fills.
#[derive(Clone, Debug)]
pub struct Placement {
    pub order: Order,
    pub effects: Vec<TradeEffect>,
}

impl Placement {
    /// Total size filled across all effects.
    pub fn filled_size(&self) -> Size {
        Size(self.effects.iter().map(|e| e.size.0).sum())
    }

    /// True if the order rested on the book (open remainder).
    pub fn rested(&self) -> bool {
        self.order.is_open()
    }

    /// True for a market order that found no liquidity at all.
    pub fn no_liquidity(&self) -> bool {
        self.order.status == OrderStatus::Rejected
    }
}

impl AssetBook {
    /// Does an incoming order cross a resting price?
    ///
    /// Market orders always cross. A limit buy crosses at or above the ask,
    /// a limit sell at or below the bid.
    #[inline]
    fn crosses(incoming: &Order, resting_price: Price) -> bool {
        match incoming.kind {
            OrderType::Market => true,
            OrderType::Limit => match incoming.side {
                Side::Buy => incoming.price >= resting_price,
                Side::Sell => incoming.price <= resting_price,
            },
        }
    }

    /// Match an incoming order against the opposite side.
    ///
    /// Consumes makers in strict price-time order until the incoming order
    /// is filled or prices stop crossing. Both the incoming order and the
    /// consumed makers are mutated; the incoming order is never added to
    /// the book here.
    pub fn match_order(&mut self, incoming: &mut Order) -> Vec<TradeEffect> {
        let mut effects = Vec::new();
        let opposite = incoming.side.opposite();

        while incoming.size_remaining.is_positive() {
            let Some(maker) = self.peek_best(opposite) else {
                break; // no liquidity left
            };
            if !Self::crosses(incoming, maker.price) {
                break;
            }

            let price = maker.price;
            let size = Size(incoming.size_remaining.0.min(maker.size_remaining.0));
            let maker_id = maker.id;

            let maker_status = self.pop_or_decrement(opposite, size);
            incoming.fill(size);

            effects.push(TradeEffect {
                maker: maker_id,
                taker: incoming.id,
                price,
                size,
                maker_done: maker_status == OrderStatus::Filled,
            });
        }

        effects
    }

    /// Match an order and apply the rest-or-discard policy.
    ///
    /// - Limit remainder rests on the book (`Pending` if untouched,
    ///   `PartFilled` otherwise).
    /// - Market remainder is discarded (`Cancelled`); a market order that
    ///   found no liquidity at all comes back `Rejected`.
    pub fn place(&mut self, mut order: Order) -> Placement {
        let effects = self.match_order(&mut order);

        if order.size_remaining.is_positive() {
            match order.kind {
                OrderType::Limit => {
                    // Status is Pending (no fills) or PartFilled; rest it.
                    self.add(order.clone());
                }
                OrderType::Market => {
                    order.status = if effects.is_empty() {
                        OrderStatus::Rejected
                    } else {
                        OrderStatus::Cancelled
                    };
                }
            }
        }

        Placement { order, effects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Price;
    use crate::order::OrderRequest;
    use crate::types::{AssetId, UserId};

    fn order(id: u64, side: Side, price: i64, size: i64) -> Order {
        let req = OrderRequest::limit(side, Price(price), Size(size)).unwrap();
        Order::new(OrderId(id), UserId(id as u32), AssetId(1), req, id)
    }

    fn market(id: u64, side: Side, size: i64) -> Order {
        let req = OrderRequest::market(side, Size(size)).unwrap();
        Order::new(OrderId(id), UserId(id as u32), AssetId(1), req, id)
    }

    fn book_with_asks(asks: &[(i64, i64)]) -> (AssetBook, u64) {
        let mut book = AssetBook::new();
        let mut next = 1;
        for &(price, size) in asks {
            book.add(order(next, Side::Sell, price, size));
            next += 1;
        }
        (book, next)
    }

    // === No match ===

    #[test]
    fn no_match_on_empty_book() {
        let mut book = AssetBook::new();
        let mut incoming = order(1, Side::Buy, 100_00, 10_00);
        let effects = book.match_order(&mut incoming);
        assert!(effects.is_empty());
        assert_eq!(incoming.size_remaining, Size(10_00));
    }

    #[test]
    fn no_match_when_prices_do_not_cross() {
        let (mut book, next) = book_with_asks(&[(101_00, 10_00)]);
        let mut incoming = order(next, Side::Buy, 100_00, 10_00);
        let effects = book.match_order(&mut incoming);
        assert!(effects.is_empty());
        assert_eq!(book.best_ask(), Some(Price(101_00)));
    }

    // === Crossing ===

    #[test]
    fn equal_price_crosses() {
        let (mut book, next) = book_with_asks(&[(100_00, 10_00)]);
        let mut incoming = order(next, Side::Buy, 100_00, 10_00);
        let effects = book.match_order(&mut incoming);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].price, Price(100_00));
        assert_eq!(effects[0].size, Size(10_00));
        assert!(effects[0].maker_done);
        assert_eq!(incoming.status, OrderStatus::Filled);
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn execution_at_maker_price() {
        // Ask at 100, buyer willing to pay 105 → trade at 100
        let (mut book, next) = book_with_asks(&[(100_00, 10_00)]);
        let mut incoming = order(next, Side::Buy, 105_00, 10_00);
        let effects = book.match_order(&mut incoming);
        assert_eq!(effects[0].price, Price(100_00));
    }

    #[test]
    fn seller_gets_maker_price_improvement() {
        let mut book = AssetBook::new();
        book.add(order(1, Side::Buy, 105_00, 10_00));
        let mut incoming = order(2, Side::Sell, 100_00, 10_00);
        let effects = book.match_order(&mut incoming);
        assert_eq!(effects[0].price, Price(105_00));
    }

    // === Priority ===

    #[test]
    fn price_priority_sweeps_best_first() {
        let (mut book, next) = book_with_asks(&[(102_00, 5_00), (100_00, 5_00), (101_00, 5_00)]);
        let mut incoming = order(next, Side::Buy, 102_00, 12_00);
        let effects = book.match_order(&mut incoming);

        assert_eq!(effects.len(), 3);
        assert_eq!(effects[0].price, Price(100_00));
        assert_eq!(effects[1].price, Price(101_00));
        assert_eq!(effects[2].price, Price(102_00));
        assert_eq!(effects[2].size, Size(2_00));
        // 3.00 left at 102
        assert_eq!(book.asks().total_size(), Size(3_00));
    }

    #[test]
    fn time_priority_within_level() {
        // Spec scenario: asks 10@100 (t1), 10@100 (t2), 10@101 (t3); buy 15@101
        let (mut book, next) =
            book_with_asks(&[(100_00, 10_00), (100_00, 10_00), (101_00, 10_00)]);
        let mut incoming = order(next, Side::Buy, 101_00, 15_00);
        let effects = book.match_order(&mut incoming);

        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0].maker, OrderId(1));
        assert_eq!(effects[0].size, Size(10_00));
        assert!(effects[0].maker_done);
        assert_eq!(effects[1].maker, OrderId(2));
        assert_eq!(effects[1].size, Size(5_00));
        assert!(!effects[1].maker_done);
        assert_eq!(incoming.status, OrderStatus::Filled);

        // Remaining: 5@100 (t2) then 10@101 (t3)
        assert_eq!(book.resting(OrderId(2)).unwrap().size_remaining, Size(5_00));
        assert_eq!(book.resting(OrderId(3)).unwrap().size_remaining, Size(10_00));
        assert_eq!(book.best_ask(), Some(Price(100_00)));
    }

    // === place() policy ===

    #[test]
    fn limit_remainder_rests_pending() {
        let mut book = AssetBook::new();
        let placement = book.place(order(1, Side::Buy, 150_00, 10_00));
        assert!(placement.rested());
        assert_eq!(placement.order.status, OrderStatus::Pending);
        assert!(placement.effects.is_empty());
        assert_eq!(book.best_bid(), Some(Price(150_00)));
    }

    #[test]
    fn limit_remainder_rests_part_filled() {
        let (mut book, next) = book_with_asks(&[(100_00, 4_00)]);
        let placement = book.place(order(next, Side::Buy, 100_00, 10_00));
        assert_eq!(placement.order.status, OrderStatus::PartFilled);
        assert_eq!(placement.filled_size(), Size(4_00));
        assert_eq!(
            book.resting(placement.order.id).unwrap().size_remaining,
            Size(6_00)
        );
    }

    #[test]
    fn market_remainder_is_discarded() {
        let (mut book, next) = book_with_asks(&[(100_00, 4_00)]);
        let placement = book.place(market(next, Side::Buy, 10_00));
        assert_eq!(placement.order.status, OrderStatus::Cancelled);
        assert_eq!(placement.filled_size(), Size(4_00));
        assert!(!book.contains(placement.order.id));
        assert_eq!(book.best_ask(), None);
    }

    #[test]
    fn market_on_empty_book_is_rejected() {
        let mut book = AssetBook::new();
        let placement = book.place(market(1, Side::Buy, 5_00));
        assert!(placement.no_liquidity());
        assert!(placement.effects.is_empty());
        assert_eq!(book.resting_count(), 0);
    }

    #[test]
    fn market_sweeps_multiple_levels() {
        let (mut book, next) = book_with_asks(&[(100_00, 5_00), (101_00, 5_00)]);
        let placement = book.place(market(next, Side::Buy, 8_00));
        assert_eq!(placement.order.status, OrderStatus::Filled);
        assert_eq!(placement.effects.len(), 2);
        assert_eq!(placement.effects[0].price, Price(100_00));
        assert_eq!(placement.effects[1].price, Price(101_00));
        assert_eq!(placement.effects[1].size, Size(3_00));
    }

    #[test]
    fn self_trade_is_not_prevented() {
        // Same user on both sides still trades (documented v1 behaviour)
        let mut book = AssetBook::new();
        let req = OrderRequest::limit(Side::Sell, Price(100_00), Size(5_00)).unwrap();
        book.add(Order::new(OrderId(1), UserId(7), AssetId(1), req, 1));

        let req = OrderRequest::limit(Side::Buy, Price(100_00), Size(5_00)).unwrap();
        let incoming = Order::new(OrderId(2), UserId(7), AssetId(1), req, 2);
        let placement = book.place(incoming);
        assert_eq!(placement.effects.len(), 1);
    }
}
