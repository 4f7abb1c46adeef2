//! AssetBook: both sides of one asset's book plus the resting-order index.
//!
//! The index holds exactly the orders that are resting in a side queue —
//! terminal orders live only in the engine's store. This keeps the book a
//! pure matching structure that can be cloned cheaply for rollback.

use rustc_hash::FxHashMap;

use crate::decimal::{Price, Size};
use crate::error::BookError;
use crate::ladder::Ladder;
use crate::order::{Order, OrderStatus, OrderType, Side};
use crate::types::OrderId;

/// The order book for a single asset.
#[derive(Clone, Debug)]
pub struct AssetBook {
    /// Buy orders, best = highest price
    bids: Ladder,
    /// Sell orders, best = lowest price
    asks: Ladder,
    /// Resting orders by id; membership ⇔ presence in a side queue
    orders: FxHashMap<OrderId, Order>,
}

impl AssetBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bids: Ladder::new(Side::Buy),
            asks: Ladder::new(Side::Sell),
            orders: FxHashMap::default(),
        }
    }

    // === Queries ===

    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Best price on the side an incoming `side` order would trade against.
    pub fn best_opposite(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.best_ask(),
            Side::Sell => self.best_bid(),
        }
    }

    /// A resting order, if present.
    pub fn resting(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    #[inline]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Number of resting orders.
    pub fn resting_count(&self) -> usize {
        self.orders.len()
    }

    pub fn bids(&self) -> &Ladder {
        &self.bids
    }

    pub fn asks(&self) -> &Ladder {
        &self.asks
    }

    pub(crate) fn side(&self, side: Side) -> &Ladder {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut Ladder {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// The order at the front of the best level on `side`.
    pub fn peek_best(&self, side: Side) -> Option<&Order> {
        let id = self.side(side).best_level()?.front()?;
        self.orders.get(&id)
    }

    // === Mutations ===

    /// Rest an open limit order at the tail of its price level.
    ///
    /// Callers must not pass terminal orders or market orders; neither may
    /// ever rest.
    pub fn add(&mut self, order: Order) {
        debug_assert!(order.is_open(), "cannot rest {} order", order.status);
        debug_assert!(
            order.kind == OrderType::Limit,
            "market orders never rest"
        );
        self.side_mut(order.side)
            .insert(order.price, order.id, order.size_remaining);
        self.orders.insert(order.id, order);
    }

    /// Remove an order by id (cancellation path).
    pub fn remove(&mut self, order_id: OrderId) -> Result<Order, BookError> {
        let order = self
            .orders
            .remove(&order_id)
            .ok_or(BookError::NotFound(order_id))?;
        let removed =
            self.side_mut(order.side)
                .remove(order.price, order.id, order.size_remaining);
        debug_assert!(removed, "index and ladder out of sync for {order_id}");
        Ok(order)
    }

    /// Consume `size` from the maker at the front of the best level on
    /// `side`. Removes the maker entirely when fully filled; otherwise
    /// decrements it in place. Returns the maker's updated status.
    ///
    /// # Panics
    ///
    /// Panics if there is no maker or `size` exceeds its remaining size.
    pub(crate) fn pop_or_decrement(&mut self, side: Side, size: Size) -> OrderStatus {
        let maker_id = self
            .side(side)
            .best_level()
            .and_then(|l| l.front())
            .expect("pop_or_decrement on empty side");
        let maker = self
            .orders
            .get_mut(&maker_id)
            .expect("ladder references a missing order");
        let price = maker.price;
        maker.fill(size);
        let status = maker.status;

        if status == OrderStatus::Filled {
            self.orders.remove(&maker_id);
            let ladder = self.side_mut(side);
            let level = ladder.level_mut(price).expect("maker level exists");
            level.pop_front(size);
            if level.is_empty() {
                ladder.remove_level(price);
            }
        } else {
            self.side_mut(side)
                .level_mut(price)
                .expect("maker level exists")
                .decrease_size(size);
        }
        status
    }
}

impl Default for AssetBook {
    fn default() -> Self {
        Self::new()
    }
}
