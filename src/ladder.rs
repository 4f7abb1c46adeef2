//! Ladder: one side of a book — price levels ordered best-first.
//!
//! Bids iterate high → low, asks low → high. The best price is cached so
//! top-of-book queries are O(1).

use std::collections::BTreeMap;

use crate::decimal::{Price, Size};
use crate::level::Level;
use crate::order::Side;
use crate::types::OrderId;

/// All resting orders on one side of a book, indexed by price.
#[derive(Clone, Debug)]
pub struct Ladder {
    levels: BTreeMap<Price, Level>,
    /// Cached best price (highest bid / lowest ask)
    best: Option<Price>,
    side: Side,
}

impl Ladder {
    pub fn new(side: Side) -> Self {
        Self {
            levels: BTreeMap::new(),
            best: None,
            side,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Best price on this side. O(1).
    #[inline]
    pub fn best_price(&self) -> Option<Price> {
        self.best
    }

    /// The level at the best price.
    pub fn best_level(&self) -> Option<&Level> {
        self.best.and_then(|p| self.levels.get(&p))
    }

    pub fn best_level_mut(&mut self) -> Option<&mut Level> {
        self.best.and_then(|p| self.levels.get_mut(&p))
    }

    pub fn level(&self, price: Price) -> Option<&Level> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut Level> {
        self.levels.get_mut(&price)
    }

    /// Append an order at its price, creating the level if needed.
    pub fn insert(&mut self, price: Price, order_id: OrderId, size: Size) {
        let is_new = !self.levels.contains_key(&price);
        if is_new {
            self.promote_if_better(price);
            self.levels.insert(price, Level::new(price));
        }
        self.levels
            .get_mut(&price)
            .expect("level exists after insert")
            .push_back(order_id, size);
    }

    /// Remove a specific order from its level, dropping the level if emptied.
    ///
    /// Returns `true` if the order was present.
    pub fn remove(&mut self, price: Price, order_id: OrderId, size: Size) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };
        if !level.remove(order_id, size) {
            return false;
        }
        if level.is_empty() {
            self.remove_level(price);
        }
        true
    }

    /// Drop a price level entirely, refreshing the best-price cache.
    pub fn remove_level(&mut self, price: Price) {
        if self.levels.remove(&price).is_some() && self.best == Some(price) {
            self.recompute_best();
        }
    }

    /// Levels from best to worst price.
    pub fn iter_best_first(&self) -> impl Iterator<Item = (&Price, &Level)> {
        let (fwd, rev) = match self.side {
            // Bids: highest first
            Side::Buy => (None, Some(self.levels.iter().rev())),
            // Asks: lowest first
            Side::Sell => (Some(self.levels.iter()), None),
        };
        fwd.into_iter()
            .flatten()
            .chain(rev.into_iter().flatten())
    }

    /// Total resting size across all levels.
    pub fn total_size(&self) -> Size {
        Size(self.levels.values().map(|l| l.total_size().0).sum())
    }

    fn recompute_best(&mut self) {
        self.best = match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        };
    }

    fn promote_if_better(&mut self, price: Price) {
        let better = match self.best {
            None => true,
            Some(best) => match self.side {
                Side::Buy => price > best,
                Side::Sell => price < best,
            },
        };
        if better {
            self.best = Some(price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bids_best_is_highest() {
        let mut bids = Ladder::new(Side::Buy);
        bids.insert(Price(100_00), OrderId(1), Size(1_00));
        assert_eq!(bids.best_price(), Some(Price(100_00)));

        bids.insert(Price(99_00), OrderId(2), Size(1_00));
        assert_eq!(bids.best_price(), Some(Price(100_00)));

        bids.insert(Price(101_00), OrderId(3), Size(1_00));
        assert_eq!(bids.best_price(), Some(Price(101_00)));
    }

    #[test]
    fn asks_best_is_lowest() {
        let mut asks = Ladder::new(Side::Sell);
        asks.insert(Price(100_00), OrderId(1), Size(1_00));
        asks.insert(Price(101_00), OrderId(2), Size(1_00));
        assert_eq!(asks.best_price(), Some(Price(100_00)));

        asks.insert(Price(99_00), OrderId(3), Size(1_00));
        assert_eq!(asks.best_price(), Some(Price(99_00)));
    }

    #[test]
    fn removing_best_level_refreshes_cache() {
        let mut bids = Ladder::new(Side::Buy);
        bids.insert(Price(100_00), OrderId(1), Size(1_00));
        bids.insert(Price(101_00), OrderId(2), Size(1_00));
        bids.insert(Price(99_00), OrderId(3), Size(1_00));

        bids.remove_level(Price(101_00));
        assert_eq!(bids.best_price(), Some(Price(100_00)));
        bids.remove_level(Price(100_00));
        assert_eq!(bids.best_price(), Some(Price(99_00)));
        bids.remove_level(Price(99_00));
        assert_eq!(bids.best_price(), None);
    }

    #[test]
    fn empty_level_is_dropped_on_remove() {
        let mut asks = Ladder::new(Side::Sell);
        asks.insert(Price(100_00), OrderId(1), Size(1_00));
        asks.insert(Price(101_00), OrderId(2), Size(2_00));

        assert!(asks.remove(Price(100_00), OrderId(1), Size(1_00)));
        assert_eq!(asks.level_count(), 1);
        assert_eq!(asks.best_price(), Some(Price(101_00)));
        assert!(asks.level(Price(100_00)).is_none());
    }

    #[test]
    fn iter_best_first_both_sides() {
        let mut bids = Ladder::new(Side::Buy);
        for (i, p) in [99_00, 101_00, 100_00].iter().enumerate() {
            bids.insert(Price(*p), OrderId(i as u64), Size(1_00));
        }
        let prices: Vec<_> = bids.iter_best_first().map(|(p, _)| *p).collect();
        assert_eq!(prices, vec![Price(101_00), Price(100_00), Price(99_00)]);

        let mut asks = Ladder::new(Side::Sell);
        for (i, p) in [99_00, 101_00, 100_00].iter().enumerate() {
            asks.insert(Price(*p), OrderId(i as u64), Size(1_00));
        }
        let prices: Vec<_> = asks.iter_best_first().map(|(p, _)| *p).collect();
        assert_eq!(prices, vec![Price(99_00), Price(100_00), Price(101_00)]);
    }

    #[test]
    fn total_size_sums_levels() {
        let mut bids = Ladder::new(Side::Buy);
        bids.insert(Price(100_00), OrderId(1), Size(1_00));
        bids.insert(Price(100_00), OrderId(2), Size(2_00));
        bids.insert(Price(99_00), OrderId(3), Size(1_50));
        assert_eq!(bids.total_size(), Size(4_50));
    }
}
