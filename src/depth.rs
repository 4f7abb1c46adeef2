//! Depth snapshots: aggregated size per price level.

use crate::book::AssetBook;
use crate::decimal::{Money, Price, Size};
use crate::error::DecimalError;
use crate::ladder::Ladder;

/// One aggregated price level in a depth snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepthLevel {
    pub price: Price,
    /// Total resting size at this price
    pub size: Size,
    /// Cumulative notional from the best level through this one
    pub cum_notional: Money,
    /// Number of orders queued at this price
    pub order_count: usize,
}

/// Top-of-book depth for one asset, best levels first on both sides.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookDepth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

impl BookDepth {
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    /// Best ask minus best bid, if both sides are populated.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price(ask.0 - bid.0)),
            _ => None,
        }
    }
}

fn side_depth(ladder: &Ladder, levels: usize) -> Result<Vec<DepthLevel>, DecimalError> {
    let mut out = Vec::with_capacity(levels.min(ladder.level_count()));
    let mut cum = Money::ZERO;
    for (price, level) in ladder.iter_best_first().take(levels) {
        cum = cum.checked_add(price.checked_mul(level.total_size())?)?;
        out.push(DepthLevel {
            price: *price,
            size: level.total_size(),
            cum_notional: cum,
            order_count: level.order_count(),
        });
    }
    Ok(out)
}

impl AssetBook {
    /// Snapshot the top `levels` price levels on each side.
    pub fn depth(&self, levels: usize) -> Result<BookDepth, DecimalError> {
        Ok(BookDepth {
            bids: side_depth(self.bids(), levels)?,
            asks: side_depth(self.asks(), levels)?,
        })
    }
}
