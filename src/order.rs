//! Order model: side, type, status, request, and the order itself.

use std::fmt;

use crate::decimal::{Price, Size};
use crate::error::RequestError;
use crate::types::{AssetId, OrderId, Timestamp, UserId};

/// Side of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type. Stop and iceberg variants are reserved for a later version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum OrderType {
    Limit,
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

/// Status of an order in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    /// Admitted, resting or about to rest, no fills yet
    #[default]
    Pending,
    /// Some size filled, remainder still live
    PartFilled,
    /// Fully executed
    Filled,
    /// Removed by user request or discarded market remainder
    Cancelled,
    /// Refused by the risk gate or for lack of liquidity
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order can still fill or be cancelled.
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::PartFilled)
    }

    /// Returns true if no further state changes are possible.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }

    /// Wire-stable status string.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PartFilled => "PART_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated order request.
///
/// The tagged layout means a market order carries no price at all, so the
/// matcher can never mistake a zero-price limit for a market order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "UPPERCASE"))]
pub enum OrderRequest {
    Limit { side: Side, price: Price, size: Size },
    Market { side: Side, size: Size },
}

impl OrderRequest {
    /// Build a limit request. Price and size must be strictly positive.
    pub fn limit(side: Side, price: Price, size: Size) -> Result<Self, RequestError> {
        if price.0 <= 0 {
            return Err(RequestError::ZeroPrice);
        }
        if !size.is_positive() {
            return Err(RequestError::ZeroSize);
        }
        Ok(OrderRequest::Limit { side, price, size })
    }

    /// Build a market request. Size must be strictly positive.
    pub fn market(side: Side, size: Size) -> Result<Self, RequestError> {
        if !size.is_positive() {
            return Err(RequestError::ZeroSize);
        }
        Ok(OrderRequest::Market { side, size })
    }

    #[inline]
    pub fn side(&self) -> Side {
        match *self {
            OrderRequest::Limit { side, .. } | OrderRequest::Market { side, .. } => side,
        }
    }

    #[inline]
    pub fn size(&self) -> Size {
        match *self {
            OrderRequest::Limit { size, .. } | OrderRequest::Market { size, .. } => size,
        }
    }

    /// The limit price, if this is a limit request.
    #[inline]
    pub fn limit_price(&self) -> Option<Price> {
        match *self {
            OrderRequest::Limit { price, .. } => Some(price),
            OrderRequest::Market { .. } => None,
        }
    }

    #[inline]
    pub fn kind(&self) -> OrderType {
        match self {
            OrderRequest::Limit { .. } => OrderType::Limit,
            OrderRequest::Market { .. } => OrderType::Market,
        }
    }
}

/// An order inside the matching core.
///
/// `price` is [`Price::ZERO`] for market orders; such orders never rest.
/// `priority` is the logical admission timestamp used for time priority.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    pub asset: AssetId,
    pub side: Side,
    pub kind: OrderType,
    pub price: Price,
    pub size_original: Size,
    pub size_remaining: Size,
    pub status: OrderStatus,
    pub priority: Timestamp,
}

impl Order {
    /// Materialize an admitted request.
    pub fn new(
        id: OrderId,
        user: UserId,
        asset: AssetId,
        request: OrderRequest,
        priority: Timestamp,
    ) -> Self {
        Self {
            id,
            user,
            asset,
            side: request.side(),
            kind: request.kind(),
            price: request.limit_price().unwrap_or(Price::ZERO),
            size_original: request.size(),
            size_remaining: request.size(),
            status: OrderStatus::Pending,
            priority,
        }
    }

    /// Returns true if the order can still fill or be cancelled.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Size filled so far.
    #[inline]
    pub fn size_filled(&self) -> Size {
        Size(self.size_original.0 - self.size_remaining.0)
    }

    /// Apply a fill, updating remaining size and status.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds the remaining size.
    pub fn fill(&mut self, size: Size) {
        assert!(
            size.0 <= self.size_remaining.0,
            "fill size {} exceeds remaining {}",
            size,
            self.size_remaining
        );
        self.size_remaining.0 -= size.0;
        self.status = if self.size_remaining == Size::ZERO {
            OrderStatus::Filled
        } else {
            OrderStatus::PartFilled
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_buy(size: i64) -> Order {
        let req = OrderRequest::limit(Side::Buy, Price(150_00), Size(size)).unwrap();
        Order::new(OrderId(1), UserId(1), AssetId(1), req, 1)
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn request_validation() {
        assert_eq!(
            OrderRequest::limit(Side::Buy, Price::ZERO, Size(1_00)),
            Err(RequestError::ZeroPrice)
        );
        assert_eq!(
            OrderRequest::limit(Side::Buy, Price(-1), Size(1_00)),
            Err(RequestError::ZeroPrice)
        );
        assert_eq!(
            OrderRequest::limit(Side::Buy, Price(100_00), Size::ZERO),
            Err(RequestError::ZeroSize)
        );
        assert_eq!(
            OrderRequest::market(Side::Sell, Size(-5)),
            Err(RequestError::ZeroSize)
        );
        assert!(OrderRequest::market(Side::Sell, Size(5)).is_ok());
    }

    #[test]
    fn market_request_has_no_price() {
        let req = OrderRequest::market(Side::Buy, Size(10_00)).unwrap();
        assert_eq!(req.limit_price(), None);
        let order = Order::new(OrderId(1), UserId(1), AssetId(1), req, 1);
        assert_eq!(order.price, Price::ZERO);
        assert_eq!(order.kind, OrderType::Market);
    }

    #[test]
    fn new_order_initial_state() {
        let order = limit_buy(10_00);
        assert_eq!(order.size_original, Size(10_00));
        assert_eq!(order.size_remaining, Size(10_00));
        assert_eq!(order.size_filled(), Size::ZERO);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.is_open());
    }

    #[test]
    fn partial_then_full_fill() {
        let mut order = limit_buy(10_00);

        order.fill(Size(4_00));
        assert_eq!(order.size_remaining, Size(6_00));
        assert_eq!(order.status, OrderStatus::PartFilled);

        order.fill(Size(6_00));
        assert_eq!(order.size_remaining, Size::ZERO);
        assert_eq!(order.size_filled(), Size(10_00));
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(!order.is_open());
    }

    #[test]
    #[should_panic(expected = "exceeds remaining")]
    fn fill_overrun_panics() {
        let mut order = limit_buy(10_00);
        order.fill(Size(10_01));
    }

    #[test]
    fn status_lifecycle_predicates() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::PartFilled.is_open());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_wire_strings() {
        assert_eq!(OrderStatus::PartFilled.as_str(), "PART_FILLED");
        assert_eq!(OrderStatus::Rejected.to_string(), "REJECTED");
    }
}
