// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # matchbook
//!
//! Deterministic multi-asset limit order book and price-time matching core.
//!
//! This crate holds the pure matching machinery: fixed-point decimals, the
//! per-asset book, and the crossing algorithm. Accounts, risk limits, and
//! settlement live in `matchbook-engine` and `matchbook-risk`.
//!
//! ## Matching rules
//!
//! - **Price-time priority**: better prices fill first; ties go to the
//!   earliest arrival (strict FIFO per price level).
//! - **Maker pricing**: trades execute at the resting order's price, so the
//!   aggressor gets any price improvement.
//! - **Market orders never rest**: the unfilled remainder is discarded, and
//!   a market order that finds an empty opposite side is rejected.
//!
//! ## Quick start
//!
//! ```
//! use matchbook::{AssetBook, Order, OrderRequest, OrderStatus, Price, Side, Size};
//! use matchbook::{AssetId, OrderId, UserId};
//!
//! let mut book = AssetBook::new();
//!
//! // Rest an ask: sell 10.00 at 150.25
//! let req = OrderRequest::limit(Side::Sell, Price(150_25), Size(10_00)).unwrap();
//! book.place(Order::new(OrderId(1), UserId(1), AssetId(1), req, 1));
//!
//! // A crossing buy fills at the maker's price
//! let req = OrderRequest::limit(Side::Buy, Price(151_00), Size(4_00)).unwrap();
//! let placement = book.place(Order::new(OrderId(2), UserId(2), AssetId(1), req, 2));
//!
//! assert_eq!(placement.order.status, OrderStatus::Filled);
//! assert_eq!(placement.effects.len(), 1);
//! assert_eq!(placement.effects[0].price, Price(150_25));
//! assert_eq!(book.best_ask(), Some(Price(150_25)));
//! ```
//!
//! ## Fixed-point arithmetic
//!
//! Prices and sizes carry two decimal places; products land in [`Money`] at
//! four, so no multiplication ever loses a sub-cent:
//!
//! ```
//! use matchbook::{Money, Price, Size};
//!
//! let notional = Price(150_25).checked_mul(Size(10_00)).unwrap();
//! assert_eq!(notional, Money(1502_5000)); // 1502.5000
//! assert_eq!("150.25".parse::<Price>().unwrap(), Price(150_25));
//! ```

mod book;
mod decimal;
mod depth;
mod error;
mod ladder;
mod level;
mod matching;
mod order;
mod types;

// Re-export public API
pub use book::AssetBook;
pub use decimal::{MAX_RAW, Money, Price, Size};
pub use depth::{BookDepth, DepthLevel};
pub use error::{BookError, DecimalError, RequestError};
pub use ladder::Ladder;
pub use level::Level;
pub use matching::{Placement, TradeEffect};
pub use order::{Order, OrderRequest, OrderStatus, OrderType, Side};
pub use types::{AssetId, OrderId, Seq, Ticker, Timestamp, TradeId, UserId};
