// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # matchbook-engine
//!
//! The exchange engine around the `matchbook` matching core: accounts,
//! pre-trade risk, settlement, audit, and the per-asset coordinator.
//!
//! Submissions run risk → match → settle → commit as one atomic unit under
//! the asset's exclusive guard. The store transaction and the in-memory
//! book roll back together, so a failure anywhere leaves no trace: no
//! trade rows, unchanged order status, reservations intact.
//!
//! ```
//! use matchbook::{OrderRequest, Price, Side, Size, UserId};
//! use matchbook_engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default());
//! engine.register_asset("AAPL", "Apple Inc.").unwrap();
//!
//! // U1 bids 10.00 @ 150.00; the order rests and 1 500.00 is reserved
//! let req = OrderRequest::limit(Side::Buy, Price(150_00), Size(10_00)).unwrap();
//! let report = engine.submit_order(UserId(1), "AAPL", req).unwrap();
//! assert!(report.fills.is_empty());
//!
//! // U2 sells into it; both sides settle atomically
//! let req = OrderRequest::limit(Side::Sell, Price(150_00), Size(10_00)).unwrap();
//! let report = engine.submit_order(UserId(2), "AAPL", req).unwrap();
//! assert_eq!(report.fills.len(), 1);
//! assert_eq!(report.fills[0].price, Price(150_00));
//! ```

mod audit;
mod config;
mod engine;
mod error;
mod outbox;
mod settlement;
mod store;

pub use audit::{AuditAction, AuditRow};
pub use config::EngineConfig;
pub use engine::{CancelReport, DepthSnapshot, Engine, Fill, SubmitReport};
pub use error::{EngineError, Result};
pub use outbox::TradeEvent;
pub use store::{AssetRow, MarketStats, OrderRow, Portfolio, Position, Store, TradeRow};
