//! Pre-trade risk gate for matchbook.
//!
//! Validates candidate orders against per-user limits before they reach the
//! matching engine. The gate is pure: it reads an [`AccountView`] snapshot
//! assembled by the engine inside the asset's critical section and returns
//! an admit-or-reject verdict, so the state it checked is exactly the state
//! settlement will write.
//!
//! ```
//! use matchbook::{AssetId, Money, Order, OrderId, OrderRequest, Price, Side, Size, UserId};
//! use matchbook_risk::{AccountView, RiskLimits, assess};
//!
//! let req = OrderRequest::limit(Side::Buy, Price(150_00), Size(10_00)).unwrap();
//! let order = Order::new(OrderId(1), UserId(1), AssetId(1), req, 1);
//!
//! let view = AccountView {
//!     buying_power: Money(10_000_0000), // 10 000.00
//!     ..AccountView::default()
//! };
//!
//! let admission = assess(&order, None, &view, &RiskLimits::default()).unwrap();
//! assert_eq!(admission.reserve, Some(Money(1_500_0000))); // 1 500.00 reserved
//! ```

pub mod checks;
pub mod config;
pub mod report;

pub use checks::{AccountView, assess};
pub use config::RiskLimits;
pub use report::{Admission, RejectReason};
