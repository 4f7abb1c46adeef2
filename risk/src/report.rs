//! Gate verdicts: admission and rejection reasons.

use matchbook::{DecimalError, Money};

/// A successful gate verdict.
///
/// `reserve` is the buying power to set aside for a BUY order (the order
/// notional for a limit, the reference-price estimate for a market order),
/// already rounded to whole cents. Sell orders reserve nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    pub reserve: Option<Money>,
}

/// Why the gate refused an order. First failing check wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error, serde::Serialize)]
pub enum RejectReason {
    #[error("order value {notional} exceeds maximum allowed {limit}")]
    OrderValueExceedsLimit { notional: Money, limit: Money },

    #[error("position would exceed maximum position size of {limit}")]
    PositionExceedsLimit { notional: Money, limit: Money },

    #[error("daily trade limit of {limit} reached")]
    DailyTradeLimit { limit: u32 },

    #[error("maximum open orders limit of {limit} reached")]
    OpenOrderLimit { limit: u32 },

    #[error("daily loss limit of {limit} reached (today {pnl})")]
    DailyLossLimit { pnl: Money, limit: Money },

    #[error("insufficient buying power: required {required}, available {available}")]
    InsufficientBuyingPower { required: Money, available: Money },

    /// A market order with no opposite quote to price the check against.
    #[error("no reference price available for market order")]
    NoReferencePrice,

    /// Notional arithmetic left the representable range.
    #[error("order notional exceeds the representable range")]
    Overflow,
}

impl From<DecimalError> for RejectReason {
    fn from(_: DecimalError) -> Self {
        RejectReason::Overflow
    }
}
