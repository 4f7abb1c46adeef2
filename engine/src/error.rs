//! Engine errors and their wire-stable kinds.

use matchbook::{DecimalError, OrderId, OrderStatus, Ticker};
use matchbook_risk::RejectReason;

/// All errors the engine returns to callers.
///
/// [`EngineError::kind`] gives the wire-stable kind string for each variant;
/// transports serialize that string, never the Rust variant name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Reserved for the transport layer's authentication failures.
    #[error("unauthorized")]
    Unauthorized,

    #[error("unknown asset {0:?}")]
    AssetNotFound(String),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("order {0} belongs to another user")]
    Forbidden(OrderId),

    #[error("order {0} is {1} and cannot be cancelled")]
    NotCancellable(OrderId, OrderStatus),

    #[error("risk check failed: {0}")]
    RiskRejected(RejectReason),

    #[error("no liquidity for market order")]
    NoLiquidity,

    #[error("no reference price available for market order")]
    NoReferencePrice,

    #[error("value exceeds the representable decimal range")]
    Overflow,

    #[error("invalid ticker {0:?}")]
    InvalidTicker(String),

    #[error("ticker {0} is already listed")]
    DuplicateTicker(Ticker),

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Shorthand for an internal error with a message.
    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }

    /// The wire-stable error kind string.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Unauthorized => "Unauthorized",
            EngineError::AssetNotFound(_) => "AssetNotFound",
            EngineError::OrderNotFound(_) => "OrderNotFound",
            EngineError::Forbidden(_) => "Forbidden",
            EngineError::NotCancellable(..) => "NotCancellable",
            EngineError::RiskRejected(_) => "RiskRejected",
            EngineError::NoLiquidity => "NoLiquidity",
            EngineError::NoReferencePrice => "NoReferencePrice",
            EngineError::Overflow => "Overflow",
            EngineError::InvalidTicker(_)
            | EngineError::DuplicateTicker(_)
            | EngineError::Internal(_) => "Internal",
        }
    }
}

impl From<DecimalError> for EngineError {
    fn from(err: DecimalError) -> Self {
        match err {
            DecimalError::Overflow => EngineError::Overflow,
            other => EngineError::Internal(other.to_string()),
        }
    }
}

impl From<RejectReason> for EngineError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::NoReferencePrice => EngineError::NoReferencePrice,
            RejectReason::Overflow => EngineError::Overflow,
            other => EngineError::RiskRejected(other),
        }
    }
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_wire_stable() {
        assert_eq!(EngineError::Unauthorized.kind(), "Unauthorized");
        assert_eq!(EngineError::AssetNotFound("X".into()).kind(), "AssetNotFound");
        assert_eq!(EngineError::OrderNotFound(OrderId(1)).kind(), "OrderNotFound");
        assert_eq!(EngineError::Forbidden(OrderId(1)).kind(), "Forbidden");
        assert_eq!(
            EngineError::NotCancellable(OrderId(1), OrderStatus::Filled).kind(),
            "NotCancellable"
        );
        assert_eq!(EngineError::NoLiquidity.kind(), "NoLiquidity");
        assert_eq!(EngineError::Overflow.kind(), "Overflow");
        assert_eq!(EngineError::Internal("x".into()).kind(), "Internal");
    }

    #[test]
    fn risk_reasons_map_to_their_kinds() {
        assert_eq!(
            EngineError::from(RejectReason::NoReferencePrice).kind(),
            "NoReferencePrice"
        );
        assert_eq!(EngineError::from(RejectReason::Overflow).kind(), "Overflow");
        assert_eq!(
            EngineError::from(RejectReason::DailyTradeLimit { limit: 1 }).kind(),
            "RiskRejected"
        );
    }
}
