//! Error types for the core book and decimal primitives.

use crate::types::OrderId;

/// Errors from fixed-point arithmetic and parsing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecimalError {
    /// Result magnitude exceeds 10^15 raw units.
    #[error("decimal overflow: result exceeds the representable range")]
    Overflow,

    /// Division by a zero size.
    #[error("decimal division by zero")]
    DivideByZero,

    /// Not a valid fixed-point literal at the expected scale.
    #[error("invalid decimal literal: {0:?}")]
    Parse(String),
}

/// Errors from validating an order request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestError {
    /// Order size must be greater than zero.
    #[error("order size must be greater than zero")]
    ZeroSize,

    /// Limit price must be greater than zero.
    #[error("limit price must be greater than zero")]
    ZeroPrice,
}

/// Errors from book mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    /// The order id is not resting in this book.
    #[error("order {0} is not resting in the book")]
    NotFound(OrderId),
}
