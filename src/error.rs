//! Error types for input validation at the public API boundary.
//!
//! Degenerate-but-valid outcomes (a zero rate, a balance that never pays off,
//! an APR solve that stops at the iteration cap) are ordinary values and never
//! show up here.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias used by every validating entry point.
pub type FinanceResult<T> = Result<T, FinanceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinanceError {
    /// An input value is outside the domain the calculation is defined on.
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// A currency code is absent from the lookup table in use.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// A reference table violates its structural invariants.
    #[error("Invalid table: {0}")]
    InvalidTable(String),
}

impl FinanceError {
    pub(crate) fn invalid(field: &'static str, value: impl ToString, reason: &'static str) -> Self {
        FinanceError::InvalidInput {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: Decimal) -> FinanceResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(FinanceError::invalid(field, value, "must not be negative"));
    }
    Ok(value)
}

pub(crate) fn ensure_positive(field: &'static str, value: Decimal) -> FinanceResult<Decimal> {
    if value <= Decimal::ZERO {
        return Err(FinanceError::invalid(field, value, "must be greater than zero"));
    }
    Ok(value)
}
