//! Consumer-facing calculators assembled from the engine primitives.
//!
//! Every entry point validates its inputs and returns [`FinanceResult`]; the
//! records they produce derive serde so they can be shipped as JSON as-is.

pub mod growth;
pub mod housing;
pub mod loans;
pub mod salary;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{FinanceError, FinanceResult};
use crate::loan::MAX_TERM_MONTHS;

/// Longest horizon any yearly projection will walk.
pub const MAX_YEARS: u32 = MAX_TERM_MONTHS / 12;

pub(crate) fn ensure_years(field: &'static str, years: u32) -> FinanceResult<u32> {
    if years == 0 || years > MAX_YEARS {
        return Err(FinanceError::invalid(field, years, "must be between 1 and 50 years"));
    }
    Ok(years)
}

pub(crate) fn ensure_percent(field: &'static str, value: Decimal) -> FinanceResult<Decimal> {
    if value < dec!(0) || value > dec!(100) {
        return Err(FinanceError::invalid(field, value, "must be between 0 and 100"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        assert!(ensure_years("years", 0).is_err());
        assert_eq!(ensure_years("years", 1), Ok(1));
        assert_eq!(ensure_years("years", MAX_YEARS), Ok(50));
        assert!(ensure_years("years", MAX_YEARS + 1).is_err());
    }

    #[test]
    fn test_percent_bounds() {
        assert!(ensure_percent("rate", dec!(-0.1)).is_err());
        assert_eq!(ensure_percent("rate", dec!(100)), Ok(dec!(100)));
        assert!(ensure_percent("rate", dec!(100.5)).is_err());
    }
}
