//! Loan parameters shared by the amortization, inversion and APR solvers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult, ensure_non_negative};

/// Longest term any loop in the crate will walk: a 50-year loan in months.
pub const MAX_TERM_MONTHS: u32 = 600;

/// Converts an annual percentage (e.g. `6.5` for 6.5%) into the nominal
/// monthly rate as a fraction (`0.065 / 12`).
pub fn monthly_rate(annual_rate_percent: Decimal) -> Decimal {
    annual_rate_percent / dec!(100) / dec!(12)
}

/// Validated parameters of a fixed-rate, fixed-term loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLoanTerms")]
pub struct LoanTerms {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
}

#[derive(Deserialize)]
struct RawLoanTerms {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
}

impl TryFrom<RawLoanTerms> for LoanTerms {
    type Error = FinanceError;

    fn try_from(raw: RawLoanTerms) -> FinanceResult<Self> {
        LoanTerms::new(raw.principal, raw.annual_rate_percent, raw.term_months)
    }
}

impl LoanTerms {
    /// # Errors
    ///
    /// Returns `FinanceError::InvalidInput` when the principal or rate is
    /// negative, or the term is zero or longer than [`MAX_TERM_MONTHS`].
    pub fn new(principal: Decimal, annual_rate_percent: Decimal, term_months: u32) -> FinanceResult<Self> {
        ensure_non_negative("principal", principal)?;
        ensure_non_negative("annual_rate_percent", annual_rate_percent)?;
        if term_months == 0 {
            return Err(FinanceError::invalid("term_months", term_months, "must be at least one month"));
        }
        if term_months > MAX_TERM_MONTHS {
            return Err(FinanceError::invalid("term_months", term_months, "must not exceed 600 months"));
        }

        Ok(LoanTerms {
            principal,
            annual_rate_percent,
            term_months,
        })
    }

    /// Same as [`LoanTerms::new`] with the term given in whole years.
    pub fn from_years(principal: Decimal, annual_rate_percent: Decimal, years: u32) -> FinanceResult<Self> {
        let term_months = years
            .checked_mul(12)
            .ok_or_else(|| FinanceError::invalid("years", years, "must not exceed 50 years"))?;
        LoanTerms::new(principal, annual_rate_percent, term_months)
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn annual_rate_percent(&self) -> Decimal {
        self.annual_rate_percent
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn monthly_rate(&self) -> Decimal {
        monthly_rate(self.annual_rate_percent)
    }

    /// Copy of these terms with a different principal.
    pub fn with_principal(&self, principal: Decimal) -> FinanceResult<Self> {
        LoanTerms::new(principal, self.annual_rate_percent, self.term_months)
    }
}
