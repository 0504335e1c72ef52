//! Level-payment (annuity) amortization.
//!
//! The payment follows the standard annuity formula
//! `PMT = P * [r(1 + r)^n] / [(1 + r)^n - 1]`, with `r` the nominal monthly
//! rate and `n` the number of monthly payments.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loan::LoanTerms;

/// A single month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Payment number, starting at 1.
    pub period: u32,
    /// The level payment made this month.
    pub payment: Decimal,
    /// The portion of the payment that reduces the balance.
    pub principal: Decimal,
    /// The portion of the payment that covers interest.
    pub interest: Decimal,
    /// Remaining balance after the payment, never below zero.
    pub balance: Decimal,
    /// Interest paid from the first month through this one.
    pub cumulative_interest: Decimal,
}

/// Payment, totals and the full schedule of a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSummary {
    pub payment: Decimal,
    pub total_paid: Decimal,
    pub total_interest: Decimal,
    pub rows: Vec<AmortizationRow>,
}

/// Payment per unit of principal for `periods` payments at `periodic_rate`.
///
/// A zero rate degrades to straight-line repayment (`1 / n`). When `(1 + r)^n`
/// no longer fits in a `Decimal` the factor has converged to its limit `r`.
/// `periods` must be at least 1.
pub fn annuity_coefficient(periodic_rate: Decimal, periods: u32) -> Decimal {
    let n = Decimal::from(periods);
    if periodic_rate.is_zero() {
        return dec!(1) / n;
    }

    let growth = match (dec!(1) + periodic_rate).checked_powu(periods.into()) {
        Some(growth) if growth == dec!(1) => return dec!(1) / n,
        Some(growth) => growth,
        None => {
            debug!(%periodic_rate, periods, "annuity growth overflowed, using limit");
            return periodic_rate;
        }
    };

    match periodic_rate.checked_mul(growth) {
        Some(scaled) => scaled / (growth - dec!(1)),
        None => {
            debug!(%periodic_rate, periods, "annuity numerator overflowed, using limit");
            periodic_rate
        }
    }
}

/// Level monthly payment for the loan. A zero rate pays `principal / n`.
pub fn monthly_payment(terms: &LoanTerms) -> Decimal {
    let rate = terms.monthly_rate();
    if rate.is_zero() {
        return terms.principal() / Decimal::from(terms.term_months());
    }
    terms.principal() * annuity_coefficient(rate, terms.term_months())
}

/// Builds the month-by-month schedule.
///
/// Interest is charged on the running balance, the remainder of the payment
/// goes to principal. The reported balance is clamped at zero; the running
/// balance is not, so rounding residue never leaks into later rows.
pub fn schedule(terms: &LoanTerms) -> Vec<AmortizationRow> {
    let rate = terms.monthly_rate();
    let payment = monthly_payment(terms);

    let mut balance = terms.principal();
    let mut cumulative_interest = dec!(0);
    let mut rows = Vec::with_capacity(terms.term_months() as usize);

    for period in 1..=terms.term_months() {
        let interest = balance * rate;
        let principal = payment - interest;
        balance -= principal;
        cumulative_interest += interest;
        rows.push(AmortizationRow {
            period,
            payment,
            principal,
            interest,
            balance: balance.max(dec!(0)),
            cumulative_interest,
        });
    }

    rows
}

/// Payment, totals and schedule in one pass.
pub fn amortize(terms: &LoanTerms) -> AmortizationSummary {
    let rows = schedule(terms);
    let payment = rows.first().map(|row| row.payment).unwrap_or_default();
    let total_paid = payment * Decimal::from(terms.term_months());
    let total_interest = rows.last().map(|row| row.cumulative_interest).unwrap_or_default();

    AmortizationSummary {
        payment,
        total_paid,
        total_interest,
        rows,
    }
}

/// Remaining balance once `payments_made` payments have gone through.
///
/// Zero payments returns the principal; anything past the term returns zero.
pub fn balance_after(terms: &LoanTerms, payments_made: u32) -> Decimal {
    if payments_made == 0 {
        return terms.principal();
    }
    if payments_made >= terms.term_months() {
        return dec!(0);
    }

    let rate = terms.monthly_rate();
    let payment = monthly_payment(terms);
    let mut balance = terms.principal();
    for _ in 0..payments_made {
        balance -= payment - balance * rate;
    }
    balance.max(dec!(0))
}
