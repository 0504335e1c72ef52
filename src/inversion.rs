//! Reverse solvers: recover a loan amount or purchase price from a target
//! monthly payment by inverting the annuity formula.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::annuity_coefficient;
use crate::error::{FinanceError, FinanceResult, ensure_non_negative};
use crate::loan::{LoanTerms, monthly_rate};

/// Principal that a `payment` per month retires over `term_months` at the
/// given annual rate: `PMT * ((1 + r)^n - 1) / (r (1 + r)^n)`, or `PMT * n`
/// at a zero rate.
///
/// # Errors
///
/// Returns `FinanceError::InvalidInput` for a negative payment or invalid
/// rate/term.
pub fn solve_principal_from_payment(
    payment: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> FinanceResult<Decimal> {
    ensure_non_negative("payment", payment)?;
    let terms = LoanTerms::new(dec!(0), annual_rate_percent, term_months)?;
    Ok(principal_for_payment(payment, &terms))
}

/// Variant of [`solve_principal_from_payment`] taking the term in years.
pub fn solve_loan_amount(payment: Decimal, annual_rate_percent: Decimal, years: u32) -> FinanceResult<Decimal> {
    let terms = LoanTerms::from_years(dec!(0), annual_rate_percent, years)?;
    solve_principal_from_payment(payment, annual_rate_percent, terms.term_months())
}

/// Most expensive vehicle a monthly budget buys: financed amount plus the
/// cash put down.
pub fn solve_vehicle_price(
    payment: Decimal,
    down_payment: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> FinanceResult<Decimal> {
    ensure_non_negative("down_payment", down_payment)?;
    Ok(solve_principal_from_payment(payment, annual_rate_percent, term_months)? + down_payment)
}

/// Inputs for solving a home price from an all-in monthly housing payment
/// (principal and interest, property tax and insurance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomePriceQuery {
    /// Total monthly housing budget.
    pub target_monthly_payment: Decimal,
    /// Down payment as a percentage of the price (e.g. 20 for 20%).
    pub down_payment_percent: Decimal,
    pub annual_rate_percent: Decimal,
    pub years: u32,
    /// Annual property tax as a percentage of the price.
    pub property_tax_rate_percent: Decimal,
    pub annual_insurance: Decimal,
}

/// Home price whose payment, taxes and insurance add up to the target.
///
/// Property tax scales with price, so it is folded into the payment
/// coefficient before inverting:
/// `price = (target - insurance / 12) / (loan_fraction * coefficient + tax_rate / 12)`.
/// Returns zero when insurance alone consumes the budget.
///
/// # Errors
///
/// Returns `FinanceError::InvalidInput` for negative amounts, a down payment
/// outside `[0, 100]` percent, or an invalid rate/term.
pub fn solve_home_price(query: &HomePriceQuery) -> FinanceResult<Decimal> {
    ensure_non_negative("target_monthly_payment", query.target_monthly_payment)?;
    ensure_non_negative("property_tax_rate_percent", query.property_tax_rate_percent)?;
    ensure_non_negative("annual_insurance", query.annual_insurance)?;
    if query.down_payment_percent < dec!(0) || query.down_payment_percent > dec!(100) {
        return Err(FinanceError::invalid(
            "down_payment_percent",
            query.down_payment_percent,
            "must be between 0 and 100",
        ));
    }
    let terms = LoanTerms::from_years(dec!(0), query.annual_rate_percent, query.years)?;

    let available = query.target_monthly_payment - query.annual_insurance / dec!(12);
    if available <= dec!(0) {
        return Ok(dec!(0));
    }

    let loan_fraction = dec!(1) - query.down_payment_percent / dec!(100);
    let coefficient = annuity_coefficient(terms.monthly_rate(), terms.term_months());
    let monthly_tax_fraction = monthly_rate(query.property_tax_rate_percent);

    let denominator = loan_fraction * coefficient + monthly_tax_fraction;
    if denominator.is_zero() {
        // All cash, no tax: any price fits the budget.
        return Err(FinanceError::invalid(
            "down_payment_percent",
            query.down_payment_percent,
            "price is unbounded with a full down payment and no property tax",
        ));
    }

    Ok((available / denominator).max(dec!(0)))
}

pub(crate) fn principal_for_payment(payment: Decimal, terms: &LoanTerms) -> Decimal {
    let rate = terms.monthly_rate();
    if rate.is_zero() {
        return payment * Decimal::from(terms.term_months());
    }
    payment / annuity_coefficient(rate, terms.term_months())
}
