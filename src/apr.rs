//! Annual percentage rate including financed fees.
//!
//! The borrower makes the nominal payment on the full loan amount but only
//! receives `loan - fees`. The APR is the monthly rate `r` at which that
//! payment exactly amortizes the net amount, found with Newton-Raphson on
//!
//! ```text
//! f(r)  = net * r(1+r)^n / ((1+r)^n - 1) - payment
//! ```
//!
//! and reported as `r * 12 * 100`.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::amortization::monthly_payment;
use crate::error::{FinanceError, FinanceResult, ensure_non_negative, ensure_positive};
use crate::loan::LoanTerms;

/// Newton-Raphson converges quadratically from the nominal-rate seed for any
/// realistic fee load; 100 steps is far beyond what a convergent solve needs.
pub const MAX_APR_ITERATIONS: u32 = 100;

/// Residual, in currency units of payment, below which the solve has converged.
pub const APR_TOLERANCE: Decimal = dec!(0.0000000001);

/// Derivative magnitude below which a Newton step would blow up.
pub const MIN_DERIVATIVE: Decimal = dec!(0.000000000001);

/// How the APR iteration terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// The residual dropped below [`APR_TOLERANCE`].
    Converged,
    /// [`MAX_APR_ITERATIONS`] steps ran without converging.
    IterationCap,
    /// The derivative vanished; the last estimate is reported.
    FlatDerivative,
    /// The iterate left the range where `(1 + r)^n` is representable.
    Overflow,
}

impl SolverStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, SolverStatus::Converged)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AprQuote {
    /// Effective annual rate in percent.
    pub apr: Decimal,
    /// The stated annual rate in percent.
    pub nominal_rate: Decimal,
    /// Nominal monthly payment on the full loan amount.
    pub payment: Decimal,
    pub total_fees: Decimal,
    /// Sum of all payments.
    pub total_cost: Decimal,
    /// Sum of all payments minus the loan amount.
    pub total_interest: Decimal,
    pub status: SolverStatus,
    pub iterations: u32,
}

/// Solves for the APR of a loan whose fees are deducted from the proceeds.
///
/// # Errors
///
/// Returns `FinanceError::InvalidInput` unless `loan_amount > 0`,
/// `0 <= fees < loan_amount` and the rate/term are valid loan terms.
pub fn solve_apr(
    loan_amount: Decimal,
    fees: Decimal,
    nominal_rate_percent: Decimal,
    term_months: u32,
) -> FinanceResult<AprQuote> {
    ensure_positive("loan_amount", loan_amount)?;
    ensure_non_negative("fees", fees)?;
    if fees >= loan_amount {
        return Err(FinanceError::invalid("fees", fees, "must be less than the loan amount"));
    }
    let terms = LoanTerms::new(loan_amount, nominal_rate_percent, term_months)?;

    let payment = monthly_payment(&terms);
    let (monthly_apr, status, iterations) = newton_solve(loan_amount - fees, payment, &terms);

    if !status.is_converged() {
        warn!(
            ?status,
            iterations,
            %loan_amount,
            %fees,
            %nominal_rate_percent,
            term_months,
            "APR solve did not converge, returning last estimate"
        );
    }

    let total_cost = payment * Decimal::from(term_months);
    Ok(AprQuote {
        apr: monthly_apr * dec!(12) * dec!(100),
        nominal_rate: nominal_rate_percent,
        payment,
        total_fees: fees,
        total_cost,
        total_interest: total_cost - loan_amount,
        status,
        iterations,
    })
}

fn newton_solve(net_amount: Decimal, payment: Decimal, terms: &LoanTerms) -> (Decimal, SolverStatus, u32) {
    let periods = terms.term_months();
    let mut rate = terms.monthly_rate();

    for iteration in 0..MAX_APR_ITERATIONS {
        let Some((coefficient, slope)) = coefficient_with_slope(rate, periods) else {
            return (rate, SolverStatus::Overflow, iteration);
        };

        let Some(residual) = net_amount.checked_mul(coefficient).and_then(|owed| owed.checked_sub(payment)) else {
            return (rate, SolverStatus::Overflow, iteration);
        };
        if residual.abs() < APR_TOLERANCE {
            debug!(iteration, %rate, "APR solve converged");
            return (rate, SolverStatus::Converged, iteration);
        }

        let Some(derivative) = net_amount.checked_mul(slope) else {
            return (rate, SolverStatus::Overflow, iteration);
        };
        if derivative.abs() < MIN_DERIVATIVE {
            return (rate, SolverStatus::FlatDerivative, iteration);
        }

        match residual.checked_div(derivative).and_then(|step| rate.checked_sub(step)) {
            Some(next) => rate = next,
            None => return (rate, SolverStatus::Overflow, iteration),
        }
    }

    (rate, SolverStatus::IterationCap, MAX_APR_ITERATIONS)
}

/// The annuity coefficient `c(r) = r g / (g - 1)` with `g = (1 + r)^n`, and
/// its derivative in logarithmic form
///
/// ```text
/// c'(r) = c/r - c n / ((1 + r)(g - 1))
/// ```
///
/// which stays bounded however large `g` grows.
/// At `r = 0` both take their limits `1/n` and `(n + 1) / 2n`.
fn coefficient_with_slope(rate: Decimal, periods: u32) -> Option<(Decimal, Decimal)> {
    let n = Decimal::from(periods);
    if rate.is_zero() {
        return Some((dec!(1) / n, (n + dec!(1)) / (dec!(2) * n)));
    }

    let base = dec!(1) + rate;
    let growth = base.checked_powu(periods.into())?;
    let excess = growth.checked_sub(dec!(1))?;
    if excess.is_zero() {
        return Some((dec!(1) / n, (n + dec!(1)) / (dec!(2) * n)));
    }

    let coefficient = rate.checked_mul(growth)?.checked_div(excess)?;
    let damping = coefficient.checked_mul(n)?.checked_div(base.checked_mul(excess)?)?;
    let slope = coefficient.checked_div(rate)?.checked_sub(damping)?;

    Some((coefficient, slope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::annuity_coefficient;
    use rstest::rstest;

    #[test]
    fn test_zero_fees_return_nominal_rate() {
        let quote = solve_apr(dec!(200000), dec!(0), dec!(6.5), 360).unwrap();

        assert_eq!(quote.status, SolverStatus::Converged);
        assert_eq!(quote.iterations, 0);
        assert!((quote.apr - dec!(6.5)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_fees_raise_the_apr() {
        let quote = solve_apr(dec!(200000), dec!(4000), dec!(6), 360).unwrap();

        assert!(quote.status.is_converged());
        // 2% points on a 30-year 6% loan add roughly 0.19 percentage points.
        assert!(quote.apr > dec!(6.15) && quote.apr < dec!(6.25), "apr = {}", quote.apr);
        assert_eq!(quote.total_fees, dec!(4000));
    }

    #[test]
    fn test_zero_nominal_rate_with_fees() {
        let quote = solve_apr(dec!(12000), dec!(600), dec!(0), 12).unwrap();

        assert!(quote.status.is_converged());
        assert!(quote.apr > dec!(0));
        assert_eq!(quote.payment, dec!(1000));
        assert_eq!(quote.total_interest, dec!(0));
    }

    #[rstest]
    #[case(dec!(0), dec!(0))]
    #[case(dec!(1000), dec!(1000))]
    #[case(dec!(1000), dec!(-1))]
    fn test_invalid_amounts_are_rejected(#[case] loan: Decimal, #[case] fees: Decimal) {
        assert!(solve_apr(loan, fees, dec!(5), 60).is_err());
    }

    #[rstest]
    #[case(dec!(10000), dec!(9000), dec!(10), 360)]
    #[case(dec!(10000), dec!(9500), dec!(10), 360)]
    #[case(dec!(10000), dec!(100), dec!(80), 600)]
    #[case(dec!(10000), dec!(7000), dec!(25), 600)]
    #[case(dec!(10000), dec!(8000), dec!(25), 600)]
    #[case(dec!(10000), dec!(9000), dec!(25), 600)]
    fn test_heavy_fees_and_long_terms_never_panic(
        #[case] loan: Decimal,
        #[case] fees: Decimal,
        #[case] rate: Decimal,
        #[case] months: u32,
    ) {
        let quote = solve_apr(loan, fees, rate, months).unwrap();
        assert!(quote.apr > rate, "apr = {} ({:?})", quote.apr, quote.status);
    }

    #[test]
    fn test_ninety_percent_fees_converge() {
        let quote = solve_apr(dec!(10000), dec!(9000), dec!(10), 360).unwrap();

        assert!(quote.status.is_converged(), "{:?}", quote.status);
        // The payment on a tenth of the proceeds is close to the bare monthly rate.
        assert!(quote.apr > dec!(100) && quote.apr < dec!(110), "apr = {}", quote.apr);
    }

    #[test]
    fn test_slope_matches_finite_difference() {
        let rate = dec!(0.005);
        let h = dec!(0.0000001);
        let (_, slope) = coefficient_with_slope(rate, 360).unwrap();
        let numeric = (annuity_coefficient(rate + h, 360) - annuity_coefficient(rate - h, 360)) / (dec!(2) * h);

        assert!((slope - numeric).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_slope_limit_at_zero() {
        let (coefficient, slope) = coefficient_with_slope(dec!(0), 12).unwrap();
        assert_eq!(coefficient, dec!(1) / dec!(12));
        assert_eq!(slope, dec!(13) / dec!(24));
    }
}
