//! Month-by-month payoff of a revolving balance (credit cards, lines of
//! credit) at a fixed payment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::loan::{MAX_TERM_MONTHS, monthly_rate};

/// Balance at or below which the debt counts as repaid.
pub const PAYOFF_EPSILON: Decimal = dec!(0.01);

/// Simulation horizon; a payment that needs longer than 50 years is treated
/// as never finishing.
pub const MAX_PAYOFF_MONTHS: u32 = MAX_TERM_MONTHS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffStep {
    pub month: u32,
    /// Balance after this month's payment.
    pub balance: Decimal,
    pub interest: Decimal,
    pub principal_paid: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffPlan {
    pub months: u32,
    pub total_interest: Decimal,
    /// Zero for a completed payoff, positive when the horizon was hit.
    pub remaining_balance: Decimal,
    pub steps: Vec<PayoffStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayoffOutcome {
    /// The balance reached [`PAYOFF_EPSILON`].
    PaidOff(PayoffPlan),
    /// [`MAX_PAYOFF_MONTHS`] elapsed with a balance still outstanding.
    CapReached(PayoffPlan),
    /// The payment does not cover the monthly interest; the balance never
    /// shrinks.
    Diverges,
}

impl PayoffOutcome {
    pub fn plan(&self) -> Option<&PayoffPlan> {
        match self {
            PayoffOutcome::PaidOff(plan) | PayoffOutcome::CapReached(plan) => Some(plan),
            PayoffOutcome::Diverges => None,
        }
    }

    /// Months until the balance is gone, if it ever is within the horizon.
    pub fn months_to_payoff(&self) -> Option<u32> {
        match self {
            PayoffOutcome::PaidOff(plan) => Some(plan.months),
            _ => None,
        }
    }

    /// Interest paid over the simulated months. `None` when the balance
    /// diverges.
    pub fn total_interest(&self) -> Option<Decimal> {
        self.plan().map(|plan| plan.total_interest)
    }

    pub fn is_paid_off(&self) -> bool {
        matches!(self, PayoffOutcome::PaidOff(_))
    }
}

/// Simulates paying `monthly_payment` against `balance` at `apr_percent`.
///
/// Each month accrues `balance * apr / 12` interest; the rest of the payment
/// (capped at the outstanding balance) goes to principal. If a payment ever
/// fails to exceed the interest, the outcome is [`PayoffOutcome::Diverges`].
pub fn simulate_payoff(balance: Decimal, apr_percent: Decimal, monthly_payment: Decimal) -> PayoffOutcome {
    let rate = monthly_rate(apr_percent);
    let mut remaining = balance;
    let mut total_interest = dec!(0);
    let mut steps = Vec::new();
    let mut month = 0;

    while remaining > PAYOFF_EPSILON && month < MAX_PAYOFF_MONTHS {
        month += 1;
        let interest = remaining * rate;
        if monthly_payment <= interest {
            debug!(%balance, %apr_percent, %monthly_payment, month, "payment does not cover interest");
            return PayoffOutcome::Diverges;
        }

        let principal_paid = (monthly_payment - interest).min(remaining);
        remaining -= principal_paid;
        total_interest += interest;
        steps.push(PayoffStep {
            month,
            balance: remaining.max(dec!(0)),
            interest,
            principal_paid,
        });
    }

    let plan = PayoffPlan {
        months: month,
        total_interest,
        remaining_balance: remaining.max(dec!(0)),
        steps,
    };

    if remaining > PAYOFF_EPSILON {
        warn!(%balance, %apr_percent, %monthly_payment, "payoff horizon reached with balance outstanding");
        PayoffOutcome::CapReached(plan)
    } else {
        PayoffOutcome::PaidOff(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_below_interest_diverges() {
        // 5000 at 22% accrues about 91.67 a month.
        let outcome = simulate_payoff(dec!(5000), dec!(22), dec!(50));

        assert_eq!(outcome, PayoffOutcome::Diverges);
        assert_eq!(outcome.months_to_payoff(), None);
        assert_eq!(outcome.total_interest(), None);
    }

    #[test]
    fn test_payment_equal_to_interest_diverges() {
        // 1200 at 12% accrues exactly 12 a month.
        assert_eq!(simulate_payoff(dec!(1200), dec!(12), dec!(12)), PayoffOutcome::Diverges);
    }

    #[test]
    fn test_card_pays_off() {
        let outcome = simulate_payoff(dec!(5000), dec!(22), dec!(200));
        let plan = outcome.plan().unwrap();

        assert!(outcome.is_paid_off());
        assert_eq!(plan.months, 34);
        assert_eq!(plan.steps.len(), 34);
        assert_eq!(plan.remaining_balance, dec!(0));
        assert_eq!(plan.total_interest.round_dp(2), dec!(1749.88));

        let repaid: Decimal = plan.steps.iter().map(|step| step.principal_paid).sum();
        assert!((repaid - dec!(5000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let outcome = simulate_payoff(dec!(1000), dec!(0), dec!(100));
        assert_eq!(outcome.months_to_payoff(), Some(10));
        assert_eq!(outcome.total_interest(), Some(dec!(0)));
    }

    #[test]
    fn test_horizon_is_capped() {
        // Interest is 99.99 a month, leaving a cent of principal in month one.
        let outcome = simulate_payoff(dec!(10000), dec!(11.9988), dec!(100));

        match outcome {
            PayoffOutcome::CapReached(plan) => {
                assert_eq!(plan.months, MAX_PAYOFF_MONTHS);
                assert!(plan.remaining_balance > dec!(9000));
            }
            other => panic!("expected cap, got {other:?}"),
        }
    }

    #[test]
    fn test_settled_balance_needs_no_months() {
        let outcome = simulate_payoff(dec!(0.01), dec!(20), dec!(25));
        assert_eq!(outcome.months_to_payoff(), Some(0));
    }
}
