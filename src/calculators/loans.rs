//! Vehicle and consumer loan calculators.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_percent, ensure_years};
use crate::amortization::monthly_payment;
use crate::error::{FinanceError, FinanceResult, ensure_non_negative};
use crate::loan::LoanTerms;
use crate::payoff::{PayoffOutcome, simulate_payoff};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarLoanResult {
    pub financed_amount: Decimal,
    pub monthly_payment: Decimal,
    pub total_interest: Decimal,
    /// Everything paid for the car: down payment plus all installments.
    pub total_cost: Decimal,
}

pub fn car_loan(
    price: Decimal,
    down_payment: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> FinanceResult<CarLoanResult> {
    ensure_non_negative("price", price)?;
    ensure_non_negative("down_payment", down_payment)?;
    if down_payment > price {
        return Err(FinanceError::invalid("down_payment", down_payment, "must not exceed the price"));
    }
    let terms = LoanTerms::new(price - down_payment, annual_rate_percent, term_months)?;

    let payment = monthly_payment(&terms);
    let total_paid = if terms.monthly_rate().is_zero() {
        terms.principal()
    } else {
        payment * Decimal::from(term_months)
    };

    Ok(CarLoanResult {
        financed_amount: terms.principal(),
        monthly_payment: payment,
        total_interest: total_paid - terms.principal(),
        total_cost: total_paid + down_payment,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOffer {
    pub name: String,
    pub amount: Decimal,
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOfferCost {
    pub name: String,
    pub amount: Decimal,
    pub monthly_payment: Decimal,
    pub total_paid: Decimal,
    pub total_interest: Decimal,
}

/// Prices each offer side by side.
pub fn loan_comparison(offers: &[LoanOffer]) -> FinanceResult<Vec<LoanOfferCost>> {
    offers
        .iter()
        .map(|offer| {
            let terms = LoanTerms::new(offer.amount, offer.annual_rate_percent, offer.term_months)?;
            let payment = monthly_payment(&terms);
            let total_paid = payment * Decimal::from(offer.term_months);
            Ok(LoanOfferCost {
                name: offer.name.clone(),
                amount: offer.amount,
                monthly_payment: payment,
                total_paid,
                total_interest: total_paid - offer.amount,
            })
        })
        .collect()
}

/// The offer with the smallest total outlay; the first one wins a tie.
pub fn cheapest_offer(costs: &[LoanOfferCost]) -> Option<&LoanOfferCost> {
    costs.iter().reduce(|best, cost| if cost.total_paid < best.total_paid { cost } else { best })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DtiRating {
    /// Below 36%.
    Good,
    /// 36% to 43%, the usual qualified-mortgage ceiling.
    Caution,
    HighRisk,
}

impl DtiRating {
    pub fn for_ratio(ratio_percent: Decimal) -> DtiRating {
        if ratio_percent < dec!(36) {
            DtiRating::Good
        } else if ratio_percent <= dec!(43) {
            DtiRating::Caution
        } else {
            DtiRating::HighRisk
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtToIncome {
    pub ratio_percent: Decimal,
    pub remaining_income: Decimal,
    pub rating: DtiRating,
}

/// Monthly debt payments as a percentage of monthly income; zero income
/// reports 0.
pub fn debt_to_income_ratio(monthly_debts: Decimal, monthly_income: Decimal) -> FinanceResult<Decimal> {
    ensure_non_negative("monthly_debts", monthly_debts)?;
    ensure_non_negative("monthly_income", monthly_income)?;

    if monthly_income.is_zero() {
        return Ok(dec!(0));
    }
    Ok(monthly_debts / monthly_income * dec!(100))
}

pub fn debt_to_income(monthly_debts: Decimal, monthly_income: Decimal) -> FinanceResult<DebtToIncome> {
    let ratio_percent = debt_to_income_ratio(monthly_debts, monthly_income)?;
    Ok(DebtToIncome {
        ratio_percent,
        remaining_income: monthly_income - monthly_debts,
        rating: DtiRating::for_ratio(ratio_percent),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtAccount {
    pub name: String,
    pub balance: Decimal,
    pub annual_rate_percent: Decimal,
    pub minimum_payment: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtConsolidationResult {
    pub total_balance: Decimal,
    pub total_minimum_payments: Decimal,
    pub consolidated_payment: Decimal,
    /// Interest paying each debt at its minimum. A debt whose minimum never
    /// covers its interest is charged twice its balance.
    pub total_interest_separate: Decimal,
    pub total_interest_consolidated: Decimal,
    pub interest_saved: Decimal,
    pub monthly_payment_saved: Decimal,
    /// Debts whose minimum payment never retires them.
    pub diverging: Vec<String>,
}

/// Compares paying several debts at their minimums against one fixed-rate
/// loan for their combined balance.
pub fn debt_consolidation(
    debts: &[DebtAccount],
    consolidated_rate_percent: Decimal,
    consolidated_term_months: u32,
) -> FinanceResult<DebtConsolidationResult> {
    let mut total_balance = dec!(0);
    let mut total_minimum_payments = dec!(0);
    let mut total_interest_separate = dec!(0);
    let mut diverging = Vec::new();

    for debt in debts {
        ensure_non_negative("balance", debt.balance)?;
        ensure_non_negative("annual_rate_percent", debt.annual_rate_percent)?;
        ensure_non_negative("minimum_payment", debt.minimum_payment)?;

        total_balance += debt.balance;
        total_minimum_payments += debt.minimum_payment;

        match simulate_payoff(debt.balance, debt.annual_rate_percent, debt.minimum_payment) {
            PayoffOutcome::Diverges => {
                debug!(debt = %debt.name, "minimum payment never retires the balance");
                total_interest_separate += debt.balance * dec!(2);
                diverging.push(debt.name.clone());
            }
            outcome => total_interest_separate += outcome.total_interest().unwrap_or_default(),
        }
    }

    let consolidated = car_loan(total_balance, dec!(0), consolidated_rate_percent, consolidated_term_months)?;

    Ok(DebtConsolidationResult {
        total_balance,
        total_minimum_payments,
        consolidated_payment: consolidated.monthly_payment,
        total_interest_separate,
        total_interest_consolidated: consolidated.total_interest,
        interest_saved: total_interest_separate - consolidated.total_interest,
        monthly_payment_saved: total_minimum_payments - consolidated.monthly_payment,
        diverging,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub current_balance: Decimal,
    pub current_rate_percent: Decimal,
    pub remaining_months: u32,
    pub new_rate_percent: Decimal,
    pub new_term_months: u32,
    /// Rolled into the new loan.
    pub closing_costs: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceResult {
    pub current_payment: Decimal,
    pub new_payment: Decimal,
    pub monthly_savings: Decimal,
    /// Months of savings needed to recoup the closing costs. `None` when the
    /// new payment saves nothing.
    pub break_even_months: Option<u32>,
    pub current_total_cost: Decimal,
    pub new_total_cost: Decimal,
    pub total_savings: Decimal,
    pub closing_costs: Decimal,
}

pub fn refinance(input: &RefinanceInput) -> FinanceResult<RefinanceResult> {
    ensure_non_negative("closing_costs", input.closing_costs)?;
    let current = LoanTerms::new(input.current_balance, input.current_rate_percent, input.remaining_months)?;
    let replacement = LoanTerms::new(
        input.current_balance + input.closing_costs,
        input.new_rate_percent,
        input.new_term_months,
    )?;

    let current_payment = monthly_payment(&current);
    let new_payment = monthly_payment(&replacement);
    let monthly_savings = current_payment - new_payment;

    let break_even_months = if monthly_savings > dec!(0) {
        (input.closing_costs / monthly_savings).ceil().to_u32()
    } else {
        None
    };

    let current_total_cost = current_payment * Decimal::from(input.remaining_months);
    let new_total_cost = new_payment * Decimal::from(input.new_term_months);

    Ok(RefinanceResult {
        current_payment,
        new_payment,
        monthly_savings,
        break_even_months,
        current_total_cost,
        new_total_cost,
        total_savings: current_total_cost - new_total_cost,
        closing_costs: input.closing_costs,
    })
}

/// Value left after `years` of losing `depreciation_rate_percent` a year.
/// Whole years use exact integer powers.
pub(crate) fn depreciated_value(price: Decimal, depreciation_rate_percent: Decimal, years: Decimal) -> Decimal {
    let retained = dec!(1) - depreciation_rate_percent / dec!(100);
    if retained <= dec!(0) || price.is_zero() {
        return dec!(0);
    }

    let factor = if years.fract().is_zero() {
        years.to_u64().and_then(|whole| retained.checked_powu(whole))
    } else {
        retained.checked_powd(years)
    };
    price * factor.unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseVsBuyInput {
    pub price: Decimal,
    pub down_payment: Decimal,
    pub loan_rate_percent: Decimal,
    pub loan_term_months: u32,
    pub lease_monthly: Decimal,
    pub lease_term_months: u32,
    pub lease_down_payment: Decimal,
    /// Buyout price quoted by the lessor at lease end.
    pub residual_value: Decimal,
    pub depreciation_rate_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseVsBuyResult {
    pub total_lease_cost: Decimal,
    pub total_buy_cost: Decimal,
    pub monthly_buy: Decimal,
    pub monthly_lease: Decimal,
    pub car_value_after_lease: Decimal,
    /// Market value of the car once the loan is paid off.
    pub equity_after_loan: Decimal,
    pub residual_value: Decimal,
    /// Positive when buying comes out cheaper once the car's value is counted.
    pub savings_if_buy: Decimal,
}

pub fn lease_vs_buy(input: &LeaseVsBuyInput) -> FinanceResult<LeaseVsBuyResult> {
    ensure_non_negative("lease_monthly", input.lease_monthly)?;
    ensure_non_negative("lease_down_payment", input.lease_down_payment)?;
    ensure_non_negative("residual_value", input.residual_value)?;
    ensure_percent("depreciation_rate_percent", input.depreciation_rate_percent)?;
    if input.lease_term_months == 0 {
        return Err(FinanceError::invalid("lease_term_months", input.lease_term_months, "must be at least one month"));
    }

    let loan = car_loan(input.price, input.down_payment, input.loan_rate_percent, input.loan_term_months)?;
    let total_lease_cost = input.lease_down_payment + input.lease_monthly * Decimal::from(input.lease_term_months);

    let years = |months: u32| Decimal::from(months) / dec!(12);
    let car_value_after_lease = depreciated_value(input.price, input.depreciation_rate_percent, years(input.lease_term_months));
    let equity_after_loan = depreciated_value(input.price, input.depreciation_rate_percent, years(input.loan_term_months));

    Ok(LeaseVsBuyResult {
        total_lease_cost,
        total_buy_cost: loan.total_cost,
        monthly_buy: loan.monthly_payment,
        monthly_lease: input.lease_monthly,
        car_value_after_lease,
        equity_after_loan,
        residual_value: input.residual_value,
        savings_if_buy: total_lease_cost - (loan.total_cost - equity_after_loan),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipInput {
    pub purchase_price: Decimal,
    pub down_payment: Decimal,
    pub loan_rate_percent: Decimal,
    pub loan_term_months: u32,
    pub years_owned: u32,
    pub annual_insurance: Decimal,
    pub annual_maintenance: Decimal,
    pub monthly_fuel: Decimal,
    pub depreciation_rate_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComponent {
    pub label: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipCost {
    pub total_cost: Decimal,
    pub depreciation: Decimal,
    pub total_insurance: Decimal,
    pub total_maintenance: Decimal,
    pub total_fuel: Decimal,
    /// Interest paid on the car loan.
    pub total_financing: Decimal,
    pub resale_value: Decimal,
    pub cost_per_month: Decimal,
    pub cost_per_year: Decimal,
    pub breakdown: Vec<CostComponent>,
}

/// Cash spent on a car over `years_owned`: the financed purchase plus
/// insurance, maintenance and fuel. Depreciation is reported separately.
pub fn total_cost_of_ownership(input: &OwnershipInput) -> FinanceResult<OwnershipCost> {
    ensure_non_negative("annual_insurance", input.annual_insurance)?;
    ensure_non_negative("annual_maintenance", input.annual_maintenance)?;
    ensure_non_negative("monthly_fuel", input.monthly_fuel)?;
    ensure_percent("depreciation_rate_percent", input.depreciation_rate_percent)?;
    ensure_years("years_owned", input.years_owned)?;

    let loan = car_loan(
        input.purchase_price,
        input.down_payment,
        input.loan_rate_percent,
        input.loan_term_months,
    )?;
    let years = Decimal::from(input.years_owned);

    let total_insurance = input.annual_insurance * years;
    let total_maintenance = input.annual_maintenance * years;
    let total_fuel = input.monthly_fuel * dec!(12) * years;
    let resale_value = depreciated_value(input.purchase_price, input.depreciation_rate_percent, years);
    let depreciation = input.purchase_price - resale_value;
    let total_cost = loan.total_cost + total_insurance + total_maintenance + total_fuel;

    let component = |label: &str, value: Decimal| CostComponent {
        label: label.to_string(),
        value,
    };

    Ok(OwnershipCost {
        total_cost,
        depreciation,
        total_insurance,
        total_maintenance,
        total_fuel,
        total_financing: loan.total_interest,
        resale_value,
        cost_per_month: total_cost / (years * dec!(12)),
        cost_per_year: total_cost / years,
        breakdown: vec![
            component("Purchase Price", input.purchase_price),
            component("Financing Cost", loan.total_interest),
            component("Insurance", total_insurance),
            component("Maintenance", total_maintenance),
            component("Fuel", total_fuel),
            component("Depreciation", depreciation),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_car_loan_with_interest() {
        let result = car_loan(dec!(30000), dec!(5000), dec!(6), 60).unwrap();
        assert_eq!(result.financed_amount, dec!(25000));
        assert_eq!(result.monthly_payment.round_dp(2), dec!(483.32));
        assert_eq!(result.total_cost, result.monthly_payment * dec!(60) + dec!(5000));
        assert_eq!(result.total_interest, result.monthly_payment * dec!(60) - dec!(25000));
    }

    #[test]
    fn test_car_loan_at_zero_rate() {
        let result = car_loan(dec!(30000), dec!(5000), dec!(0), 50).unwrap();
        assert_eq!(result.monthly_payment, dec!(500));
        assert_eq!(result.total_interest, dec!(0));
        assert_eq!(result.total_cost, dec!(30000));
    }

    #[test]
    fn test_car_loan_rejects_excess_down_payment() {
        assert!(car_loan(dec!(10000), dec!(12000), dec!(5), 36).is_err());
    }

    #[test]
    fn test_loan_comparison_picks_lowest_total() {
        let offers = vec![
            LoanOffer {
                name: "Bank".to_string(),
                amount: dec!(20000),
                annual_rate_percent: dec!(7),
                term_months: 60,
            },
            LoanOffer {
                name: "Credit union".to_string(),
                amount: dec!(20000),
                annual_rate_percent: dec!(5.5),
                term_months: 60,
            },
            LoanOffer {
                name: "Dealer".to_string(),
                amount: dec!(20000),
                annual_rate_percent: dec!(0),
                term_months: 36,
            },
        ];
        let costs = loan_comparison(&offers).unwrap();

        assert_eq!(costs.len(), 3);
        assert!(costs[1].total_interest < costs[0].total_interest);
        assert_eq!(cheapest_offer(&costs).map(|cost| cost.name.as_str()), Some("Dealer"));
        assert!(cheapest_offer(&[]).is_none());
    }

    #[rstest]
    #[case(dec!(1000), dec!(5000), dec!(20), DtiRating::Good)]
    #[case(dec!(1800), dec!(5000), dec!(36), DtiRating::Caution)]
    #[case(dec!(2150), dec!(5000), dec!(43), DtiRating::Caution)]
    #[case(dec!(2500), dec!(5000), dec!(50), DtiRating::HighRisk)]
    fn test_debt_to_income(
        #[case] debts: Decimal,
        #[case] income: Decimal,
        #[case] ratio: Decimal,
        #[case] rating: DtiRating,
    ) {
        let dti = debt_to_income(debts, income).unwrap();
        assert_eq!(dti.ratio_percent, ratio);
        assert_eq!(dti.rating, rating);
        assert_eq!(dti.remaining_income, income - debts);
    }

    #[test]
    fn test_zero_income_ratio_is_zero() {
        assert_eq!(debt_to_income_ratio(dec!(500), dec!(0)), Ok(dec!(0)));
    }

    #[test]
    fn test_consolidation_charges_double_for_diverging_debt() {
        let debts = vec![
            DebtAccount {
                name: "Store card".to_string(),
                balance: dec!(5000),
                annual_rate_percent: dec!(22),
                minimum_payment: dec!(50),
            },
            DebtAccount {
                name: "Family loan".to_string(),
                balance: dec!(1200),
                annual_rate_percent: dec!(0),
                minimum_payment: dec!(100),
            },
        ];
        let result = debt_consolidation(&debts, dec!(0), 62).unwrap();

        assert_eq!(result.total_balance, dec!(6200));
        assert_eq!(result.total_minimum_payments, dec!(150));
        assert_eq!(result.total_interest_separate, dec!(10000));
        assert_eq!(result.consolidated_payment, dec!(100));
        assert_eq!(result.total_interest_consolidated, dec!(0));
        assert_eq!(result.interest_saved, dec!(10000));
        assert_eq!(result.monthly_payment_saved, dec!(50));
        assert_eq!(result.diverging, vec!["Store card".to_string()]);
    }

    #[test]
    fn test_refinance_break_even() {
        let input = RefinanceInput {
            current_balance: dec!(200000),
            current_rate_percent: dec!(7),
            remaining_months: 300,
            new_rate_percent: dec!(5),
            new_term_months: 360,
            closing_costs: dec!(4000),
        };
        let result = refinance(&input).unwrap();

        assert_eq!(result.current_payment.round_dp(2), dec!(1413.56));
        assert_eq!(result.new_payment.round_dp(2), dec!(1095.12));
        assert_eq!(result.break_even_months, Some(13));
    }

    #[test]
    fn test_refinance_without_savings_never_breaks_even() {
        let input = RefinanceInput {
            current_balance: dec!(200000),
            current_rate_percent: dec!(5),
            remaining_months: 300,
            new_rate_percent: dec!(7),
            new_term_months: 300,
            closing_costs: dec!(4000),
        };
        let result = refinance(&input).unwrap();

        assert!(result.monthly_savings < dec!(0));
        assert_eq!(result.break_even_months, None);
    }

    #[test]
    fn test_lease_vs_buy() {
        let input = LeaseVsBuyInput {
            price: dec!(30000),
            down_payment: dec!(0),
            loan_rate_percent: dec!(0),
            loan_term_months: 60,
            lease_monthly: dec!(300),
            lease_term_months: 36,
            lease_down_payment: dec!(2000),
            residual_value: dec!(18000),
            depreciation_rate_percent: dec!(15),
        };
        let result = lease_vs_buy(&input).unwrap();

        assert_eq!(result.total_lease_cost, dec!(12800));
        assert_eq!(result.total_buy_cost, dec!(30000));
        assert_eq!(result.monthly_buy, dec!(500));
        assert_eq!(result.car_value_after_lease, dec!(18423.75));
        assert_eq!(result.equity_after_loan, dec!(13311.159375));
        assert_eq!(result.savings_if_buy, dec!(12800) - (dec!(30000) - dec!(13311.159375)));
    }

    #[test]
    fn test_partial_year_depreciation_lies_between_whole_years() {
        let two = depreciated_value(dec!(30000), dec!(15), dec!(2));
        let two_and_half = depreciated_value(dec!(30000), dec!(15), dec!(2.5));
        let three = depreciated_value(dec!(30000), dec!(15), dec!(3));
        assert!(three < two_and_half && two_and_half < two);
        assert_eq!(depreciated_value(dec!(30000), dec!(100), dec!(1)), dec!(0));
    }

    #[test]
    fn test_total_cost_of_ownership_for_cash_purchase() {
        let input = OwnershipInput {
            purchase_price: dec!(30000),
            down_payment: dec!(30000),
            loan_rate_percent: dec!(6),
            loan_term_months: 60,
            years_owned: 5,
            annual_insurance: dec!(1200),
            annual_maintenance: dec!(800),
            monthly_fuel: dec!(150),
            depreciation_rate_percent: dec!(15),
        };
        let cost = total_cost_of_ownership(&input).unwrap();

        assert_eq!(cost.total_financing, dec!(0));
        assert_eq!(cost.total_fuel, dec!(9000));
        assert_eq!(cost.total_cost, dec!(49000));
        assert_eq!(cost.cost_per_year, dec!(9800));
        assert_eq!(cost.resale_value, dec!(13311.159375));
        assert_eq!(cost.depreciation, dec!(16688.840625));
        assert_eq!(cost.breakdown.len(), 6);
    }
}
