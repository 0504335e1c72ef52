//! Home buying calculators: affordability, renting against buying, and
//! saving for the down payment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ensure_percent, ensure_years};
use crate::amortization::{annuity_coefficient, balance_after, monthly_payment};
use crate::error::{FinanceError, FinanceResult, ensure_non_negative};
use crate::loan::{LoanTerms, MAX_TERM_MONTHS, monthly_rate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    pub annual_income: Decimal,
    /// Existing monthly debt payments (car, student loans, cards).
    pub monthly_debts: Decimal,
    pub down_payment: Decimal,
    pub annual_rate_percent: Decimal,
    pub term_years: u32,
    pub property_tax_rate_percent: Decimal,
    pub annual_insurance: Decimal,
    /// Highest debt-to-income ratio a lender will accept, e.g. 36.
    pub max_dti_percent: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affordability {
    pub max_home_price: Decimal,
    pub max_loan_amount: Decimal,
    /// Housing budget left under the DTI ceiling after existing debts.
    pub max_monthly_payment: Decimal,
    pub down_payment: Decimal,
}

/// Largest loan whose payment, property tax and insurance fit under the DTI
/// ceiling.
///
/// The tax term is charged on the loan amount, so it folds into the payment
/// coefficient: `loan = available / (coefficient + monthly_tax)`. At a zero
/// rate this becomes `available * n / (1 + monthly_tax * n)`. Negative
/// results are floored at zero.
pub fn home_affordability(input: &AffordabilityInput) -> FinanceResult<Affordability> {
    ensure_non_negative("annual_income", input.annual_income)?;
    ensure_non_negative("monthly_debts", input.monthly_debts)?;
    ensure_non_negative("down_payment", input.down_payment)?;
    ensure_non_negative("property_tax_rate_percent", input.property_tax_rate_percent)?;
    ensure_non_negative("annual_insurance", input.annual_insurance)?;
    ensure_percent("max_dti_percent", input.max_dti_percent)?;
    let terms = LoanTerms::from_years(dec!(0), input.annual_rate_percent, input.term_years)?;

    let max_monthly_payment = input.annual_income / dec!(12) * input.max_dti_percent / dec!(100) - input.monthly_debts;
    let available = max_monthly_payment - input.annual_insurance / dec!(12);
    let monthly_tax = monthly_rate(input.property_tax_rate_percent);
    let periods = Decimal::from(terms.term_months());

    let max_loan = if terms.monthly_rate().is_zero() {
        available * periods / (dec!(1) + monthly_tax * periods)
    } else {
        available / (annuity_coefficient(terms.monthly_rate(), terms.term_months()) + monthly_tax)
    };

    if max_loan < dec!(0) {
        debug!(%max_monthly_payment, "existing debts exceed the housing budget");
    }

    Ok(Affordability {
        max_home_price: (max_loan + input.down_payment).max(dec!(0)),
        max_loan_amount: max_loan.max(dec!(0)),
        max_monthly_payment,
        down_payment: input.down_payment,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuyInput {
    pub monthly_rent: Decimal,
    pub annual_rent_increase_percent: Decimal,
    pub home_price: Decimal,
    pub down_payment: Decimal,
    pub mortgage_rate_percent: Decimal,
    pub term_years: u32,
    pub property_tax_rate_percent: Decimal,
    pub maintenance_rate_percent: Decimal,
    pub home_appreciation_percent: Decimal,
    /// How many years to compare.
    pub years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentVsBuyYear {
    pub year: u32,
    pub rent_cost: Decimal,
    /// Mortgage payments, property tax and maintenance for the year.
    pub buy_cost: Decimal,
    pub cumulative_rent: Decimal,
    /// Includes the down payment.
    pub cumulative_buy: Decimal,
    /// Home value at the end of the year.
    pub home_value: Decimal,
    pub equity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentVsBuy {
    pub monthly_mortgage: Decimal,
    pub yearly: Vec<RentVsBuyYear>,
}

impl RentVsBuy {
    /// First year in which buying, net of the equity built, has cost less
    /// than renting.
    pub fn break_even_year(&self) -> Option<u32> {
        self.yearly
            .iter()
            .find(|year| year.cumulative_buy - year.equity < year.cumulative_rent)
            .map(|year| year.year)
    }
}

/// Year-by-year cost of renting against buying. Tax and maintenance are
/// charged on the home value at the start of each year; mortgage payments
/// stop once the loan term ends.
pub fn rent_vs_buy(input: &RentVsBuyInput) -> FinanceResult<RentVsBuy> {
    ensure_non_negative("monthly_rent", input.monthly_rent)?;
    ensure_non_negative("annual_rent_increase_percent", input.annual_rent_increase_percent)?;
    ensure_non_negative("home_price", input.home_price)?;
    ensure_non_negative("down_payment", input.down_payment)?;
    ensure_non_negative("property_tax_rate_percent", input.property_tax_rate_percent)?;
    ensure_non_negative("maintenance_rate_percent", input.maintenance_rate_percent)?;
    ensure_non_negative("home_appreciation_percent", input.home_appreciation_percent)?;
    ensure_years("years", input.years)?;
    if input.down_payment > input.home_price {
        return Err(FinanceError::invalid(
            "down_payment",
            input.down_payment,
            "must not exceed the home price",
        ));
    }
    let terms = LoanTerms::from_years(
        input.home_price - input.down_payment,
        input.mortgage_rate_percent,
        input.term_years,
    )?;

    let monthly_mortgage = monthly_payment(&terms);
    let rent_growth = dec!(1) + input.annual_rent_increase_percent / dec!(100);
    let appreciation = dec!(1) + input.home_appreciation_percent / dec!(100);

    let mut cumulative_rent = dec!(0);
    let mut cumulative_buy = input.down_payment;
    let mut current_rent = input.monthly_rent;
    let mut home_value = input.home_price;
    let mut yearly = Vec::with_capacity(input.years as usize);

    for year in 1..=input.years {
        let rent_cost = current_rent * dec!(12);
        cumulative_rent += rent_cost;

        let months_paid = terms.term_months().saturating_sub((year - 1) * 12).min(12);
        let buy_cost = monthly_mortgage * Decimal::from(months_paid)
            + home_value * (input.property_tax_rate_percent + input.maintenance_rate_percent) / dec!(100);
        cumulative_buy += buy_cost;

        home_value *= appreciation;
        current_rent *= rent_growth;

        yearly.push(RentVsBuyYear {
            year,
            rent_cost,
            buy_cost,
            cumulative_rent,
            cumulative_buy,
            home_value,
            equity: home_value - balance_after(&terms, year * 12),
        });
    }

    Ok(RentVsBuy {
        monthly_mortgage,
        yearly,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownPaymentInput {
    pub home_price: Decimal,
    /// Down payment goal as a percentage of the price.
    pub target_percent: Decimal,
    pub current_savings: Decimal,
    pub monthly_saving: Decimal,
    /// Annual yield on the savings account.
    pub savings_rate_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsYear {
    pub year: u32,
    pub savings: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownPaymentPlan {
    pub target: Decimal,
    /// `None` when the goal is not reached within 50 years.
    pub months_needed: Option<u32>,
    pub final_balance: Decimal,
    /// Balance at each year end, plus the final partial year.
    pub yearly: Vec<SavingsYear>,
}

/// Months of saving, with monthly compounding, until the down payment goal
/// is met.
pub fn down_payment_savings(input: &DownPaymentInput) -> FinanceResult<DownPaymentPlan> {
    ensure_non_negative("home_price", input.home_price)?;
    ensure_percent("target_percent", input.target_percent)?;
    ensure_non_negative("current_savings", input.current_savings)?;
    ensure_non_negative("monthly_saving", input.monthly_saving)?;
    ensure_non_negative("savings_rate_percent", input.savings_rate_percent)?;

    let target = input.home_price * input.target_percent / dec!(100);
    if input.current_savings >= target {
        return Ok(DownPaymentPlan {
            target,
            months_needed: Some(0),
            final_balance: input.current_savings,
            yearly: Vec::new(),
        });
    }

    let growth = dec!(1) + monthly_rate(input.savings_rate_percent);
    let mut balance = input.current_savings;
    let mut months = 0;
    let mut yearly = Vec::new();

    while balance < target && months < MAX_TERM_MONTHS {
        months += 1;
        balance = balance * growth + input.monthly_saving;
        if months % 12 == 0 {
            yearly.push(SavingsYear {
                year: months / 12,
                savings: balance,
            });
        }
    }
    if months % 12 != 0 {
        yearly.push(SavingsYear {
            year: months.div_ceil(12),
            savings: balance,
        });
    }

    let months_needed = if balance >= target {
        Some(months)
    } else {
        debug!(%target, %balance, "down payment goal out of reach");
        None
    };

    Ok(DownPaymentPlan {
        target,
        months_needed,
        final_balance: balance,
        yearly,
    })
}
