//! Savings and investment growth projections.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ensure_years;
use crate::error::{FinanceError, FinanceResult, ensure_non_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundingFrequency {
    Annually,
    Quarterly,
    Monthly,
    Daily,
}

impl CompoundingFrequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            CompoundingFrequency::Annually => 1,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Daily => 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthYear {
    pub year: u32,
    pub balance: Decimal,
    /// Everything deposited so far, including the opening principal.
    pub contributions: Decimal,
    pub interest: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundInterestResult {
    pub final_balance: Decimal,
    pub total_contributions: Decimal,
    pub total_interest: Decimal,
    pub yearly: Vec<GrowthYear>,
}

/// Balance of a savings account compounding `frequency` times a year, with a
/// monthly deposit spread evenly over the compounding periods.
pub fn compound_interest(
    principal: Decimal,
    annual_rate_percent: Decimal,
    frequency: CompoundingFrequency,
    years: u32,
    monthly_contribution: Decimal,
) -> FinanceResult<CompoundInterestResult> {
    ensure_non_negative("principal", principal)?;
    ensure_non_negative("annual_rate_percent", annual_rate_percent)?;
    ensure_non_negative("monthly_contribution", monthly_contribution)?;
    ensure_years("years", years)?;

    let periods = Decimal::from(frequency.periods_per_year());
    let periodic_growth = dec!(1) + annual_rate_percent / dec!(100) / periods;
    let annual_deposit = monthly_contribution * dec!(12);
    let deposit_per_period = annual_deposit / periods;

    let mut balance = principal;
    let mut contributions = principal;
    let mut yearly = Vec::with_capacity(years as usize);

    for year in 1..=years {
        for _ in 0..frequency.periods_per_year() {
            balance = balance * periodic_growth + deposit_per_period;
        }
        contributions += annual_deposit;
        yearly.push(GrowthYear {
            year,
            balance,
            contributions,
            interest: balance - contributions,
        });
    }

    Ok(CompoundInterestResult {
        final_balance: balance,
        total_contributions: contributions,
        total_interest: balance - contributions,
        yearly,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleInterestResult {
    pub total: Decimal,
    pub interest: Decimal,
    pub yearly: Vec<GrowthYear>,
}

pub fn simple_interest(principal: Decimal, annual_rate_percent: Decimal, years: u32) -> FinanceResult<SimpleInterestResult> {
    ensure_non_negative("principal", principal)?;
    ensure_non_negative("annual_rate_percent", annual_rate_percent)?;
    ensure_years("years", years)?;

    let yearly_interest = principal * annual_rate_percent / dec!(100);
    let yearly = (1..=years)
        .map(|year| {
            let interest = yearly_interest * Decimal::from(year);
            GrowthYear {
                year,
                balance: principal + interest,
                contributions: principal,
                interest,
            }
        })
        .collect();

    let interest = yearly_interest * Decimal::from(years);
    Ok(SimpleInterestResult {
        total: principal + interest,
        interest,
        yearly,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentGrowthInput {
    pub principal: Decimal,
    pub monthly_contribution: Decimal,
    pub annual_return_percent: Decimal,
    /// Fund expense ratio, deducted from the return.
    pub annual_fee_percent: Decimal,
    pub inflation_rate_percent: Decimal,
    pub years: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentYear {
    pub year: u32,
    pub nominal: Decimal,
    /// `nominal` in today's money.
    pub real: Decimal,
    pub contributions: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentGrowthResult {
    pub final_nominal: Decimal,
    pub final_real: Decimal,
    pub total_contributions: Decimal,
    /// Nominal growth above contributions, floored at zero.
    pub total_gains: Decimal,
    pub yearly: Vec<InvestmentYear>,
}

/// Yearly projection: a year's deposits are added up front and the whole
/// balance then earns the return net of fees.
pub fn investment_growth(input: &InvestmentGrowthInput) -> FinanceResult<InvestmentGrowthResult> {
    ensure_non_negative("principal", input.principal)?;
    ensure_non_negative("monthly_contribution", input.monthly_contribution)?;
    ensure_non_negative("annual_return_percent", input.annual_return_percent)?;
    ensure_non_negative("annual_fee_percent", input.annual_fee_percent)?;
    ensure_non_negative("inflation_rate_percent", input.inflation_rate_percent)?;
    ensure_years("years", input.years)?;

    let net_growth = dec!(1) + (input.annual_return_percent - input.annual_fee_percent) / dec!(100);
    if net_growth <= dec!(0) {
        return Err(FinanceError::invalid(
            "annual_fee_percent",
            input.annual_fee_percent,
            "fees would wipe out the whole balance",
        ));
    }
    let inflation_growth = dec!(1) + input.inflation_rate_percent / dec!(100);
    let annual_deposit = input.monthly_contribution * dec!(12);

    let mut nominal = input.principal;
    let mut contributions = input.principal;
    let mut deflator = dec!(1);
    let mut yearly = Vec::with_capacity(input.years as usize);

    for year in 1..=input.years {
        nominal = (nominal + annual_deposit) * net_growth;
        contributions += annual_deposit;
        deflator *= inflation_growth;
        yearly.push(InvestmentYear {
            year,
            nominal,
            real: nominal / deflator,
            contributions,
        });
    }

    Ok(InvestmentGrowthResult {
        final_nominal: nominal,
        final_real: yearly.last().map_or(nominal, |last| last.real),
        total_contributions: contributions,
        total_gains: (nominal - contributions).max(dec!(0)),
        yearly,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasingPowerYear {
    pub year: u32,
    pub value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflationResult {
    /// What `amount` will buy after `years`, in today's money.
    pub future_value: Decimal,
    pub purchasing_power_lost: Decimal,
    pub yearly: Vec<PurchasingPowerYear>,
}

pub fn inflation_adjusted(amount: Decimal, inflation_rate_percent: Decimal, years: u32) -> FinanceResult<InflationResult> {
    ensure_non_negative("amount", amount)?;
    ensure_non_negative("inflation_rate_percent", inflation_rate_percent)?;
    ensure_years("years", years)?;

    let growth = dec!(1) + inflation_rate_percent / dec!(100);
    let mut deflator = dec!(1);
    let yearly: Vec<_> = (1..=years)
        .map(|year| {
            deflator *= growth;
            PurchasingPowerYear {
                year,
                value: amount / deflator,
            }
        })
        .collect();

    let future_value = yearly.last().map_or(amount, |last| last.value);
    Ok(InflationResult {
        future_value,
        purchasing_power_lost: amount - future_value,
        yearly,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiResult {
    /// Negative for a loss.
    pub gain: Decimal,
    pub roi_percent: Decimal,
}

/// Return on investment. A zero initial investment reports 0%.
pub fn roi(initial_investment: Decimal, final_value: Decimal) -> FinanceResult<RoiResult> {
    ensure_non_negative("initial_investment", initial_investment)?;
    ensure_non_negative("final_value", final_value)?;

    let gain = final_value - initial_investment;
    let roi_percent = if initial_investment.is_zero() {
        dec!(0)
    } else {
        gain / initial_investment * dec!(100)
    };
    Ok(RoiResult { gain, roi_percent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_compound_interest_annually() {
        let result = compound_interest(dec!(1000), dec!(12), CompoundingFrequency::Annually, 2, dec!(0)).unwrap();
        assert_eq!(result.final_balance, dec!(1254.4));
        assert_eq!(result.total_interest, dec!(254.4));
        assert_eq!(result.yearly[0].balance, dec!(1120));
    }

    #[test]
    fn test_compound_interest_counts_contributions() {
        let result = compound_interest(dec!(1000), dec!(12), CompoundingFrequency::Annually, 1, dec!(100)).unwrap();
        assert_eq!(result.final_balance, dec!(2320));
        assert_eq!(result.total_contributions, dec!(2200));
        assert_eq!(result.total_interest, dec!(120));
    }

    #[test]
    fn test_compound_interest_zero_rate_is_deposits() {
        let result = compound_interest(dec!(10000), dec!(0), CompoundingFrequency::Monthly, 1, dec!(500)).unwrap();
        assert_eq!(result.final_balance, dec!(16000));
        assert_eq!(result.total_interest, dec!(0));
    }

    #[rstest]
    #[case(CompoundingFrequency::Annually)]
    #[case(CompoundingFrequency::Quarterly)]
    #[case(CompoundingFrequency::Monthly)]
    #[case(CompoundingFrequency::Daily)]
    fn test_more_frequent_compounding_earns_no_less(#[case] frequency: CompoundingFrequency) {
        let annual = compound_interest(dec!(5000), dec!(6), CompoundingFrequency::Annually, 10, dec!(0)).unwrap();
        let other = compound_interest(dec!(5000), dec!(6), frequency, 10, dec!(0)).unwrap();
        assert!(other.final_balance >= annual.final_balance);
    }

    #[test]
    fn test_simple_interest() {
        let result = simple_interest(dec!(1000), dec!(5), 3).unwrap();
        assert_eq!(result.interest, dec!(150));
        assert_eq!(result.total, dec!(1150));
        assert_eq!(result.yearly[1].balance, dec!(1100));
    }

    #[test]
    fn test_investment_growth_net_of_fees_and_inflation() {
        let input = InvestmentGrowthInput {
            principal: dec!(1000),
            monthly_contribution: dec!(100),
            annual_return_percent: dec!(10),
            annual_fee_percent: dec!(2),
            inflation_rate_percent: dec!(10),
            years: 1,
        };
        let result = investment_growth(&input).unwrap();

        assert_eq!(result.final_nominal, dec!(2376));
        assert_eq!(result.final_real, dec!(2160));
        assert_eq!(result.total_contributions, dec!(2200));
        assert_eq!(result.total_gains, dec!(176));
    }

    #[test]
    fn test_investment_growth_rejects_ruinous_fees() {
        let input = InvestmentGrowthInput {
            principal: dec!(1000),
            monthly_contribution: dec!(0),
            annual_return_percent: dec!(0),
            annual_fee_percent: dec!(100),
            inflation_rate_percent: dec!(0),
            years: 5,
        };
        assert!(investment_growth(&input).is_err());
    }

    #[test]
    fn test_inflation_erodes_value() {
        let result = inflation_adjusted(dec!(1000), dec!(10), 2).unwrap();
        assert_eq!(result.yearly[0].value, dec!(1000) / dec!(1.1));
        assert_eq!(result.future_value, dec!(1000) / dec!(1.21));
        assert!(result.purchasing_power_lost > dec!(173) && result.purchasing_power_lost < dec!(174));
    }

    #[rstest]
    #[case(dec!(1000), dec!(1500), dec!(500), dec!(50))]
    #[case(dec!(1000), dec!(800), dec!(-200), dec!(-20))]
    #[case(dec!(0), dec!(100), dec!(100), dec!(0))]
    fn test_roi(#[case] initial: Decimal, #[case] final_value: Decimal, #[case] gain: Decimal, #[case] percent: Decimal) {
        assert_eq!(
            roi(initial, final_value).unwrap(),
            RoiResult {
                gain,
                roi_percent: percent
            }
        );
    }

    #[test]
    fn test_rejects_zero_years() {
        assert!(simple_interest(dec!(1000), dec!(5), 0).is_err());
        assert!(inflation_adjusted(dec!(1000), dec!(3), 51).is_err());
    }
}
