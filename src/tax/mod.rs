//! Income tax for a single jurisdiction: no tax, a flat rate, or progressive
//! brackets, each applied after a standard deduction.
//!
//! The same bracket walk serves state tables ([`states`]) and the federal
//! schedule ([`federal`]).

pub mod federal;
pub mod states;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult};

/// One slice of a progressive schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Upper end of the slice; `None` means the slice is unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<Decimal>,
    /// Rate applied to income inside the slice, as a fraction in `[0, 1]`.
    pub marginal_rate: Decimal,
}

impl TaxBracket {
    pub fn up_to(upper_limit: Decimal, marginal_rate: Decimal) -> Self {
        TaxBracket {
            upper_limit: Some(upper_limit),
            marginal_rate,
        }
    }

    pub fn unbounded(marginal_rate: Decimal) -> Self {
        TaxBracket {
            upper_limit: None,
            marginal_rate,
        }
    }
}

/// Brackets sorted by strictly ascending limit, ending in exactly one
/// unbounded bracket, so every non-negative income falls in one slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketSchedule(Vec<TaxBracket>);

impl BracketSchedule {
    /// # Errors
    ///
    /// Returns `FinanceError::InvalidTable` for an empty schedule, limits that
    /// are not positive and strictly ascending, an unbounded bracket anywhere
    /// but last, a bounded last bracket, or a rate outside `[0, 1]`.
    pub fn new(brackets: Vec<TaxBracket>) -> FinanceResult<Self> {
        let Some(last) = brackets.last() else {
            return Err(FinanceError::InvalidTable("bracket schedule is empty".to_string()));
        };
        if last.upper_limit.is_some() {
            return Err(FinanceError::InvalidTable(
                "last bracket must be unbounded".to_string(),
            ));
        }

        let mut previous = dec!(0);
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.marginal_rate < dec!(0) || bracket.marginal_rate > dec!(1) {
                return Err(FinanceError::InvalidTable(format!(
                    "bracket {index} rate {} is outside [0, 1]",
                    bracket.marginal_rate
                )));
            }
            match bracket.upper_limit {
                Some(limit) if limit <= previous => {
                    return Err(FinanceError::InvalidTable(format!(
                        "bracket {index} limit {limit} does not exceed {previous}"
                    )));
                }
                Some(limit) => previous = limit,
                None if index + 1 != brackets.len() => {
                    return Err(FinanceError::InvalidTable(format!(
                        "bracket {index} is unbounded but not last"
                    )));
                }
                None => {}
            }
        }

        Ok(BracketSchedule(brackets))
    }

    /// Builds a schedule from a literal table known to be well formed.
    pub(crate) fn from_sorted(brackets: Vec<TaxBracket>) -> Self {
        debug_assert!(BracketSchedule::new(brackets.clone()).is_ok());
        BracketSchedule(brackets)
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.0
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketSchedule {
    type Error = FinanceError;

    fn try_from(brackets: Vec<TaxBracket>) -> FinanceResult<Self> {
        BracketSchedule::new(brackets)
    }
}

impl From<BracketSchedule> for Vec<TaxBracket> {
    fn from(schedule: BracketSchedule) -> Self {
        schedule.0
    }
}

/// How a jurisdiction taxes wage income.
///
/// JSON form: `{"kind": "flat", "flat_rate": "0.0495", "standard_deduction": "0"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", try_from = "RawJurisdictionTaxConfig")]
pub enum JurisdictionTaxConfig {
    None,
    Flat {
        flat_rate: Decimal,
        #[serde(default)]
        standard_deduction: Decimal,
    },
    Progressive {
        brackets: BracketSchedule,
        #[serde(default)]
        standard_deduction: Decimal,
    },
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawJurisdictionTaxConfig {
    None,
    Flat {
        flat_rate: Decimal,
        #[serde(default)]
        standard_deduction: Decimal,
    },
    Progressive {
        brackets: BracketSchedule,
        #[serde(default)]
        standard_deduction: Decimal,
    },
}

impl TryFrom<RawJurisdictionTaxConfig> for JurisdictionTaxConfig {
    type Error = FinanceError;

    fn try_from(raw: RawJurisdictionTaxConfig) -> FinanceResult<Self> {
        let config = match raw {
            RawJurisdictionTaxConfig::None => JurisdictionTaxConfig::None,
            RawJurisdictionTaxConfig::Flat {
                flat_rate,
                standard_deduction,
            } => JurisdictionTaxConfig::Flat {
                flat_rate,
                standard_deduction,
            },
            RawJurisdictionTaxConfig::Progressive {
                brackets,
                standard_deduction,
            } => JurisdictionTaxConfig::Progressive {
                brackets,
                standard_deduction,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl JurisdictionTaxConfig {
    pub fn flat(flat_rate: Decimal, standard_deduction: Decimal) -> FinanceResult<Self> {
        let config = JurisdictionTaxConfig::Flat {
            flat_rate,
            standard_deduction,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn progressive(brackets: Vec<TaxBracket>, standard_deduction: Decimal) -> FinanceResult<Self> {
        let config = JurisdictionTaxConfig::Progressive {
            brackets: BracketSchedule::new(brackets)?,
            standard_deduction,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the type cannot carry itself: a flat rate in
    /// `[0, 1]` and a non-negative deduction.
    pub fn validate(&self) -> FinanceResult<()> {
        if let JurisdictionTaxConfig::Flat { flat_rate, .. } = self {
            if *flat_rate < dec!(0) || *flat_rate > dec!(1) {
                return Err(FinanceError::InvalidTable(format!("flat rate {flat_rate} is outside [0, 1]")));
            }
        }
        if self.standard_deduction() < dec!(0) {
            return Err(FinanceError::InvalidTable(format!(
                "standard deduction {} is negative",
                self.standard_deduction()
            )));
        }
        Ok(())
    }

    pub fn standard_deduction(&self) -> Decimal {
        match self {
            JurisdictionTaxConfig::None => dec!(0),
            JurisdictionTaxConfig::Flat { standard_deduction, .. }
            | JurisdictionTaxConfig::Progressive { standard_deduction, .. } => *standard_deduction,
        }
    }

    /// `max(0, gross - standard_deduction)`.
    pub fn taxable_income(&self, gross_income: Decimal) -> Decimal {
        (gross_income - self.standard_deduction()).max(dec!(0))
    }
}

/// Tax owed on `gross_income` in the given jurisdiction.
pub fn compute_tax(gross_income: Decimal, config: &JurisdictionTaxConfig) -> Decimal {
    match config {
        JurisdictionTaxConfig::None => dec!(0),
        JurisdictionTaxConfig::Flat { flat_rate, .. } => config.taxable_income(gross_income) * flat_rate,
        JurisdictionTaxConfig::Progressive { brackets, .. } => {
            apply_brackets(config.taxable_income(gross_income), brackets)
        }
    }
}

/// Walks the brackets in order, taxing each slice between the previous limit
/// and this bracket's limit at its marginal rate, until the income runs out.
pub fn apply_brackets(taxable_income: Decimal, schedule: &BracketSchedule) -> Decimal {
    let mut tax = dec!(0);
    let mut lower = dec!(0);

    for bracket in schedule.brackets() {
        if taxable_income <= lower {
            break;
        }
        let upper = bracket
            .upper_limit
            .map_or(taxable_income, |limit| limit.min(taxable_income));
        tax += (upper - lower) * bracket.marginal_rate;

        match bracket.upper_limit {
            Some(limit) => lower = limit,
            None => break,
        }
    }

    tax
}

/// Rate applied to the next unit of income above `taxable_income`.
pub fn marginal_rate(taxable_income: Decimal, schedule: &BracketSchedule) -> Decimal {
    schedule
        .brackets()
        .iter()
        .find(|bracket| bracket.upper_limit.is_none_or(|limit| taxable_income < limit))
        .map(|bracket| bracket.marginal_rate)
        .unwrap_or_default()
}

/// Total tax as a fraction of gross income; zero for zero income.
pub fn effective_rate(gross_income: Decimal, config: &JurisdictionTaxConfig) -> Decimal {
    if gross_income <= dec!(0) {
        return dec!(0);
    }
    compute_tax(gross_income, config) / gross_income
}
