//! 2024 US federal income tax, payroll taxes and take-home pay.

use std::sync::LazyLock;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{BracketSchedule, JurisdictionTaxConfig, TaxBracket, compute_tax};
use crate::error::{FinanceResult, ensure_non_negative};

pub const SOCIAL_SECURITY_RATE: Decimal = dec!(0.062);
pub const SOCIAL_SECURITY_WAGE_BASE: Decimal = dec!(168600);
pub const MEDICARE_RATE: Decimal = dec!(0.0145);
pub const ADDITIONAL_MEDICARE_RATE: Decimal = dec!(0.009);
pub const ADDITIONAL_MEDICARE_THRESHOLD: Decimal = dec!(200000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    Single,
    Married,
}

static SINGLE_2024: LazyLock<JurisdictionTaxConfig> = LazyLock::new(|| JurisdictionTaxConfig::Progressive {
    brackets: BracketSchedule::from_sorted(vec![
        TaxBracket::up_to(dec!(11600), dec!(0.10)),
        TaxBracket::up_to(dec!(47150), dec!(0.12)),
        TaxBracket::up_to(dec!(100525), dec!(0.22)),
        TaxBracket::up_to(dec!(191950), dec!(0.24)),
        TaxBracket::up_to(dec!(243725), dec!(0.32)),
        TaxBracket::up_to(dec!(609350), dec!(0.35)),
        TaxBracket::unbounded(dec!(0.37)),
    ]),
    standard_deduction: dec!(14600),
});

static MARRIED_2024: LazyLock<JurisdictionTaxConfig> = LazyLock::new(|| JurisdictionTaxConfig::Progressive {
    brackets: BracketSchedule::from_sorted(vec![
        TaxBracket::up_to(dec!(23200), dec!(0.10)),
        TaxBracket::up_to(dec!(94300), dec!(0.12)),
        TaxBracket::up_to(dec!(201050), dec!(0.22)),
        TaxBracket::up_to(dec!(383900), dec!(0.24)),
        TaxBracket::up_to(dec!(487450), dec!(0.32)),
        TaxBracket::up_to(dec!(731200), dec!(0.35)),
        TaxBracket::unbounded(dec!(0.37)),
    ]),
    standard_deduction: dec!(29200),
});

impl FilingStatus {
    /// The federal schedule for this status, including its standard deduction.
    pub fn federal_config(&self) -> &'static JurisdictionTaxConfig {
        match self {
            FilingStatus::Single => &*SINGLE_2024,
            FilingStatus::Married => &*MARRIED_2024,
        }
    }
}

pub fn federal_income_tax(gross_annual: Decimal, filing: FilingStatus) -> Decimal {
    compute_tax(gross_annual, filing.federal_config())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollTaxes {
    pub social_security: Decimal,
    /// Base Medicare plus the additional surtax.
    pub medicare: Decimal,
    pub additional_medicare: Decimal,
    pub total: Decimal,
}

/// Employee-side FICA: Social Security up to the wage base, Medicare on all
/// wages, and the additional Medicare surtax above the threshold.
pub fn payroll_taxes(gross_annual: Decimal) -> PayrollTaxes {
    let wages = gross_annual.max(dec!(0));
    let social_security = wages.min(SOCIAL_SECURITY_WAGE_BASE) * SOCIAL_SECURITY_RATE;
    let base_medicare = wages * MEDICARE_RATE;
    let additional_medicare = (wages - ADDITIONAL_MEDICARE_THRESHOLD).max(dec!(0)) * ADDITIONAL_MEDICARE_RATE;
    let medicare = base_medicare + additional_medicare;

    PayrollTaxes {
        social_security,
        medicare,
        additional_medicare,
        total: social_security + medicare,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TakeHomePay {
    pub gross_annual: Decimal,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub payroll: PayrollTaxes,
    pub total_tax: Decimal,
    pub net_annual: Decimal,
    pub net_monthly: Decimal,
    pub net_biweekly: Decimal,
    pub net_weekly: Decimal,
    /// Total tax as a percentage of gross pay.
    pub effective_rate_percent: Decimal,
}

/// Net pay after federal income tax, FICA and (optionally) state income tax.
///
/// # Errors
///
/// Returns `FinanceError::InvalidInput` for negative gross pay.
pub fn take_home_pay(
    gross_annual: Decimal,
    filing: FilingStatus,
    state: Option<&JurisdictionTaxConfig>,
) -> FinanceResult<TakeHomePay> {
    ensure_non_negative("gross_annual", gross_annual)?;

    let federal_tax = federal_income_tax(gross_annual, filing);
    let state_tax = state.map_or(dec!(0), |config| compute_tax(gross_annual, config));
    let payroll = payroll_taxes(gross_annual);
    let total_tax = federal_tax + state_tax + payroll.total;
    let net_annual = gross_annual - total_tax;

    let effective_rate_percent = if gross_annual > dec!(0) {
        total_tax / gross_annual * dec!(100)
    } else {
        dec!(0)
    };

    Ok(TakeHomePay {
        gross_annual,
        federal_tax,
        state_tax,
        payroll,
        total_tax,
        net_annual,
        net_monthly: net_annual / dec!(12),
        net_biweekly: net_annual / dec!(26),
        net_weekly: net_annual / dec!(52),
        effective_rate_percent,
    })
}
