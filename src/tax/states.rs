//! US state income, property and sales tax reference table.
//!
//! The table is configuration, not code: the 2024 figures ship embedded as
//! JSON and a caller can load a newer table from disk at startup. Lookups on
//! an unknown state code fall back to neutral defaults.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{JurisdictionTaxConfig, compute_tax};

const BUILTIN_2024: &str = include_str!("../../data/state_tax_2024.json");

/// National average effective property tax rate, used for unknown states.
pub const DEFAULT_PROPERTY_TAX_RATE_PERCENT: Decimal = dec!(1.1);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    pub name: String,
    pub income_tax: JurisdictionTaxConfig,
    /// Average effective property tax, percent of home value per year.
    pub property_tax_rate_percent: Decimal,
    /// State-level sales tax, percent.
    pub sales_tax_rate_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTaxTable {
    pub tax_year: u16,
    /// Keyed by two-letter postal code.
    pub states: BTreeMap<String, StateRecord>,
}

impl StateTaxTable {
    /// The embedded 2024 table.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_2024).context("embedded 2024 state tax table")
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading state tax table {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("loading state tax table {}", path.display()))
    }

    /// Parses a table. Each jurisdiction's invariants are checked as it is
    /// deserialized.
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let table: StateTaxTable = serde_json::from_str(raw).context("parsing state tax JSON")?;
        info!(tax_year = table.tax_year, states = table.states.len(), "loaded state tax table");
        Ok(table)
    }

    pub fn get(&self, code: &str) -> Option<&StateRecord> {
        self.states.get(&code.to_ascii_uppercase())
    }

    pub fn jurisdiction(&self, code: &str) -> Option<&JurisdictionTaxConfig> {
        self.get(code).map(|record| &record.income_tax)
    }

    /// State income tax on `gross_income`; zero for an unknown code.
    pub fn state_tax(&self, gross_income: Decimal, code: &str) -> Decimal {
        self.jurisdiction(code)
            .map_or(dec!(0), |config| compute_tax(gross_income, config))
    }

    pub fn property_tax_rate_percent(&self, code: &str) -> Decimal {
        self.get(code)
            .map_or(DEFAULT_PROPERTY_TAX_RATE_PERCENT, |record| record.property_tax_rate_percent)
    }

    pub fn sales_tax_rate_percent(&self, code: &str) -> Decimal {
        self.get(code).map_or(dec!(0), |record| record.sales_tax_rate_percent)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}
