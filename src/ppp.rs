//! Purchasing power parity adjustment between two currencies.
//!
//! A PPP factor is the number of local currency units that buy what one
//! international dollar buys in the US. Comparing the PPP-implied exchange
//! rate with the market rate shows how much further money goes abroad.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FinanceError, FinanceResult};

const BUILTIN_2024: &str = include_str!("../data/ppp_2024.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub label: String,
    pub local_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyPppRecord {
    pub currency_code: String,
    pub country: String,
    pub ppp_factor: Decimal,
    #[serde(default)]
    pub cost_basket: Vec<CostItem>,
}

/// One basket item priced at home and in the target country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketComparison {
    pub label: String,
    /// Price at home, in the home currency.
    pub home_price: Decimal,
    /// Price in the target country, in the target currency.
    pub target_price: Decimal,
    /// The home price converted at the market rate, in the target currency.
    pub home_price_converted: Decimal,
    /// `target_price - home_price_converted`; negative means cheaper abroad.
    pub difference: Decimal,
}

impl BasketComparison {
    pub fn is_cheaper_abroad(&self) -> bool {
        self.difference < dec!(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "PppDataset", into = "PppDataset")]
pub struct PppTable {
    records: BTreeMap<String, CurrencyPppRecord>,
}

#[derive(Serialize, Deserialize)]
struct PppDataset {
    currencies: Vec<CurrencyPppRecord>,
}

impl From<PppDataset> for PppTable {
    fn from(dataset: PppDataset) -> Self {
        PppTable::new(dataset.currencies)
    }
}

impl From<PppTable> for PppDataset {
    fn from(table: PppTable) -> Self {
        PppDataset {
            currencies: table.records.into_values().collect(),
        }
    }
}

impl PppTable {
    pub fn new(records: impl IntoIterator<Item = CurrencyPppRecord>) -> Self {
        PppTable {
            records: records
                .into_iter()
                .map(|record| (record.currency_code.clone(), record))
                .collect(),
        }
    }

    /// The embedded World Bank ICP based dataset.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_2024).context("embedded PPP dataset")
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading PPP dataset {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("loading PPP dataset {}", path.display()))
    }

    /// Parses a dataset, rejecting non-positive PPP factors and negative prices.
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let table: PppTable = serde_json::from_str(raw).context("parsing PPP JSON")?;
        for record in table.records.values() {
            if record.ppp_factor <= dec!(0) {
                return Err(FinanceError::InvalidTable(format!(
                    "{} has non-positive PPP factor {}",
                    record.currency_code, record.ppp_factor
                ))
                .into());
            }
            if let Some(item) = record.cost_basket.iter().find(|item| item.local_price < dec!(0)) {
                return Err(FinanceError::InvalidTable(format!(
                    "{} prices '{}' below zero",
                    record.currency_code, item.label
                ))
                .into());
            }
        }
        info!(currencies = table.records.len(), "loaded PPP dataset");
        Ok(table)
    }

    pub fn get(&self, currency_code: &str) -> Option<&CurrencyPppRecord> {
        self.records.get(currency_code)
    }

    pub fn ppp_factor(&self, currency_code: &str) -> Option<Decimal> {
        self.get(currency_code).map(|record| record.ppp_factor)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// `(ppp[to] / ppp[from]) / nominal_rate`, where `nominal_rate` is units
    /// of `to` per unit of `from`. Above 1 the money buys more in the target
    /// country than the market rate suggests.
    ///
    /// Neutral (1) when either factor is missing or the rate is zero.
    pub fn ppp_multiplier(&self, from: &str, to: &str, nominal_rate: Decimal) -> Decimal {
        match (self.ppp_factor(from), self.ppp_factor(to)) {
            (Some(from_ppp), Some(to_ppp)) if !nominal_rate.is_zero() => to_ppp / from_ppp / nominal_rate,
            _ => dec!(1),
        }
    }

    /// What `amount` of `from` is worth in `to`, adjusted for local buying power.
    pub fn ppp_adjusted_value(&self, amount: Decimal, from: &str, to: &str, nominal_rate: Decimal) -> Decimal {
        amount * nominal_rate * self.ppp_multiplier(from, to, nominal_rate)
    }

    /// Prices each basket item in both countries, pairing items by label.
    ///
    /// # Errors
    ///
    /// Returns `FinanceError::UnknownCurrency` when either code is missing.
    pub fn compare_baskets(&self, from: &str, to: &str, nominal_rate: Decimal) -> FinanceResult<Vec<BasketComparison>> {
        let home = self.get(from).ok_or_else(|| FinanceError::UnknownCurrency(from.to_string()))?;
        let target = self.get(to).ok_or_else(|| FinanceError::UnknownCurrency(to.to_string()))?;

        Ok(home
            .cost_basket
            .iter()
            .filter_map(|home_item| {
                let target_item = target.cost_basket.iter().find(|item| item.label == home_item.label)?;
                let home_price_converted = home_item.local_price * nominal_rate;
                Some(BasketComparison {
                    label: home_item.label.clone(),
                    home_price: home_item.local_price,
                    target_price: target_item.local_price,
                    home_price_converted,
                    difference: target_item.local_price - home_price_converted,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn table() -> PppTable {
        PppTable::builtin().unwrap()
    }

    #[rstest]
    fn test_same_currency_is_neutral(table: PppTable) {
        for code in table.currencies() {
            assert_eq!(table.ppp_multiplier(code, code, dec!(1)), dec!(1));
        }
    }

    #[rstest]
    fn test_multiplier_against_market_rate(table: PppTable) {
        // PPP implies 97 JPY per USD, so a market rate of 150 gives a multiplier below 1.
        let multiplier = table.ppp_multiplier("USD", "JPY", dec!(150));
        assert_eq!(multiplier, dec!(97) / dec!(150));

        let multiplier = table.ppp_multiplier("USD", "INR", dec!(83));
        assert!(multiplier < dec!(1));

        let multiplier = table.ppp_multiplier("USD", "GBP", dec!(0.5));
        assert_eq!(multiplier, dec!(0.69) / dec!(0.5));
    }

    #[rstest]
    fn test_missing_data_is_neutral(table: PppTable) {
        assert_eq!(table.ppp_multiplier("USD", "XXX", dec!(3)), dec!(1));
        assert_eq!(table.ppp_multiplier("USD", "EUR", dec!(0)), dec!(1));
        assert_eq!(table.ppp_adjusted_value(dec!(100), "USD", "XXX", dec!(3)), dec!(300));
    }

    #[rstest]
    fn test_adjusted_value_is_ppp_conversion(table: PppTable) {
        // amount * nominal * (ppp_to / ppp_from / nominal) = amount * ppp ratio
        let value = table.ppp_adjusted_value(dec!(1000), "USD", "EUR", dec!(0.92));
        assert!((value - dec!(780)).abs() < dec!(0.0000001));
    }

    #[rstest]
    fn test_basket_comparison(table: PppTable) {
        let rows = table.compare_baskets("USD", "MXN", dec!(17)).unwrap();
        let coffee = rows.iter().find(|row| row.label == "Coffee").unwrap();

        assert_eq!(coffee.home_price_converted, dec!(93.5));
        assert_eq!(coffee.target_price, dec!(60));
        assert!(coffee.is_cheaper_abroad());

        assert!(matches!(
            table.compare_baskets("USD", "XXX", dec!(1)),
            Err(FinanceError::UnknownCurrency(code)) if code == "XXX"
        ));
    }

    #[test]
    fn test_rejects_zero_factor() {
        let raw = r#"{"currencies": [{"currency_code": "ABC", "country": "Nowhere", "ppp_factor": "0"}]}"#;
        assert!(PppTable::from_json_str(raw).is_err());
    }
}
