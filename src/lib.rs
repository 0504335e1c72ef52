//! `finance_calc` is a Rust library of personal finance calculations.
//!
//! At its core is a small computation engine:
//! - **Amortization**: level annuity payments and month-by-month schedules.
//! - **Inversion**: the loan amount or purchase price a target payment buys.
//! - **APR**: the effective rate once financing fees are counted, found with
//!   Newton-Raphson.
//! - **Payoff**: how long a revolving balance takes to clear at a fixed payment.
//! - **Tax**: progressive bracket walks for US federal and state income tax.
//! - **Credit** tiers and **PPP** (purchasing power parity) adjustments.
//!
//! The [`calculators`] module builds consumer calculators (car loans,
//! refinancing, affordability, rent vs buy, salary conversions) on top.
//!
//! All money is `rust_decimal::Decimal`. Rates are passed as percentages
//! (`6.5` for 6.5%).
//!
//! ## Usage
//!
//! Add `finance_calc` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! finance_calc = "0.1.0"
//! rust_decimal = "1.39.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then build a [`LoanTerms`] and ask for its payment, or solve for the APR:
//!
//! ```rust
//! use finance_calc::{LoanTerms, monthly_payment, solve_apr};
//! use rust_decimal_macros::dec;
//!
//! fn main() -> Result<(), finance_calc::FinanceError> {
//!     let terms = LoanTerms::from_years(dec!(250_000), dec!(6.5), 30)?;
//!     println!("Payment: {:.2}", monthly_payment(&terms));
//!
//!     let quote = solve_apr(dec!(200_000), dec!(4_000), dec!(6), 360)?;
//!     println!("APR: {:.3}% ({:?})", quote.apr, quote.status);
//!     Ok(())
//! }
//! ```

pub mod amortization;
pub mod apr;
pub mod calculators;
pub mod credit;
pub mod error;
pub mod inversion;
pub mod loan;
pub mod payoff;
pub mod ppp;
pub mod rates_cache;
pub mod tax;

pub use amortization::{AmortizationRow, AmortizationSummary, amortize, balance_after, monthly_payment, schedule};
pub use apr::{AprQuote, SolverStatus, solve_apr};
pub use credit::{CreditTier, LoanCategory, RateSuggestion, classify_credit, suggested_rate};
pub use error::{FinanceError, FinanceResult};
pub use inversion::{
    HomePriceQuery, solve_home_price, solve_loan_amount, solve_principal_from_payment, solve_vehicle_price,
};
pub use loan::LoanTerms;
pub use payoff::{PayoffOutcome, PayoffPlan, simulate_payoff};
pub use ppp::PppTable;
pub use rates_cache::{CurrencyRates, RateCache, RateSource};
pub use tax::federal::{FilingStatus, TakeHomePay, take_home_pay};
pub use tax::states::StateTaxTable;
pub use tax::{JurisdictionTaxConfig, TaxBracket, compute_tax};
