//! Pay conversions for a 52-week working year.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{FinanceError, FinanceResult, ensure_non_negative, ensure_positive};

const WEEKS_PER_YEAR: Decimal = dec!(52);
const HOURS_PER_WEEK_LIMIT: Decimal = dec!(168);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayBreakdown {
    pub hourly: Decimal,
    /// One of five working days.
    pub daily: Decimal,
    pub weekly: Decimal,
    pub biweekly: Decimal,
    pub monthly: Decimal,
    pub annual: Decimal,
}

pub fn salary_to_hourly(annual_salary: Decimal, hours_per_week: Decimal) -> FinanceResult<PayBreakdown> {
    ensure_non_negative("annual_salary", annual_salary)?;
    ensure_positive("hours_per_week", hours_per_week)?;
    if hours_per_week > HOURS_PER_WEEK_LIMIT {
        return Err(FinanceError::invalid("hours_per_week", hours_per_week, "a week has 168 hours"));
    }

    let hourly = annual_salary / (WEEKS_PER_YEAR * hours_per_week);
    Ok(PayBreakdown {
        hourly,
        daily: hourly * hours_per_week / dec!(5),
        weekly: annual_salary / WEEKS_PER_YEAR,
        biweekly: annual_salary / dec!(26),
        monthly: annual_salary / dec!(12),
        annual: annual_salary,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OvertimePay {
    pub regular_pay: Decimal,
    pub overtime_pay: Decimal,
    pub total_weekly: Decimal,
    pub total_biweekly: Decimal,
    pub total_monthly: Decimal,
    pub total_annual: Decimal,
    /// Weekly pay over all hours worked; zero when no hours are worked.
    pub effective_hourly_rate: Decimal,
}

/// Weekly pay with overtime hours paid at `multiplier` times the base rate
/// (1.5 for time-and-a-half).
pub fn overtime_pay(
    hourly_rate: Decimal,
    regular_hours: Decimal,
    overtime_hours: Decimal,
    multiplier: Decimal,
) -> FinanceResult<OvertimePay> {
    ensure_non_negative("hourly_rate", hourly_rate)?;
    ensure_non_negative("regular_hours", regular_hours)?;
    ensure_non_negative("overtime_hours", overtime_hours)?;
    ensure_non_negative("multiplier", multiplier)?;

    let regular_pay = hourly_rate * regular_hours;
    let overtime_pay = hourly_rate * multiplier * overtime_hours;
    let total_weekly = regular_pay + overtime_pay;
    let hours = regular_hours + overtime_hours;

    Ok(OvertimePay {
        regular_pay,
        overtime_pay,
        total_weekly,
        total_biweekly: total_weekly * dec!(2),
        total_monthly: total_weekly * WEEKS_PER_YEAR / dec!(12),
        total_annual: total_weekly * WEEKS_PER_YEAR,
        effective_hourly_rate: if hours.is_zero() { dec!(0) } else { total_weekly / hours },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaiseAndBonus {
    pub current_salary: Decimal,
    pub new_salary: Decimal,
    pub raise_amount: Decimal,
    /// Paid on the raised salary.
    pub bonus_amount: Decimal,
    pub total_compensation: Decimal,
    pub monthly_increase: Decimal,
}

pub fn raise_and_bonus(current_salary: Decimal, raise_percent: Decimal, bonus_percent: Decimal) -> FinanceResult<RaiseAndBonus> {
    ensure_non_negative("current_salary", current_salary)?;
    ensure_non_negative("bonus_percent", bonus_percent)?;
    if raise_percent < dec!(-100) {
        return Err(FinanceError::invalid("raise_percent", raise_percent, "cannot cut more than the whole salary"));
    }

    let raise_amount = current_salary * raise_percent / dec!(100);
    let new_salary = current_salary + raise_amount;
    let bonus_amount = new_salary * bonus_percent / dec!(100);

    Ok(RaiseAndBonus {
        current_salary,
        new_salary,
        raise_amount,
        bonus_amount,
        total_compensation: new_salary + bonus_amount,
        monthly_increase: raise_amount / dec!(12),
    })
}
