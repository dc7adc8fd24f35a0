//! Credit card model and its billing terms.

use serde::{Deserialize, Serialize};

use super::CardId;
use super::lenient;

/// Days per year used to derive a daily rate from an annual one.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// A user's credit card with its billing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Unique identifier, stable per user.
    pub id: CardId,
    /// Display label.
    pub name: String,
    /// Day of month (1–31) on which a billing cycle closes. A missing value
    /// reads as 0 and is clamped by [`BillingTerms::cycle_end_day`].
    #[serde(default, alias = "end", deserialize_with = "lenient::day_of_month")]
    pub cycle_end_day: u32,
    /// Day of month (1–31) on which payment is due, in the month after the
    /// cycle closes.
    #[serde(default, alias = "due", deserialize_with = "lenient::day_of_month")]
    pub due_day: u32,
    /// Nominal yearly interest rate, in percent.
    #[serde(
        default,
        alias = "rate",
        deserialize_with = "lenient::number_or_zero"
    )]
    pub annual_rate_percent: f64,
    /// Daily interest rate override, in percent. Derived from the annual
    /// rate when absent.
    #[serde(
        default,
        alias = "daily",
        deserialize_with = "lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub daily_rate_percent: Option<f64>,
    /// Flat fee charged once a purchase is overdue.
    #[serde(
        default,
        alias = "fine",
        deserialize_with = "lenient::number_or_zero"
    )]
    pub late_fine: f64,
}

impl Card {
    /// Returns the billing terms the grace calculator consumes.
    #[inline]
    #[must_use]
    pub const fn terms(&self) -> BillingTerms {
        BillingTerms {
            cycle_end_day: self.cycle_end_day,
            due_day: self.due_day,
            annual_rate_percent: self.annual_rate_percent,
            daily_rate_percent: self.daily_rate_percent,
            late_fine: self.late_fine,
        }
    }
}

/// Billing configuration of a card, detached from its identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingTerms {
    /// Day of month on which the cycle closes.
    pub cycle_end_day: u32,
    /// Day of month on which payment is due.
    pub due_day: u32,
    /// Yearly rate in percent.
    pub annual_rate_percent: f64,
    /// Daily rate override in percent.
    pub daily_rate_percent: Option<f64>,
    /// Late fine.
    pub late_fine: f64,
}

impl BillingTerms {
    /// Terms used when a transaction's card cannot be found: cycle closes on
    /// the 21st, payment due on the 15th, no interest and no fine.
    pub const DEFAULT: Self = Self {
        cycle_end_day: 21,
        due_day: 15,
        annual_rate_percent: 0.0,
        daily_rate_percent: None,
        late_fine: 0.0,
    };

    /// Cycle-end day clamped into `1..=31`.
    #[inline]
    #[must_use]
    pub fn cycle_end_day(&self) -> u32 {
        self.cycle_end_day.clamp(1, 31)
    }

    /// Due day clamped into `1..=31`.
    #[inline]
    #[must_use]
    pub fn due_day(&self) -> u32 {
        self.due_day.clamp(1, 31)
    }

    /// Effective daily rate in percent.
    ///
    /// A supplied override is used as-is; otherwise the annual rate is
    /// divided by [`DAYS_PER_YEAR`]. Negative or non-finite values read as 0.
    #[inline]
    #[must_use]
    pub fn daily_rate_percent(&self) -> f64 {
        let daily = self
            .daily_rate_percent
            .unwrap_or(self.annual_rate_percent / DAYS_PER_YEAR);
        non_negative(daily)
    }

    /// Late fine, with negative or non-finite values read as 0.
    #[inline]
    #[must_use]
    pub fn late_fine(&self) -> f64 {
        non_negative(self.late_fine)
    }
}

impl Default for BillingTerms {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Maps negative and non-finite values to zero.
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
