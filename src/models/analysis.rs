//! Derived grace-period analysis of a single transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a purchase stands relative to its due date.
///
/// Determined purely by the sign of the days left until the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCategory {
    /// Due date is still ahead; no interest accrues.
    InGrace,
    /// Due date is today.
    DueToday,
    /// Due date has passed; interest and the late fine apply.
    Overdue,
}

impl StatusCategory {
    /// Classifies a signed day count until the due date.
    #[inline]
    #[must_use]
    pub const fn from_days_left(days_left: i64) -> Self {
        if days_left > 0 {
            Self::InGrace
        } else if days_left == 0 {
            Self::DueToday
        } else {
            Self::Overdue
        }
    }
}

/// Result of analysing a transaction against its card as of a given date.
///
/// Pure derived state; recomputed on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalysis {
    /// Date the billing cycle containing the purchase closes.
    pub cycle_end: NaiveDate,
    /// Date payment is due.
    pub due_date: NaiveDate,
    /// Days from purchase to due date.
    pub grace_days: i64,
    /// Days from the as-of date to the due date; negative once overdue.
    pub days_left: i64,
    /// Days past the due date (zero unless overdue).
    pub overdue_days: i64,
    /// Accrued simple interest (zero unless overdue).
    pub interest: f64,
    /// Late fine applied (zero unless overdue).
    pub fine: f64,
    /// Amount owed: principal, plus interest and fine once overdue.
    pub total_due: f64,
    /// Status category.
    pub status: StatusCategory,
    /// Share of the grace period elapsed, 0–100.
    pub progress_percent: u8,
}
