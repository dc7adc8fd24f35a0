//! Card form validation.
//!
//! The grace calculator accepts whatever it is given; this module is where
//! user-entered card details are checked before they are stored. A form is
//! checked as a whole so every invalid field can be reported at once.

use core::fmt;

use chrono::{Datelike as _, NaiveDate};

use crate::models::{Card, CardId, parse_date};
use crate::rates::{annual_from_daily, daily_from_annual};

/// Minimum length of a card name after trimming.
const MIN_NAME_CHARS: usize = 3;

/// Fields of a card form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardField {
    /// Display name.
    Name,
    /// Picked cycle-end date.
    CycleEnd,
    /// Picked due date.
    Due,
    /// Annual interest rate.
    AnnualRate,
    /// Daily interest rate.
    DailyRate,
    /// Late fine.
    Fine,
}

impl fmt::Display for CardField {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            Self::Name => "name",
            Self::CycleEnd => "cycle end",
            Self::Due => "due date",
            Self::AnnualRate => "annual rate",
            Self::DailyRate => "daily rate",
            Self::Fine => "late fine",
        };
        f.write_str(label)
    }
}

/// A single problem with one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Offending field.
    pub field: CardField,
    /// Message to show next to the field.
    pub message: String,
}

impl FieldIssue {
    /// Creates an issue for `field`.
    #[inline]
    #[must_use]
    pub fn new<M: Into<String>>(field: CardField, message: M) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every problem found in a card form, in field order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid card form: {}", summary(.issues))]
pub struct ValidationError {
    /// Issues in field order; never empty.
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Wraps a list of issues.
    #[inline]
    #[must_use]
    pub const fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    /// The first invalid field, which a form should scroll to.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&FieldIssue> {
        self.issues.first()
    }
}

/// Joins issue messages for display.
fn summary(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Raw card details as typed by the user.
///
/// The cycle-end and due fields hold the dates picked in the form
/// (`YYYY-MM-DD`); only their days of month are kept on the card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardForm {
    /// Display name.
    pub name: String,
    /// Picked cycle-end date.
    pub cycle_end: String,
    /// Picked due date.
    pub due: String,
    /// Annual rate in percent; blank means 0.
    pub annual_rate: String,
    /// Daily rate in percent; blank means "derive from the annual rate".
    pub daily_rate: String,
    /// Late fine; blank means 0.
    pub fine: String,
}

/// Card details that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CheckedForm {
    /// Picked cycle-end date.
    cycle_end: NaiveDate,
    /// Picked due date.
    due: NaiveDate,
    /// Annual rate, if typed.
    annual: Option<f64>,
    /// Daily rate, if typed.
    daily: Option<f64>,
    /// Late fine.
    fine: f64,
}

impl CardForm {
    /// Checks every field and reports all problems at once.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] listing each invalid field in form order.
    #[inline]
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check().map(|_checked| ())
    }

    /// Validates the form and builds a card with the given id.
    ///
    /// A blank daily rate is derived from the annual rate, and a blank
    /// annual rate from a typed daily rate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if any field is invalid.
    pub fn into_card(self, id: CardId) -> Result<Card, ValidationError> {
        let checked = self.check()?;
        let (annual, daily) = match (checked.annual, checked.daily) {
            (Some(annual), Some(daily)) => (annual, daily),
            (Some(annual), None) => (annual, daily_from_annual(annual)),
            (None, Some(daily)) => (annual_from_daily(daily), daily),
            (None, None) => (0.0, 0.0),
        };
        Ok(Card {
            id,
            name: self.name.trim().to_owned(),
            cycle_end_day: checked.cycle_end.day(),
            due_day: checked.due.day(),
            annual_rate_percent: annual,
            daily_rate_percent: Some(daily),
            late_fine: checked.fine,
        })
    }

    /// Runs all field checks.
    fn check(&self) -> Result<CheckedForm, ValidationError> {
        let mut issues = Vec::new();

        if self.name.trim().chars().count() < MIN_NAME_CHARS {
            issues.push(FieldIssue::new(
                CardField::Name,
                "Card name is required (3+ chars)",
            ));
        }

        let cycle_end = parse_date(&self.cycle_end);
        if cycle_end.is_none() {
            issues.push(FieldIssue::new(CardField::CycleEnd, "Pick cycle end date"));
        }
        let due = parse_date(&self.due);
        match (cycle_end, due) {
            (_, None) => issues.push(FieldIssue::new(CardField::Due, "Pick due date")),
            (Some(end), Some(due_date)) if due_date <= end => issues.push(FieldIssue::new(
                CardField::Due,
                "Due date must be after cycle end",
            )),
            (None | Some(_), Some(_)) => {}
        }

        let annual = parse_rate(&self.annual_rate);
        if annual.is_err() {
            issues.push(FieldIssue::new(CardField::AnnualRate, "Annual rate must be ≥ 0"));
        }
        let daily = parse_rate(&self.daily_rate);
        if daily.is_err() {
            issues.push(FieldIssue::new(CardField::DailyRate, "Daily rate must be ≥ 0"));
        }
        let fine = parse_rate(&self.fine);
        if fine.is_err() {
            issues.push(FieldIssue::new(CardField::Fine, "Late fine must be ≥ 0"));
        }

        match (cycle_end, due, annual, daily, fine) {
            (Some(end), Some(due_date), Ok(annual), Ok(daily), Ok(fine)) if issues.is_empty() => {
                Ok(CheckedForm {
                    cycle_end: end,
                    due: due_date,
                    annual,
                    daily,
                    fine: fine.unwrap_or(0.0),
                })
            }
            _ => Err(ValidationError::new(issues)),
        }
    }
}

/// Parses a non-negative number; blank input is `Ok(None)`.
fn parse_rate(raw: &str) -> Result<Option<f64>, ()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        Ok(_) | Err(_) => Err(()),
    }
}
