//! Grace period calculator.
//!
//! Maps a purchase date onto the billing cycle that contains it, resolves the
//! payment due date of that cycle and derives the purchase's status, accrued
//! interest and late fine as of a given date.
//!
//! Every function here is pure and total: malformed input degrades to a
//! documented default instead of failing.
//!
//! # Billing cycle rules
//!
//! - A purchase made on or before the cycle-end day belongs to the cycle
//!   closing in the purchase's own month; a later purchase belongs to the
//!   cycle closing in the following month.
//! - Payment is due in the month after the cycle closes, on the due day,
//!   clamped to the last day of that month.
//!
//! ```
//! use gracewise::grace::resolve_due_date;
//! use gracewise::models::NaiveDate;
//!
//! let purchase = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
//! let due = resolve_due_date(purchase, 21, 15);
//! assert_eq!(due, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
//! ```

use chrono::{Datelike as _, Local, Months, NaiveDate};

use crate::cards::CardBook;
use crate::models::{BillingTerms, StatusCategory, Transaction, TransactionAnalysis, non_negative};

/// Returns the date on which the billing cycle containing `purchase` closes.
///
/// The boundary is inclusive: a purchase made on the cycle-end day itself
/// belongs to the cycle closing that day. A cycle-end day past the end of a
/// short month closes the cycle on that month's last day.
#[inline]
#[must_use]
pub fn cycle_end_date(purchase: NaiveDate, cycle_end_day: u32) -> NaiveDate {
    let end_day = cycle_end_day.clamp(1, 31);
    let month = first_of_month(purchase);
    let closing_month = if purchase.day() > end_day {
        next_month(month)
    } else {
        month
    };
    on_day(closing_month, end_day)
}

/// Resolves the payment due date for a purchase.
///
/// The due date falls in the month after the cycle-end month, on `due_day`
/// clamped to that month's length, so it is always strictly after
/// [`cycle_end_date`] for the same inputs.
#[inline]
#[must_use]
pub fn resolve_due_date(purchase: NaiveDate, cycle_end_day: u32, due_day: u32) -> NaiveDate {
    let closing = cycle_end_date(purchase, cycle_end_day);
    on_day(next_month(first_of_month(closing)), due_day.clamp(1, 31))
}

/// Like [`resolve_due_date`], treating a missing purchase date as today.
#[inline]
#[must_use]
pub fn resolve_due_date_or_today(
    purchase: Option<NaiveDate>,
    cycle_end_day: u32,
    due_day: u32,
) -> NaiveDate {
    let purchase_date = purchase.unwrap_or_else(today);
    resolve_due_date(purchase_date, cycle_end_day, due_day)
}

/// Simple (non-compounding) interest: `amount × daily% / 100 × days`.
#[inline]
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "day counts are far below 2^52"
)]
pub fn simple_interest(amount: f64, daily_rate_percent: f64, days: i64) -> f64 {
    amount * (daily_rate_percent / 100.0) * days as f64
}

/// Share of the grace period already elapsed, in whole percent.
///
/// A degenerate grace window (zero or negative days) counts as fully elapsed.
#[inline]
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "day counts are small and the result is clamped into 0..=100"
)]
pub fn progress_percent(grace_days: i64, days_left: i64) -> u8 {
    if grace_days <= 0 {
        return 100;
    }
    let elapsed = grace_days.saturating_sub(days_left) as f64;
    let percent = (elapsed / grace_days as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

/// Analyses a transaction against its card's billing terms as of a date.
///
/// A transaction without a purchase date is treated as bought on `as_of`.
/// Negative or non-finite amounts, rates and fines read as zero.
#[must_use]
pub fn analyze(
    transaction: &Transaction,
    terms: &BillingTerms,
    as_of: NaiveDate,
) -> TransactionAnalysis {
    let purchase = transaction.purchase_date.unwrap_or(as_of);
    let amount = non_negative(transaction.amount);

    let cycle_end = cycle_end_date(purchase, terms.cycle_end_day());
    let due_date = resolve_due_date(purchase, terms.cycle_end_day(), terms.due_day());
    let grace_days = (due_date - purchase).num_days();
    let days_left = (due_date - as_of).num_days();
    let status = StatusCategory::from_days_left(days_left);

    let (overdue_days, interest, fine) = match status {
        StatusCategory::Overdue => {
            let overdue = days_left.saturating_neg();
            (
                overdue,
                simple_interest(amount, terms.daily_rate_percent(), overdue),
                terms.late_fine(),
            )
        }
        StatusCategory::InGrace | StatusCategory::DueToday => (0, 0.0, 0.0),
    };

    TransactionAnalysis {
        cycle_end,
        due_date,
        grace_days,
        days_left,
        overdue_days,
        interest,
        fine,
        total_due: amount + interest + fine,
        status,
        progress_percent: progress_percent(grace_days, days_left),
    }
}

/// Analyses a transaction as of today's local date.
#[inline]
#[must_use]
pub fn analyze_today(transaction: &Transaction, terms: &BillingTerms) -> TransactionAnalysis {
    analyze(transaction, terms, today())
}

/// Analyses every transaction against the card it references.
///
/// Transactions whose card is unknown are analysed with
/// [`BillingTerms::DEFAULT`]. Output order matches input order.
#[must_use]
pub fn analyze_all(
    transactions: &[Transaction],
    cards: &CardBook,
    as_of: NaiveDate,
) -> Vec<TransactionAnalysis> {
    transactions
        .iter()
        .map(|tx| analyze(tx, &cards.terms_for(&tx.card_id), as_of))
        .collect()
}

/// Today's date in the local time zone.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First day of the month containing `date`.
fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after `first`, saturating at the calendar's end.
fn next_month(first: NaiveDate) -> NaiveDate {
    first
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}

/// The given day of `first`'s month, clamped to the month's last day.
fn on_day(first: NaiveDate, day: u32) -> NaiveDate {
    let last = days_in_month(first.year(), first.month());
    first.with_day(day.min(last)).unwrap_or(first)
}

/// Number of days in a month of the proleptic Gregorian calendar.
const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

/// Gregorian leap-year rule.
const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, CardId, TransactionId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn purchase(amount: f64, on: Option<NaiveDate>) -> Transaction {
        Transaction {
            id: TransactionId::new("tx-1".to_owned()),
            card_id: CardId::new("c-1".to_owned()),
            amount,
            purchase_date: on,
            note: None,
        }
    }

    fn visa_terms() -> BillingTerms {
        BillingTerms {
            cycle_end_day: 21,
            due_day: 15,
            annual_rate_percent: 36.0,
            daily_rate_percent: None,
            late_fine: 100.0,
        }
    }

    #[test]
    fn purchase_before_cycle_end_stays_in_cycle() {
        assert_eq!(cycle_end_date(date(2024, 1, 10), 21), date(2024, 1, 21));
        assert_eq!(resolve_due_date(date(2024, 1, 10), 21, 15), date(2024, 2, 15));
    }

    #[test]
    fn purchase_on_cycle_end_day_is_inclusive() {
        assert_eq!(cycle_end_date(date(2024, 1, 21), 21), date(2024, 1, 21));
        assert_eq!(resolve_due_date(date(2024, 1, 21), 21, 15), date(2024, 2, 15));
    }

    #[test]
    fn purchase_after_cycle_end_moves_to_next_cycle() {
        assert_eq!(cycle_end_date(date(2024, 1, 22), 21), date(2024, 2, 21));
        assert_eq!(resolve_due_date(date(2024, 1, 25), 21, 15), date(2024, 3, 15));
    }

    #[test]
    fn december_rolls_into_next_year() {
        assert_eq!(resolve_due_date(date(2023, 12, 5), 21, 15), date(2024, 1, 15));
        assert_eq!(cycle_end_date(date(2023, 12, 28), 21), date(2024, 1, 21));
        assert_eq!(resolve_due_date(date(2023, 12, 28), 21, 15), date(2024, 2, 15));
        assert_eq!(resolve_due_date(date(2023, 11, 30), 25, 10), date(2024, 1, 10));
    }

    #[test]
    fn due_day_clamps_to_short_months() {
        // February of a non-leap year.
        assert_eq!(resolve_due_date(date(2023, 1, 5), 21, 31), date(2023, 2, 28));
        // February of a leap year.
        assert_eq!(resolve_due_date(date(2024, 1, 5), 21, 31), date(2024, 2, 29));
        // 30-day month.
        assert_eq!(resolve_due_date(date(2024, 3, 5), 21, 31), date(2024, 4, 30));
    }

    #[test]
    fn cycle_end_day_clamps_to_short_months() {
        assert_eq!(cycle_end_date(date(2023, 2, 10), 31), date(2023, 2, 28));
        assert_eq!(resolve_due_date(date(2023, 2, 28), 31, 5), date(2023, 3, 5));
    }

    #[test]
    fn out_of_range_days_are_clamped() {
        assert_eq!(resolve_due_date(date(2024, 5, 1), 0, 99), date(2024, 6, 30));
    }

    #[test]
    fn due_date_always_after_cycle_end() {
        let mut day = date(2023, 1, 1);
        let last = date(2024, 12, 31);
        while day <= last {
            for end_day in 1..=31 {
                let closing = cycle_end_date(day, end_day);
                assert!(closing >= day, "{day} closes before purchase");
                for due_day in 1..=31 {
                    let due = resolve_due_date(day, end_day, due_day);
                    assert!(due > closing, "{day} end={end_day} due={due_day}");
                }
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn analyze_in_grace() {
        let result = analyze(
            &purchase(1000.0, Some(date(2024, 1, 10))),
            &visa_terms(),
            date(2024, 2, 10),
        );
        assert_eq!(result.cycle_end, date(2024, 1, 21));
        assert_eq!(result.due_date, date(2024, 2, 15));
        assert_eq!(result.grace_days, 36);
        assert_eq!(result.days_left, 5);
        assert_eq!(result.status, StatusCategory::InGrace);
        assert!(result.interest.abs() < f64::EPSILON);
        assert!(result.fine.abs() < f64::EPSILON);
        assert!((result.total_due - 1000.0).abs() < f64::EPSILON);
        assert_eq!(result.progress_percent, 86);
    }

    #[test]
    fn analyze_due_today() {
        let result = analyze(
            &purchase(250.0, Some(date(2024, 1, 10))),
            &visa_terms(),
            date(2024, 2, 15),
        );
        assert_eq!(result.days_left, 0);
        assert_eq!(result.status, StatusCategory::DueToday);
        assert!((result.total_due - 250.0).abs() < f64::EPSILON);
        assert_eq!(result.progress_percent, 100);
    }

    #[test]
    fn analyze_overdue() {
        let result = analyze(
            &purchase(1000.0, Some(date(2024, 1, 25))),
            &visa_terms(),
            date(2024, 3, 20),
        );
        assert_eq!(result.due_date, date(2024, 3, 15));
        assert_eq!(result.days_left, -5);
        assert_eq!(result.overdue_days, 5);
        assert_eq!(result.status, StatusCategory::Overdue);
        let expected_interest = 1000.0 * (36.0 / 365.0 / 100.0) * 5.0;
        assert!((result.interest - expected_interest).abs() < 1e-9);
        assert!((result.interest - 4.93).abs() < 0.01);
        assert!((result.total_due - 1104.93).abs() < 0.01);
        assert!((result.fine - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.progress_percent, 100);
    }

    #[test]
    fn analyze_uses_daily_override() {
        let terms = BillingTerms {
            daily_rate_percent: Some(0.1),
            ..visa_terms()
        };
        let result = analyze(
            &purchase(1000.0, Some(date(2024, 1, 25))),
            &terms,
            date(2024, 3, 25),
        );
        assert_eq!(result.overdue_days, 10);
        assert!((result.interest - 10.0).abs() < 1e-9);
    }

    #[test]
    fn missing_purchase_date_uses_as_of() {
        let as_of = date(2024, 6, 3);
        let result = analyze(&purchase(80.0, None), &visa_terms(), as_of);
        assert_eq!(result.due_date, date(2024, 7, 15));
        assert_eq!(result.days_left, result.grace_days);
        assert_eq!(result.progress_percent, 0);
    }

    #[test]
    fn negative_amount_reads_as_zero() {
        let result = analyze(
            &purchase(-50.0, Some(date(2024, 1, 1))),
            &visa_terms(),
            date(2024, 5, 1),
        );
        assert_eq!(result.status, StatusCategory::Overdue);
        assert!(result.interest.abs() < f64::EPSILON);
        assert!((result.total_due - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn analyze_is_idempotent() {
        let tx = purchase(420.0, Some(date(2024, 8, 30)));
        let first = analyze(&tx, &visa_terms(), date(2024, 10, 1));
        let second = analyze(&tx, &visa_terms(), date(2024, 10, 1));
        assert_eq!(first, second);
    }

    #[test]
    fn advancing_as_of_decrements_days_left() {
        let tx = purchase(100.0, Some(date(2024, 1, 10)));
        let mut as_of = date(2024, 1, 1);
        let mut previous = analyze(&tx, &visa_terms(), as_of);
        for _ in 0..90 {
            as_of = as_of.succ_opt().unwrap();
            let current = analyze(&tx, &visa_terms(), as_of);
            assert_eq!(current.days_left, previous.days_left - 1);
            assert_eq!(current.due_date, previous.due_date);
            assert!(current.status >= previous.status);
            previous = current;
        }
    }

    #[test]
    fn as_of_before_purchase_clamps_progress() {
        let result = analyze(
            &purchase(10.0, Some(date(2024, 1, 10))),
            &visa_terms(),
            date(2023, 12, 1),
        );
        assert_eq!(result.progress_percent, 0);
        assert_eq!(result.status, StatusCategory::InGrace);
    }

    #[test]
    fn progress_for_degenerate_window() {
        assert_eq!(progress_percent(0, 0), 100);
        assert_eq!(progress_percent(-3, 2), 100);
        assert_eq!(progress_percent(40, 10), 75);
        assert_eq!(progress_percent(40, -10), 100);
    }

    #[test]
    fn simple_interest_is_linear() {
        assert!((simple_interest(1000.0, 0.1, 1) - 1.0).abs() < 1e-12);
        assert!((simple_interest(1000.0, 0.1, 30) - 30.0).abs() < 1e-9);
        assert!(simple_interest(1000.0, 0.1, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn resolve_due_date_or_today_with_date() {
        let due = resolve_due_date_or_today(Some(date(2024, 1, 10)), 21, 15);
        assert_eq!(due, date(2024, 2, 15));
    }

    #[test]
    fn resolve_due_date_or_today_without_date() {
        let due = resolve_due_date_or_today(None, 21, 15);
        assert!(due > Local::now().date_naive());
    }

    #[test]
    fn analyze_all_falls_back_to_default_terms() {
        let card = Card {
            id: CardId::new("c-1".to_owned()),
            name: "Visa".to_owned(),
            cycle_end_day: 5,
            due_day: 25,
            annual_rate_percent: 0.0,
            daily_rate_percent: None,
            late_fine: 0.0,
        };
        let book = CardBook::new(vec![card]);
        let known = purchase(10.0, Some(date(2024, 4, 3)));
        let orphan = Transaction {
            card_id: CardId::new("deleted".to_owned()),
            ..purchase(10.0, Some(date(2024, 4, 3)))
        };
        let results = analyze_all(&[known, orphan], &book, date(2024, 4, 4));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].due_date, date(2024, 5, 25));
        assert_eq!(results[1].due_date, date(2024, 5, 15));
    }

    #[test]
    fn days_in_month_table() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 9), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }
}
