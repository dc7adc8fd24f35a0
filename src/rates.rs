//! Keeps a card's annual and daily interest rates consistent.
//!
//! Card forms let the user type either rate; the other one is filled in
//! with the fixed precision the forms display. The grace calculator never
//! re-derives a daily rate that was supplied explicitly.

use crate::models::{DAYS_PER_YEAR, non_negative};

/// Decimal places kept for a daily rate.
const DAILY_DECIMALS: i32 = 6;
/// Decimal places kept for an annual rate.
const ANNUAL_DECIMALS: i32 = 2;

/// Daily rate (percent) matching an annual rate, rounded to 6 decimals.
///
/// Negative or non-finite input yields 0.
///
/// ```
/// use gracewise::rates::daily_from_annual;
///
/// assert_eq!(daily_from_annual(36.0), 0.098_63);
/// ```
#[inline]
#[must_use]
pub fn daily_from_annual(annual_percent: f64) -> f64 {
    round_to(non_negative(annual_percent) / DAYS_PER_YEAR, DAILY_DECIMALS)
}

/// Annual rate (percent) matching a daily rate, rounded to 2 decimals.
///
/// Negative or non-finite input yields 0.
#[inline]
#[must_use]
pub fn annual_from_daily(daily_percent: f64) -> f64 {
    round_to(non_negative(daily_percent) * DAYS_PER_YEAR, ANNUAL_DECIMALS)
}

/// Rounds half away from zero to the given number of decimals.
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_from_annual_rounds_to_six_places() {
        assert!((daily_from_annual(36.0) - 0.098_63).abs() < 1e-12);
        assert!((daily_from_annual(28.5) - 0.078_082).abs() < 1e-12);
        assert!(daily_from_annual(0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn annual_from_daily_rounds_to_two_places() {
        assert!((annual_from_daily(0.1) - 36.5).abs() < 1e-12);
        assert!((annual_from_daily(0.078_082) - 28.5).abs() < 1e-12);
    }

    #[test]
    fn invalid_input_resets_to_zero() {
        assert!(daily_from_annual(-5.0).abs() < f64::EPSILON);
        assert!(annual_from_daily(f64::NAN).abs() < f64::EPSILON);
        assert!(annual_from_daily(f64::INFINITY).abs() < f64::EPSILON);
    }

    #[test]
    fn round_trip_stays_close() {
        let annual = 24.99;
        let back = annual_from_daily(daily_from_annual(annual));
        assert!((back - annual).abs() < 0.01);
    }
}
