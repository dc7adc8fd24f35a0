//! Lenient field decoders for records written by older app versions.
//!
//! Stored cards and transactions were hand-edited in browsers for years, so
//! numeric fields may arrive as strings, blanks or garbage, and dates may be
//! missing. These decoders never fail on scalar input: garbage numbers decode
//! as zero and garbage dates as `None`.

use core::fmt;

use chrono::{DateTime, Datelike as _, NaiveDate};
use serde::Deserializer;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};

/// Outcome of decoding a loosely typed scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    /// Field was `null` or a blank string.
    Absent,
    /// A usable number.
    Number(f64),
    /// A string that looks like an ISO date.
    Date(NaiveDate),
    /// Anything else.
    Garbage,
}

/// Visitor accepting any JSON value and classifying it as a [`Scalar`].
struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a number, a numeric string or an ISO date")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Scalar, E> {
        Ok(if value.is_finite() {
            Scalar::Number(value)
        } else {
            Scalar::Garbage
        })
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "amounts and days are far below 2^52"
    )]
    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Scalar, E> {
        Ok(Scalar::Number(value as f64))
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "amounts and days are far below 2^52"
    )]
    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Scalar, E> {
        Ok(Scalar::Number(value as f64))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Scalar, E> {
        Ok(Scalar::Garbage)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Scalar, E> {
        Ok(classify_str(value))
    }

    fn visit_none<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Absent)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Scalar, E> {
        Ok(Scalar::Absent)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Scalar, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Scalar, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Scalar::Garbage)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Scalar, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Scalar::Garbage)
    }
}

/// Classifies a raw string field.
fn classify_str(raw: &str) -> Scalar {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Scalar::Absent;
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        return if number.is_finite() {
            Scalar::Number(number)
        } else {
            Scalar::Garbage
        };
    }
    parse_date(trimmed).map_or(Scalar::Garbage, Scalar::Date)
}

/// Parses `YYYY-MM-DD` or a full RFC 3339 timestamp (keeping its date).
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

/// Decodes a money amount or rate; anything non-numeric becomes `0.0`.
pub(crate) fn number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match deserializer.deserialize_any(ScalarVisitor)? {
        Scalar::Number(value) => Ok(value),
        Scalar::Absent => Ok(0.0),
        other @ (Scalar::Date(_) | Scalar::Garbage) => {
            tracing::warn!(value = ?other, "non-numeric amount coerced to zero");
            Ok(0.0)
        }
    }
}

/// Decodes an optional rate override.
///
/// `null` and blank strings mean "not supplied"; garbage becomes `Some(0.0)`.
pub(crate) fn optional_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    match deserializer.deserialize_any(ScalarVisitor)? {
        Scalar::Number(value) => Ok(Some(value)),
        Scalar::Absent => Ok(None),
        other @ (Scalar::Date(_) | Scalar::Garbage) => {
            tracing::warn!(value = ?other, "non-numeric rate coerced to zero");
            Ok(Some(0.0))
        }
    }
}

/// Decodes a day-of-month.
///
/// Accepts an integer, a numeric string, or an ISO date whose day is taken
/// (older records stored the picked cycle-end and due dates verbatim).
/// Unusable input decodes as `0`, which the billing terms clamp to day 1.
pub(crate) fn day_of_month<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match deserializer.deserialize_any(ScalarVisitor)? {
        Scalar::Number(value) => Ok(day_from_number(value)),
        Scalar::Date(date) => Ok(date.day()),
        other @ (Scalar::Absent | Scalar::Garbage) => {
            tracing::warn!(value = ?other, "unusable day-of-month coerced to zero");
            Ok(0)
        }
    }
}

/// Decodes an optional calendar date; unparseable input becomes `None`.
pub(crate) fn optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error> {
    match deserializer.deserialize_any(ScalarVisitor)? {
        Scalar::Date(date) => Ok(Some(date)),
        Scalar::Absent => Ok(None),
        other @ (Scalar::Number(_) | Scalar::Garbage) => {
            tracing::warn!(value = ?other, "unparseable date treated as missing");
            Ok(None)
        }
    }
}

/// Rounds a numeric day into `0..=31`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped into 0..=31 before the cast"
)]
fn day_from_number(value: f64) -> u32 {
    value.round().clamp(0.0, 31.0) as u32
}
