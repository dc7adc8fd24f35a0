//! Data models for GraceWise records.
//!
//! This module contains the persisted records (cards and transactions),
//! the derived [`TransactionAnalysis`], newtype ID wrappers and the
//! [`Snapshot`] export payload.

mod analysis;
mod card;
mod ids;
mod lenient;
mod snapshot;
mod transaction;

pub use analysis::{StatusCategory, TransactionAnalysis};
pub use card::{BillingTerms, Card, DAYS_PER_YEAR};
pub use chrono::NaiveDate;
pub use ids::{CardId, TransactionId, UserId};
pub use snapshot::Snapshot;
pub use transaction::Transaction;

pub(crate) use card::non_negative;
pub(crate) use lenient::parse_date;
