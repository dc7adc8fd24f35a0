//! Credit-card grace period tracker.
//!
//! This crate works out, for every purchase made with a credit card, which
//! billing cycle it falls into, when payment is due, and how much interest
//! and late fine it has accrued once that date has passed. Cards and
//! purchases are kept per user in a pluggable storage backend and can be
//! exported to, or merged back from, a JSON backup.

pub mod cards;
pub mod error;
pub mod grace;
pub mod gracewise;
pub mod merge;
pub mod models;
pub mod rates;
pub mod storage;
pub mod validation;
