//! Export and backup payload holding a user's whole ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Card, Transaction};

/// All cards and transactions of one user at a point in time.
///
/// This is the shape of exported data files and of server-held backups.
/// Older payloads call the cards `banks`; missing arrays read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Stored cards.
    #[serde(default, alias = "banks")]
    pub cards: Vec<Card>,
    /// Stored transactions.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// When the snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Returns `true` if the snapshot holds no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty() && self.transactions.is_empty()
    }
}
