//! Purchase transaction model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::lenient;
use super::{CardId, TransactionId};

/// A purchase made with a credit card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Card the purchase was charged to (lookup only).
    pub card_id: CardId,
    /// Principal purchase amount.
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub amount: f64,
    /// Date of the purchase; `None` when missing or unparseable.
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub purchase_date: Option<NaiveDate>,
    /// Free-text label (merchant, what was bought).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
