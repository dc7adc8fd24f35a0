//! Card lookup by identifier.
//!
//! Transactions only hold a weak reference to their card. [`CardBook`]
//! resolves those references once per batch and substitutes
//! [`BillingTerms::DEFAULT`] when a card no longer exists.

use std::collections::HashMap;

use crate::models::{BillingTerms, Card, CardId};

/// Index of a user's cards keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CardBook {
    /// Cards by id.
    cards: HashMap<CardId, Card>,
}

impl CardBook {
    /// Builds a lookup table. Later cards win on duplicate ids.
    #[inline]
    #[must_use]
    pub fn new(cards: Vec<Card>) -> Self {
        let cards = cards
            .into_iter()
            .map(|card| (card.id.clone(), card))
            .collect();
        Self { cards }
    }

    /// Returns the card with the given id, if known.
    #[inline]
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    /// Returns the billing terms for a card, or the default terms when the
    /// card cannot be resolved.
    #[inline]
    #[must_use]
    pub fn terms_for(&self, id: &CardId) -> BillingTerms {
        self.cards.get(id).map_or_else(
            || {
                tracing::debug!(card_id = %id, "unknown card, using default billing terms");
                BillingTerms::DEFAULT
            },
            Card::terms,
        )
    }

    /// Finds a card by display name (case-insensitive, surrounding
    /// whitespace ignored).
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Card> {
        let wanted = name.trim().to_lowercase();
        self.cards
            .values()
            .find(|card| card.name.trim().to_lowercase() == wanted)
    }

    /// Number of known cards.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns `true` if no cards are known.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
