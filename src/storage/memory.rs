//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! the storage traits. Ideal for unit and integration tests where file I/O
//! is undesirable.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

#[cfg(feature = "async")]
use core::future::{self, Future};

use crate::error::{GraceWiseError, Result};
use crate::merge::{remove_by_key, upsert_by_key};
use crate::models::{Card, CardId, Transaction, TransactionId, UserId};

/// Thread-safe in-memory storage for testing.
///
/// This type implements both [`super::Storage`] (async) and
/// [`super::BlockingStorage`] (blocking) traits, providing a zero-setup
/// storage backend for tests. Each user's records live in a separate
/// ledger.
///
/// # Upsert semantics
///
/// Like `FileStorage`, upserts merge by ID: existing items with matching
/// IDs are replaced in place, new items are appended.
///
/// # Example
///
/// ```rust
/// use gracewise::storage::InMemoryStorage;
///
/// let storage = InMemoryStorage::new();
/// // Use with GraceWise or GraceWiseBlocking builders:
/// // GraceWiseBlocking::builder().storage(storage).user("guest").build()
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// All ledgers behind a single mutex for thread-safe interior mutability.
    inner: Mutex<HashMap<UserId, Ledger>>,
}

/// One user's stored records.
#[derive(Debug, Default)]
struct Ledger {
    /// Last reconciliation time.
    synced_at: Option<DateTime<Utc>>,
    /// Stored cards.
    cards: Vec<Card>,
    /// Stored transactions.
    transactions: Vec<Transaction>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock and applies a closure to the user's ledger,
    /// creating an empty one if needed.
    fn with_ledger<R>(&self, user: &UserId, op: impl FnOnce(&mut Ledger) -> R) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        let ledger = inner.entry(user.clone()).or_default();
        Ok(op(ledger))
    }

    /// Drops the user's ledger entirely.
    fn drop_ledger(&self, user: &UserId) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        let _removed = inner.remove(user);
        Ok(())
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> GraceWiseError {
    GraceWiseError::Storage(err.to_string().into())
}

/// Extracts the card ID.
fn card_key(item: &Card) -> CardId {
    item.id.clone()
}

/// Extracts the transaction ID.
fn transaction_key(item: &Transaction) -> TransactionId {
    item.id.clone()
}

/// Replaces `list` with `list` upserted by `incoming`.
fn upsert_in_place<T, K: core::hash::Hash + Eq>(
    list: &mut Vec<T>,
    incoming: Vec<T>,
    key_fn: fn(&T) -> K,
) {
    let existing = core::mem::take(list);
    *list = upsert_by_key(existing, incoming, key_fn);
}

/// Replaces `list` with `list` minus the given ids.
fn remove_in_place<T, K: core::hash::Hash + Eq>(list: &mut Vec<T>, ids: &[K], key_fn: fn(&T) -> K) {
    let existing = core::mem::take(list);
    *list = remove_by_key(existing, ids, key_fn);
}

// ── BlockingStorage implementation ──────────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingStorage for InMemoryStorage {
    #[inline]
    fn synced_at(&self, user: &UserId) -> Result<Option<DateTime<Utc>>> {
        self.with_ledger(user, |ledger| ledger.synced_at)
    }

    #[inline]
    fn set_synced_at(&self, user: &UserId, timestamp: DateTime<Utc>) -> Result<()> {
        self.with_ledger(user, |ledger| ledger.synced_at = Some(timestamp))
    }

    #[inline]
    fn cards(&self, user: &UserId) -> Result<Vec<Card>> {
        self.with_ledger(user, |ledger| ledger.cards.clone())
    }

    #[inline]
    fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>> {
        self.with_ledger(user, |ledger| ledger.transactions.clone())
    }

    #[inline]
    fn upsert_cards(&self, user: &UserId, items: Vec<Card>) -> Result<()> {
        self.with_ledger(user, |ledger| upsert_in_place(&mut ledger.cards, items, card_key))
    }

    #[inline]
    fn upsert_transactions(&self, user: &UserId, items: Vec<Transaction>) -> Result<()> {
        self.with_ledger(user, |ledger| {
            upsert_in_place(&mut ledger.transactions, items, transaction_key);
        })
    }

    #[inline]
    fn remove_cards(&self, user: &UserId, ids: &[CardId]) -> Result<()> {
        self.with_ledger(user, |ledger| remove_in_place(&mut ledger.cards, ids, card_key))
    }

    #[inline]
    fn remove_transactions(&self, user: &UserId, ids: &[TransactionId]) -> Result<()> {
        self.with_ledger(user, |ledger| {
            remove_in_place(&mut ledger.transactions, ids, transaction_key);
        })
    }

    #[inline]
    fn clear(&self, user: &UserId) -> Result<()> {
        self.drop_ledger(user)
    }
}

// ── Storage (async) implementation ──────────────────────────────────────

#[cfg(feature = "async")]
impl super::Storage for InMemoryStorage {
    #[inline]
    fn synced_at(&self, user: &UserId) -> impl Future<Output = Result<Option<DateTime<Utc>>>> + Send {
        future::ready(self.with_ledger(user, |ledger| ledger.synced_at))
    }

    #[inline]
    fn set_synced_at(
        &self,
        user: &UserId,
        timestamp: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_ledger(user, |ledger| ledger.synced_at = Some(timestamp)))
    }

    #[inline]
    fn cards(&self, user: &UserId) -> impl Future<Output = Result<Vec<Card>>> + Send {
        future::ready(self.with_ledger(user, |ledger| ledger.cards.clone()))
    }

    #[inline]
    fn transactions(&self, user: &UserId) -> impl Future<Output = Result<Vec<Transaction>>> + Send {
        future::ready(self.with_ledger(user, |ledger| ledger.transactions.clone()))
    }

    #[inline]
    fn upsert_cards(
        &self,
        user: &UserId,
        items: Vec<Card>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(
            self.with_ledger(user, |ledger| upsert_in_place(&mut ledger.cards, items, card_key)),
        )
    }

    #[inline]
    fn upsert_transactions(
        &self,
        user: &UserId,
        items: Vec<Transaction>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_ledger(user, |ledger| {
            upsert_in_place(&mut ledger.transactions, items, transaction_key);
        }))
    }

    #[inline]
    fn remove_cards(
        &self,
        user: &UserId,
        ids: &[CardId],
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(
            self.with_ledger(user, |ledger| remove_in_place(&mut ledger.cards, ids, card_key)),
        )
    }

    #[inline]
    fn remove_transactions(
        &self,
        user: &UserId,
        ids: &[TransactionId],
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_ledger(user, |ledger| {
            remove_in_place(&mut ledger.transactions, ids, transaction_key);
        }))
    }

    #[inline]
    fn clear(&self, user: &UserId) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.drop_ledger(user))
    }
}
