//! High-level GraceWise ledger with integrated storage.
//!
//! Binds a [`Storage`](crate::storage::Storage) /
//! [`BlockingStorage`](crate::storage::BlockingStorage) backend to one
//! explicit user and exposes the card, purchase, analysis and backup
//! operations on top of it.

use std::collections::HashSet;

use crate::cards::CardBook;
use crate::grace;
use crate::merge::upsert_by_key;
use crate::models::{Card, NaiveDate, Snapshot, Transaction, TransactionAnalysis};

/// Prefix of exported data file names.
const EXPORT_FILE_PREFIX: &str = "gracewise_";

/// A transaction paired with its card's name and its grace analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedTransaction {
    /// The stored purchase.
    pub transaction: Transaction,
    /// Name of the referenced card, or `None` if the card is unknown.
    pub card_name: Option<String>,
    /// Grace status as of the requested date.
    pub analysis: TransactionAnalysis,
}

/// Outcome of [`GraceWiseBlocking::restore_and_merge`] and its async twin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Cards stored after the merge.
    pub cards: usize,
    /// Transactions stored after the merge.
    pub transactions: usize,
    /// Cards that only existed in the backup.
    pub restored_cards: usize,
    /// Transactions that only existed in the backup.
    pub restored_transactions: usize,
}

/// Pairs every transaction with its card name and analysis.
fn annotate(
    transactions: Vec<Transaction>,
    book: &CardBook,
    as_of: NaiveDate,
) -> Vec<AnalyzedTransaction> {
    let analyses = grace::analyze_all(&transactions, book, as_of);
    transactions
        .into_iter()
        .zip(analyses)
        .map(|(transaction, analysis)| AnalyzedTransaction {
            card_name: book.get(&transaction.card_id).map(|card| card.name.clone()),
            transaction,
            analysis,
        })
        .collect()
}

/// Unites a backup with the local records; local wins on id conflicts.
fn merge_snapshot(
    local_cards: Vec<Card>,
    local_transactions: Vec<Transaction>,
    remote: Snapshot,
) -> (Vec<Card>, Vec<Transaction>, MergeSummary) {
    let local_card_ids: HashSet<_> = local_cards.iter().map(|card| card.id.clone()).collect();
    let local_tx_ids: HashSet<_> = local_transactions.iter().map(|tx| tx.id.clone()).collect();
    let restored_cards = remote
        .cards
        .iter()
        .filter(|card| !local_card_ids.contains(&card.id))
        .count();
    let restored_transactions = remote
        .transactions
        .iter()
        .filter(|tx| !local_tx_ids.contains(&tx.id))
        .count();

    let cards = upsert_by_key(remote.cards, local_cards, |card| card.id.clone());
    let transactions = upsert_by_key(remote.transactions, local_transactions, |tx| tx.id.clone());
    let summary = MergeSummary {
        cards: cards.len(),
        transactions: transactions.len(),
        restored_cards,
        restored_transactions,
    };
    (cards, transactions, summary)
}

/// Generates a high-level GraceWise ledger (async or blocking).
macro_rules! define_gracewise {
    (
        ledger_name: $ledger:ident,
        builder_name: $builder:ident,
        storage_trait: $storage_trait:ident,
        ledger_doc: $ledger_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder<S: $storage_trait> {
            /// Owner of the ledger.
            user: Option<UserId>,
            /// Storage backend.
            storage: Option<S>,
        }

        impl<S: $storage_trait> $builder<S> {
            /// Sets the user whose records are read and written.
            #[inline]
            #[must_use]
            pub fn user<T: Into<UserId>>(mut self, user: T) -> Self {
                self.user = Some(user.into());
                self
            }

            /// Sets the storage backend.
            #[inline]
            #[must_use]
            pub fn storage(mut self, storage: S) -> Self {
                self.storage = Some(storage);
                self
            }

            /// Builds the ledger.
            ///
            /// # Errors
            ///
            /// Returns [`GraceWiseError::MissingUser`] if no user was provided.
            /// Returns [`GraceWiseError::Storage`] if no storage was provided.
            #[inline]
            pub fn build(self) -> Result<$ledger<S>> {
                let storage = self.storage.ok_or_else(|| {
                    GraceWiseError::Storage("storage backend is required".into())
                })?;
                let user = self.user.ok_or(GraceWiseError::MissingUser)?;
                Ok($ledger { user, storage })
            }
        }

        #[doc = $ledger_doc]
        #[derive(Debug)]
        pub struct $ledger<S: $storage_trait> {
            /// Owner of the ledger.
            user: UserId,
            /// Storage backend.
            storage: S,
        }

        impl<S: $storage_trait> $ledger<S> {
            /// Creates a new builder for configuring the ledger.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder<S> {
                $builder {
                    user: None,
                    storage: None,
                }
            }

            /// Returns the user this ledger belongs to.
            #[inline]
            #[must_use]
            pub const fn user(&self) -> &UserId {
                &self.user
            }

            /// Returns a reference to the storage backend.
            #[inline]
            #[must_use]
            pub const fn storage(&self) -> &S {
                &self.storage
            }

            /// Returns all stored cards.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            #[inline]
            pub $($async_kw)? fn cards(&self) -> Result<Vec<Card>> {
                self.storage.cards(&self.user) $( .$await_ext )?
            }

            /// Returns all stored transactions.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            #[inline]
            pub $($async_kw)? fn transactions(&self) -> Result<Vec<Transaction>> {
                self.storage.transactions(&self.user) $( .$await_ext )?
            }

            /// Returns the stored cards indexed by id.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            pub $($async_kw)? fn card_book(&self) -> Result<CardBook> {
                let cards = self.storage.cards(&self.user) $( .$await_ext )? ?;
                Ok(CardBook::new(cards))
            }

            /// Validates a card form and stores the resulting card.
            ///
            /// A stored card with the same name (case-insensitive) is
            /// replaced and keeps its id; otherwise a fresh id is generated.
            ///
            /// # Errors
            ///
            /// Returns [`GraceWiseError::Validation`] if the form is invalid,
            /// or a storage error if reading or writing fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn save_card(&self, form: &CardForm) -> Result<Card> {
                form.validate()?;
                let book = self.card_book() $( .$await_ext )? ?;
                let id = book
                    .find_by_name(&form.name)
                    .map_or_else(CardId::generate, |existing| existing.id.clone());
                let card = form.clone().into_card(id)?;
                tracing::debug!(card = %card.id, name = %card.name, "saving card");
                self.storage
                    .upsert_cards(&self.user, vec![card.clone()])
                    $( .$await_ext )? ?;
                Ok(card)
            }

            /// Records a purchase on a card under a freshly generated id.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to write.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn record_purchase(
                &self,
                card_id: CardId,
                amount: f64,
                purchase_date: Option<NaiveDate>,
                note: Option<String>,
            ) -> Result<Transaction> {
                let transaction = Transaction {
                    id: TransactionId::generate(),
                    card_id,
                    amount,
                    purchase_date,
                    note,
                };
                tracing::debug!(
                    transaction = %transaction.id,
                    card = %transaction.card_id,
                    "recording purchase"
                );
                self.storage
                    .upsert_transactions(&self.user, vec![transaction.clone()])
                    $( .$await_ext )? ?;
                Ok(transaction)
            }

            /// Removes cards by id. Their transactions are kept and fall
            /// back to default billing terms.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to write.
            #[inline]
            pub $($async_kw)? fn remove_cards(&self, ids: &[CardId]) -> Result<()> {
                self.storage.remove_cards(&self.user, ids) $( .$await_ext )?
            }

            /// Removes transactions by id.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to write.
            #[inline]
            pub $($async_kw)? fn remove_transactions(&self, ids: &[TransactionId]) -> Result<()> {
                self.storage.remove_transactions(&self.user, ids) $( .$await_ext )?
            }

            /// Analyses every stored transaction as of `as_of`, in storage
            /// order.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn analyze_all(
                &self,
                as_of: NaiveDate,
            ) -> Result<Vec<AnalyzedTransaction>> {
                let book = self.card_book() $( .$await_ext )? ?;
                let transactions = self.storage.transactions(&self.user) $( .$await_ext )? ?;
                tracing::debug!(
                    cards = book.len(),
                    transactions = transactions.len(),
                    %as_of,
                    "analysing ledger"
                );
                Ok(annotate(transactions, &book, as_of))
            }

            /// Captures every stored record in an export payload.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            pub $($async_kw)? fn export_snapshot(&self, now: DateTime<Utc>) -> Result<Snapshot> {
                let cards = self.storage.cards(&self.user) $( .$await_ext )? ?;
                let transactions = self.storage.transactions(&self.user) $( .$await_ext )? ?;
                Ok(Snapshot {
                    cards,
                    transactions,
                    exported_at: Some(now),
                })
            }

            /// Merges a backup into the stored records.
            ///
            /// The result is the union of both sides by id; where both hold
            /// the same id the local record is kept. The merged set is
            /// upserted over the stored records, so a failed write leaves
            /// every local record in place. `now` is stored as the sync time
            /// once both writes succeed.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read or write.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn restore_and_merge(
                &self,
                remote: Snapshot,
                now: DateTime<Utc>,
            ) -> Result<MergeSummary> {
                let local_cards = self.storage.cards(&self.user) $( .$await_ext )? ?;
                let local_transactions = self.storage.transactions(&self.user) $( .$await_ext )? ?;
                let (cards, transactions, summary) =
                    merge_snapshot(local_cards, local_transactions, remote);

                self.storage.upsert_cards(&self.user, cards) $( .$await_ext )? ?;
                self.storage
                    .upsert_transactions(&self.user, transactions)
                    $( .$await_ext )? ?;
                self.storage.set_synced_at(&self.user, now) $( .$await_ext )? ?;
                tracing::debug!(
                    cards = summary.cards,
                    transactions = summary.transactions,
                    restored_cards = summary.restored_cards,
                    restored_transactions = summary.restored_transactions,
                    "backup merged"
                );
                Ok(summary)
            }

            /// Returns when the records were last merged with a backup.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            #[inline]
            pub $($async_kw)? fn synced_at(&self) -> Result<Option<DateTime<Utc>>> {
                self.storage.synced_at(&self.user) $( .$await_ext )?
            }

            /// File name for this user's exported data. The user id is
            /// escaped with [`UserId::path_safe`].
            #[inline]
            #[must_use]
            pub fn export_file_name(&self) -> String {
                format!("{EXPORT_FILE_PREFIX}{}.json", self.user.path_safe())
            }
        }
    };
}

// ── Async variant ───────────────────────────────────────────────────────

#[cfg(feature = "async")]
mod async_gracewise {
    //! Async high-level ledger.

    use crate::cards::CardBook;
    use crate::error::{GraceWiseError, Result};
    use crate::models::{Card, CardId, NaiveDate, Snapshot, Transaction, TransactionId, UserId};
    use crate::storage::Storage;
    use crate::validation::CardForm;
    use chrono::{DateTime, Utc};

    use super::{AnalyzedTransaction, EXPORT_FILE_PREFIX, MergeSummary, annotate, merge_snapshot};

    define_gracewise! {
        ledger_name: GraceWise,
        builder_name: GraceWiseBuilder,
        storage_trait: Storage,
        ledger_doc: "High-level async GraceWise ledger with integrated storage.\n\nUse [`GraceWise::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`GraceWise`] ledger.",
        async_kw: async,
        await_kw: await,
    }
}

// ── Blocking variant ────────────────────────────────────────────────────

#[cfg(feature = "blocking")]
mod blocking_gracewise {
    //! Blocking high-level ledger.

    use crate::cards::CardBook;
    use crate::error::{GraceWiseError, Result};
    use crate::models::{Card, CardId, NaiveDate, Snapshot, Transaction, TransactionId, UserId};
    use crate::storage::BlockingStorage;
    use crate::validation::CardForm;
    use chrono::{DateTime, Utc};

    use super::{AnalyzedTransaction, EXPORT_FILE_PREFIX, MergeSummary, annotate, merge_snapshot};

    define_gracewise! {
        ledger_name: GraceWiseBlocking,
        builder_name: GraceWiseBlockingBuilder,
        storage_trait: BlockingStorage,
        ledger_doc: "High-level blocking GraceWise ledger with integrated storage.\n\nUse [`GraceWiseBlocking::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`GraceWiseBlocking`] ledger.",
    }
}

#[cfg(feature = "async")]
pub use async_gracewise::{GraceWise, GraceWiseBuilder};
#[cfg(feature = "blocking")]
pub use blocking_gracewise::{GraceWiseBlocking, GraceWiseBlockingBuilder};
