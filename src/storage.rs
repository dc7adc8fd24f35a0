//! Pluggable storage backends for persisting cards and transactions.
//!
//! This module defines the [`Storage`] (async) and [`BlockingStorage`]
//! (blocking) traits via a shared macro. Every method is scoped to an
//! explicit [`UserId`](crate::models::UserId): there is no ambient
//! "current user".

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

/// Generates a storage trait (async or blocking) with all record methods.
///
/// Uses `@methods` to define the method list once, and `@method` to render
/// each method in async (`impl Future + Send`) or blocking (`fn`) style.
macro_rules! define_storage {
    // ── Entry points ────────────────────────────────────────────────
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: async_mode,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_storage!(@methods async_mode);
        }
    };
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: blocking,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_storage!(@methods blocking);
        }
    };

    // ── Single method list (shared between both variants) ───────────
    (@methods $mode:ident) => {
        // Sync state
        define_storage!(@method $mode, synced_at,
            "Returns when the user's records were last reconciled with a backup.\n\nReturns `Ok(None)` if that never happened.\n\n# Errors\n\nReturns an error if the storage backend fails to read the timestamp.",
            user: &UserId, -> Result<Option<DateTime<Utc>>>);
        define_storage!(@method $mode, set_synced_at,
            "Stores the time of the last reconciliation.\n\n# Errors\n\nReturns an error if the storage backend fails to write the timestamp.",
            user: &UserId, timestamp: DateTime<Utc>, -> Result<()>);

        // Read
        define_storage!(@method $mode, cards,
            "Returns all stored cards of the user, in insertion order.\n\n# Errors\n\nReturns an error if the storage backend fails to read.",
            user: &UserId, -> Result<Vec<Card>>);
        define_storage!(@method $mode, transactions,
            "Returns all stored transactions of the user, in insertion order.\n\n# Errors\n\nReturns an error if the storage backend fails to read.",
            user: &UserId, -> Result<Vec<Transaction>>);

        // Upsert
        define_storage!(@method $mode, upsert_cards,
            "Inserts or updates cards (matched by ID).\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            user: &UserId, items: Vec<Card>, -> Result<()>);
        define_storage!(@method $mode, upsert_transactions,
            "Inserts or updates transactions (matched by ID).\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            user: &UserId, items: Vec<Transaction>, -> Result<()>);

        // Remove
        define_storage!(@method $mode, remove_cards,
            "Removes cards by their IDs.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            user: &UserId, ids: &[CardId], -> Result<()>);
        define_storage!(@method $mode, remove_transactions,
            "Removes transactions by their IDs.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            user: &UserId, ids: &[TransactionId], -> Result<()>);

        // Clear
        define_storage!(@method $mode, clear,
            "Removes all stored data of the user.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            user: &UserId, -> Result<()>);
    };

    // ── Blocking method renderer ────────────────────────────────────
    (@method blocking, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*) -> $ret;
    };

    // ── Async method renderer (returns impl Future + Send) ──────────
    (@method async_mode, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*)
            -> impl core::future::Future<Output = $ret> + Send;
    };
}

#[cfg(feature = "async")]
mod async_storage {
    //! Async storage trait definition.

    use crate::error::Result;
    use crate::models::{Card, CardId, Transaction, TransactionId, UserId};
    use chrono::{DateTime, Utc};

    define_storage! {
        trait_name: Storage,
        trait_doc: "Async storage backend for persisting GraceWise records.\n\nAll methods take `&self`; implementations should use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: async_mode,
    }
}

#[cfg(feature = "blocking")]
mod blocking_storage {
    //! Blocking storage trait definition.

    use crate::error::Result;
    use crate::models::{Card, CardId, Transaction, TransactionId, UserId};
    use chrono::{DateTime, Utc};

    define_storage! {
        trait_name: BlockingStorage,
        trait_doc: "Blocking storage backend for persisting GraceWise records.\n\nAll methods take `&self`; implementations should use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: blocking,
    }
}

#[cfg(feature = "async")]
pub use async_storage::Storage;
#[cfg(feature = "blocking")]
pub use blocking_storage::BlockingStorage;
