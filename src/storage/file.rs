//! JSON-file-based storage backend.
//!
//! Stores each user's cards and transactions in separate JSON files under a
//! configurable directory (default: `$XDG_DATA_HOME/gracewise/`).

use core::hash::Hash;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "async")]
use core::future::{self, Future};

use crate::error::{GraceWiseError, Result};
use crate::merge::{remove_by_key, upsert_by_key};
use crate::models::{Card, CardId, Transaction, TransactionId, UserId};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "gracewise";

/// File name for per-user metadata.
const META_FILE: &str = "meta.json";
/// File name for cards.
const CARDS_FILE: &str = "cards.json";
/// File name for transactions.
const TRANSACTIONS_FILE: &str = "transactions.json";
/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// Metadata stored alongside a user's record files.
#[derive(Debug, Serialize, Deserialize, Default)]
struct Meta {
    /// Last reconciliation time in seconds since epoch, or absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    synced_at: Option<i64>,
}

/// File-backed storage that persists records as JSON files.
///
/// Each user gets a subdirectory named after their escaped user id,
/// holding one `.json` file per record type and a `meta.json` with the last
/// reconciliation time.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Cross-process safety is achieved via an advisory file lock
/// on `storage.lock` (using [`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]).
///
/// Read operations acquire a shared lock (allowing concurrent readers),
/// while write operations acquire an exclusive lock.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock          (cross-process lock sentinel)
///   <user>/
///     meta.json
///     cards.json
///     transactions.json
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory containing all user directories.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist. Also
    /// opens (or creates) the `storage.lock` sentinel file used for
    /// cross-process advisory locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/gracewise/` (typically
    /// `~/.local/share/gracewise/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                GraceWiseError::Storage("could not determine platform data directory".into())
            })
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Returns the directory holding a user's files.
    fn user_dir(&self, user: &UserId) -> PathBuf {
        self.dir.join(user_dir_name(user))
    }

    /// Returns the full path of one of a user's files.
    fn path(&self, user: &UserId, name: &str) -> PathBuf {
        self.user_dir(user).join(name)
    }

    /// Acquires an in-process mutex guard and a shared (read) file lock,
    /// executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // Only surface the unlock error when the operation succeeded;
        // otherwise the original error is more useful.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires an in-process mutex guard and an exclusive (write) file
    /// lock, executes `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads and deserializes a record file. Returns an empty `Vec` if the
    /// file does not exist.
    fn read_records<T: serde::de::DeserializeOwned>(
        &self,
        user: &UserId,
        name: &str,
    ) -> Result<Vec<T>> {
        match fs::read_to_string(self.path(user, name)) {
            Ok(contents) => serde_json::from_str(&contents).map_err(GraceWiseError::from),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Atomically writes a JSON file (write-to-tmp then rename), creating
    /// the user directory on first write.
    fn write_json<T: Serialize + ?Sized>(&self, user: &UserId, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(self.user_dir(user)).map_err(storage_io_error)?;
        let path = self.path(user, name);
        let tmp_path = self.path(user, &format!("{name}.tmp"));
        let json = serde_json::to_string_pretty(value).map_err(GraceWiseError::from)?;
        fs::write(&tmp_path, json).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &path).map_err(storage_io_error)?;
        Ok(())
    }

    /// Reads the metadata file.
    fn read_meta(&self, user: &UserId) -> Result<Meta> {
        match fs::read_to_string(self.path(user, META_FILE)) {
            Ok(contents) => serde_json::from_str(&contents).map_err(GraceWiseError::from),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Meta::default()),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Reads a record file under a shared lock.
    fn read_file<T: serde::de::DeserializeOwned>(
        &self,
        user: &UserId,
        name: &str,
    ) -> Result<Vec<T>> {
        self.with_shared_lock(|| self.read_records(user, name))
    }

    /// Merges new items into a record file by key (insert-or-replace).
    fn upsert_file<T, K>(
        &self,
        user: &UserId,
        name: &str,
        new_items: Vec<T>,
        key_fn: fn(&T) -> K,
    ) -> Result<()>
    where
        T: Serialize + serde::de::DeserializeOwned,
        K: Hash + Eq,
    {
        if new_items.is_empty() {
            return Ok(());
        }
        self.with_exclusive_lock(|| {
            let existing: Vec<T> = self.read_records(user, name)?;
            let merged = upsert_by_key(existing, new_items, key_fn);
            self.write_json(user, name, &merged)
        })
    }

    /// Removes items from a record file by key.
    fn remove_file<T, K>(
        &self,
        user: &UserId,
        name: &str,
        ids: &[K],
        key_fn: fn(&T) -> K,
    ) -> Result<()>
    where
        T: Serialize + serde::de::DeserializeOwned,
        K: Hash + Eq,
    {
        if ids.is_empty() {
            return Ok(());
        }
        self.with_exclusive_lock(|| {
            let existing: Vec<T> = self.read_records(user, name)?;
            let filtered = remove_by_key(existing, ids, key_fn);
            self.write_json(user, name, &filtered)
        })
    }

    /// Reads `synced_at` from meta (with lock).
    fn read_synced_at(&self, user: &UserId) -> Result<Option<DateTime<Utc>>> {
        self.with_shared_lock(|| {
            let meta = self.read_meta(user)?;
            Ok(meta
                .synced_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0_u32)))
        })
    }

    /// Writes `synced_at` to meta (with lock).
    fn write_synced_at(&self, user: &UserId, timestamp: DateTime<Utc>) -> Result<()> {
        self.with_exclusive_lock(|| {
            let mut meta = self.read_meta(user)?;
            meta.synced_at = Some(timestamp.timestamp());
            self.write_json(user, META_FILE, &meta)
        })
    }

    /// Deletes a user's record files and metadata.
    ///
    /// The `storage.lock` sentinel is preserved; it is shared by all users.
    fn clear_user(&self, user: &UserId) -> Result<()> {
        self.with_exclusive_lock(|| {
            for name in [META_FILE, CARDS_FILE, TRANSACTIONS_FILE] {
                match fs::remove_file(self.path(user, name)) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(storage_io_error(err)),
                }
            }
            Ok(())
        })
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Maps a user id onto its directory name. The mapping is one-to-one; see
/// [`UserId::path_safe`].
fn user_dir_name(user: &UserId) -> String {
    user.path_safe()
}

/// Wraps an I/O error into a [`GraceWiseError::Storage`].
fn storage_io_error(err: std::io::Error) -> GraceWiseError {
    GraceWiseError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`GraceWiseError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> GraceWiseError {
    GraceWiseError::Storage(err.to_string().into())
}

// ── Key extraction functions ────────────────────────────────────────────

/// Extracts the card ID.
fn card_key(item: &Card) -> CardId {
    item.id.clone()
}

/// Extracts the transaction ID.
fn transaction_key(item: &Transaction) -> TransactionId {
    item.id.clone()
}

// ── BlockingStorage implementation ──────────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingStorage for FileStorage {
    #[inline]
    fn synced_at(&self, user: &UserId) -> Result<Option<DateTime<Utc>>> {
        self.read_synced_at(user)
    }

    #[inline]
    fn set_synced_at(&self, user: &UserId, timestamp: DateTime<Utc>) -> Result<()> {
        self.write_synced_at(user, timestamp)
    }

    #[inline]
    fn cards(&self, user: &UserId) -> Result<Vec<Card>> {
        self.read_file(user, CARDS_FILE)
    }

    #[inline]
    fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>> {
        self.read_file(user, TRANSACTIONS_FILE)
    }

    #[inline]
    fn upsert_cards(&self, user: &UserId, items: Vec<Card>) -> Result<()> {
        self.upsert_file(user, CARDS_FILE, items, card_key)
    }

    #[inline]
    fn upsert_transactions(&self, user: &UserId, items: Vec<Transaction>) -> Result<()> {
        self.upsert_file(user, TRANSACTIONS_FILE, items, transaction_key)
    }

    #[inline]
    fn remove_cards(&self, user: &UserId, ids: &[CardId]) -> Result<()> {
        self.remove_file::<Card, _>(user, CARDS_FILE, ids, card_key)
    }

    #[inline]
    fn remove_transactions(&self, user: &UserId, ids: &[TransactionId]) -> Result<()> {
        self.remove_file::<Transaction, _>(user, TRANSACTIONS_FILE, ids, transaction_key)
    }

    #[inline]
    fn clear(&self, user: &UserId) -> Result<()> {
        self.clear_user(user)
    }
}

// ── Storage (async) implementation ──────────────────────────────────────

#[cfg(feature = "async")]
impl super::Storage for FileStorage {
    #[inline]
    fn synced_at(&self, user: &UserId) -> impl Future<Output = Result<Option<DateTime<Utc>>>> + Send {
        future::ready(self.read_synced_at(user))
    }

    #[inline]
    fn set_synced_at(
        &self,
        user: &UserId,
        timestamp: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write_synced_at(user, timestamp))
    }

    #[inline]
    fn cards(&self, user: &UserId) -> impl Future<Output = Result<Vec<Card>>> + Send {
        future::ready(self.read_file(user, CARDS_FILE))
    }

    #[inline]
    fn transactions(&self, user: &UserId) -> impl Future<Output = Result<Vec<Transaction>>> + Send {
        future::ready(self.read_file(user, TRANSACTIONS_FILE))
    }

    #[inline]
    fn upsert_cards(
        &self,
        user: &UserId,
        items: Vec<Card>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.upsert_file(user, CARDS_FILE, items, card_key))
    }

    #[inline]
    fn upsert_transactions(
        &self,
        user: &UserId,
        items: Vec<Transaction>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.upsert_file(user, TRANSACTIONS_FILE, items, transaction_key))
    }

    #[inline]
    fn remove_cards(
        &self,
        user: &UserId,
        ids: &[CardId],
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.remove_file::<Card, _>(user, CARDS_FILE, ids, card_key))
    }

    #[inline]
    fn remove_transactions(
        &self,
        user: &UserId,
        ids: &[TransactionId],
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.remove_file::<Transaction, _>(
            user,
            TRANSACTIONS_FILE,
            ids,
            transaction_key,
        ))
    }

    #[inline]
    fn clear(&self, user: &UserId) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.clear_user(user))
    }
}
