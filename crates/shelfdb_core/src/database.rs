//! The store contract shared by all backends.

use crate::error::CoreResult;
use shelfdb_codec::Record;

/// A keyed record store.
///
/// Implemented by [`HashStore`](crate::HashStore) (memory-mapped,
/// hash-indexed) and [`MemoryStore`](crate::MemoryStore) (concurrent
/// ordered set). Mutation is replacement-only: a new record for an
/// existing key supersedes the old one wholesale, and deletion writes a
/// tombstone.
pub trait Database<T>: Send + Sync {
    /// Adds a record. An existing record with the same key is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or an automatic flush fails.
    fn add(&self, record: Record<T>) -> CoreResult<()>;

    /// Replaces the record stored under `key`. Behaves as [`add`](Self::add)
    /// with the record rekeyed to `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or an automatic flush fails.
    fn update(&self, key: &str, record: Record<T>) -> CoreResult<()>;

    /// Deletes the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or an automatic flush fails.
    fn delete(&self, key: &str) -> CoreResult<()>;

    /// Looks up a record by key.
    ///
    /// `HashStore` matches the key exactly; `MemoryStore` returns the
    /// ceiling match, so callers needing equality must verify the
    /// returned key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn read(&self, key: &str) -> CoreResult<Option<Record<T>>>;

    /// Returns every live record in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn read_all(&self) -> CoreResult<Vec<Record<T>>>;

    /// Makes all buffered mutations visible in the store.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the flush fails; the store is rolled
    /// back to its pre-flush contents.
    fn flush(&self) -> CoreResult<()>;
}
