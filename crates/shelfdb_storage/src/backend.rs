//! Storage backend trait definition.

use crate::error::StorageResult;

/// A fixed-size byte region addressed by offset.
///
/// Backends are **opaque slot regions**. They read and write byte ranges
/// in place and flush them to durable storage. shelfdb owns all format
/// interpretation — backends do not understand records, slots, or
/// probing.
///
/// # Invariants
///
/// - The region size is fixed at construction; `read_at`/`write_at`
///   never grow it and fail on any access crossing its end
/// - `read_at` returns exactly the bytes most recently written at that
///   offset (all zeros where nothing was written)
/// - After `sync` returns, all written data survives process termination
/// - Backends must be `Send + Sync` for shared access behind a lock
///
/// # Implementors
///
/// - [`super::MappedBackend`] — memory-mapped file, for persistence
/// - [`super::InMemoryBackend`] — for tests and ephemeral stores
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range crosses the end of the region or an
    /// I/O error occurs.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes `data` in place starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range crosses the end of the region or an
    /// I/O error occurs.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Forces all written data to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the fixed region size in bytes.
    fn len(&self) -> u64;

    /// Returns whether the region is zero-sized.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
