//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// An in-memory slot region.
///
/// Suitable for unit tests, integration tests, and ephemeral stores that
/// don't need persistence. The region is zero-filled at construction,
/// like a freshly created backing file.
///
/// # Example
///
/// ```rust
/// use shelfdb_storage::{InMemoryBackend, StorageBackend};
///
/// let mut backend = InMemoryBackend::new(16);
/// backend.write_at(4, b"test").unwrap();
/// assert_eq!(backend.read_at(4, 4).unwrap(), b"test");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates a zero-filled region of `region` bytes.
    #[must_use]
    pub fn new(region: usize) -> Self {
        Self {
            data: RwLock::new(vec![0u8; region]),
        }
    }

    /// Creates a backend over pre-existing bytes.
    ///
    /// Useful for testing reopen scenarios.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of the whole region.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let region = data.len() as u64;
        let start = offset as usize;
        let end = start.saturating_add(len);

        if offset > region || end > data.len() {
            return Err(StorageError::OutOfBounds {
                offset,
                len,
                region,
            });
        }

        Ok(data[start..end].to_vec())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> StorageResult<()> {
        let mut data = self.data.write();
        let region = data.len() as u64;
        let start = offset as usize;
        let end = start.saturating_add(bytes.len());

        if offset > region || end > data.len() {
            return Err(StorageError::OutOfBounds {
                offset,
                len: bytes.len(),
                region,
            });
        }

        data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        // Nothing to persist
        Ok(())
    }

    fn len(&self) -> u64 {
        self.data.read().len() as u64
    }
}
