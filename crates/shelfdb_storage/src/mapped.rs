//! Memory-mapped file backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::Path;

/// A storage backend over a memory-mapped file.
///
/// The backing file is created if absent and extended to the region size
/// on open, then mapped read-write. Writes land in the mapping and reach
/// the file on [`sync`](StorageBackend::sync) (or when the OS writes the
/// pages back). Dropping the backend unmaps the region.
pub struct MappedBackend {
    mmap: MmapMut,
}

impl MappedBackend {
    /// Opens (creating if absent) `path` and maps `region` bytes of it.
    ///
    /// An existing file shorter than `region` is extended with zeros; a
    /// longer file keeps its extra bytes but only `region` is mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, sized, or mapped.
    pub fn open(path: impl AsRef<Path>, region: u64) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.metadata()?.len() < region {
            file.set_len(region)?;
        }

        // SAFETY: the mapping stays valid while `file` is open here and
        // the region is never resized after mapping. Concurrent external
        // mutation of the backing file is undefined behavior, as with
        // any file mapping; the store owns its backing file exclusively.
        let mmap = unsafe { MmapOptions::new().len(region as usize).map_mut(&file)? };

        Ok(Self { mmap })
    }

    fn check_range(&self, offset: u64, len: usize) -> StorageResult<(usize, usize)> {
        let region = self.len();
        let end = offset.checked_add(len as u64);
        match end {
            Some(end) if end <= region => Ok((offset as usize, end as usize)),
            _ => Err(StorageError::OutOfBounds {
                offset,
                len,
                region,
            }),
        }
    }
}

impl StorageBackend for MappedBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let (start, end) = self.check_range(offset, len)?;
        Ok(self.mmap[start..end].to_vec())
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()> {
        let (start, end) = self.check_range(offset, data.len())?;
        self.mmap[start..end].copy_from_slice(data);
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.mmap.flush()?;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.mmap.len() as u64
    }
}

impl std::fmt::Debug for MappedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedBackend")
            .field("region", &self.len())
            .finish_non_exhaustive()
    }
}
