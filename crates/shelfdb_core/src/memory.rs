//! In-memory ordered record store.

use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use crossbeam_skiplist::SkipMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shelfdb_codec::Record;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::ops::Bound;
use std::path::Path;
use tracing::debug;

/// How many records a [`search`](MemoryStore::search) returns at most.
const SEARCH_WINDOW: usize = 5;

/// A concurrent ordered record store.
///
/// Records live in a lock-free skip map ordered lexicographically by
/// key. Unlike [`HashStore`](crate::HashStore), reads here are
/// *approximate*: [`read`](Database::read) returns the ceiling match
/// (smallest key greater than or equal to the one given), so callers
/// needing exact matches must verify the returned key.
///
/// Persistence is bulk-only: [`snapshot`](Self::snapshot) serializes the
/// whole set to a side file and [`load`](Self::load) reads one back.
pub struct MemoryStore<T> {
    records: SkipMap<String, Record<T>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: SkipMap::new(),
        }
    }
}

impl<T> std::fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("records", &self.records.len())
            .finish()
    }
}

impl<T> MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: SkipMap::new(),
        }
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns up to five records centered on the closest match for
    /// `key`.
    ///
    /// Starts from the ceiling match, falling back to the floor match
    /// when every key is smaller, then walks alternately to the
    /// next-lower and next-higher neighbors until the window is full or
    /// both directions are exhausted.
    #[must_use]
    pub fn search(&self, key: &str) -> Vec<Record<T>> {
        let start = self
            .records
            .lower_bound(Bound::Included(key))
            .or_else(|| self.records.upper_bound(Bound::Included(key)));
        let Some(start) = start else {
            return Vec::new();
        };

        let mut matches = vec![start.value().clone()];
        let mut lower = start.prev();
        let mut higher = start.next();

        while matches.len() < SEARCH_WINDOW && (lower.is_some() || higher.is_some()) {
            if let Some(entry) = lower.take() {
                matches.push(entry.value().clone());
                lower = entry.prev();
            }
            if matches.len() < SEARCH_WINDOW {
                if let Some(entry) = higher.take() {
                    matches.push(entry.value().clone());
                    higher = entry.next();
                }
            }
        }

        matches
    }
}

impl<T> MemoryStore<T>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Writes the entire record set to `path` as a CBOR snapshot.
    ///
    /// This is a bulk full-state operation, not an incremental flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or serialization
    /// fails.
    pub fn snapshot(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let records: Vec<Record<T>> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        debug!("snapshotting {} records", records.len());

        let writer = BufWriter::new(File::create(path)?);
        ciborium::into_writer(&records, writer)
            .map_err(|err| CoreError::snapshot(err.to_string()))
    }

    /// Reads a snapshot written by [`snapshot`](Self::snapshot).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or does not hold a
    /// valid snapshot.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let records: Vec<Record<T>> =
            ciborium::from_reader(reader).map_err(|err| CoreError::snapshot(err.to_string()))?;
        debug!("loaded {} records from snapshot", records.len());

        let store = Self::new();
        for record in records {
            store.records.insert(record.key.clone(), record);
        }
        Ok(store)
    }
}

impl<T> Database<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn add(&self, record: Record<T>) -> CoreResult<()> {
        self.records.insert(record.key.clone(), record);
        Ok(())
    }

    fn update(&self, key: &str, record: Record<T>) -> CoreResult<()> {
        self.records.remove(key);
        self.records.insert(
            key.to_string(),
            Record {
                key: key.to_string(),
                ..record
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> CoreResult<()> {
        self.records.remove(key);
        Ok(())
    }

    fn read(&self, key: &str) -> CoreResult<Option<Record<T>>> {
        // Ceiling match: the caller verifies the key when exactness matters.
        Ok(self
            .records
            .lower_bound(Bound::Included(key))
            .map(|entry| entry.value().clone()))
    }

    fn read_all(&self) -> CoreResult<Vec<Record<T>>> {
        Ok(self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn flush(&self) -> CoreResult<()> {
        // Nothing buffered; persistence happens via snapshot().
        Ok(())
    }
}
