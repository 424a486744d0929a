//! Record wrapper and timestamp types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time with second and nanosecond precision.
///
/// Encoded on the wire as 8-byte seconds followed by 8-byte nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub secs: i64,
    /// Nanosecond fraction of the second.
    pub nanos: u32,
}

impl Timestamp {
    /// Creates a timestamp from raw parts.
    #[must_use]
    pub const fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    /// Returns the current wall-clock time.
    ///
    /// A clock set before the Unix epoch yields the epoch itself.
    #[must_use]
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Self {
                secs: elapsed.as_secs() as i64,
                nanos: elapsed.subsec_nanos(),
            },
            Err(_) => Self::default(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

/// A keyed, timestamped envelope around a stored entry.
///
/// `entry == None` marks a tombstone: the record deletes whatever the
/// store holds under `key`. Stores order records lexicographically by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<T> {
    /// Store-unique key. Must parse as `u32` for the binary header.
    pub key: String,
    /// When this record was created.
    pub timestamp: Timestamp,
    /// The payload, or `None` for a tombstone.
    pub entry: Option<T>,
}

impl<T> Record<T> {
    /// Creates a live record stamped with the current time.
    #[must_use]
    pub fn new(key: impl Into<String>, entry: T) -> Self {
        Self {
            key: key.into(),
            timestamp: Timestamp::now(),
            entry: Some(entry),
        }
    }

    /// Creates a live record with an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(key: impl Into<String>, entry: T, timestamp: Timestamp) -> Self {
        Self {
            key: key.into(),
            timestamp,
            entry: Some(entry),
        }
    }

    /// Creates a tombstone for `key`, stamped with the current time.
    #[must_use]
    pub fn tombstone(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            timestamp: Timestamp::now(),
            entry: None,
        }
    }

    /// Returns whether this record is a tombstone.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.entry.is_none()
    }

    /// Maps the entry type, keeping key and timestamp.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Record<U> {
        Record {
            key: self.key,
            timestamp: self.timestamp,
            entry: self.entry.map(f),
        }
    }

    /// Maps the entry type through a fallible conversion.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Record<U>, E> {
        let entry = match self.entry {
            Some(entry) => Some(f(entry)?),
            None => None,
        };
        Ok(Record {
            key: self.key,
            timestamp: self.timestamp,
            entry,
        })
    }
}
