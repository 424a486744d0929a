//! # shelfdb Codec
//!
//! Fixed-width binary record codecs for shelfdb.
//!
//! Every stored entity variant serializes to a block of a fixed,
//! statically known size; a store's backing file is exactly
//! `max_slots x record_size` bytes. Blocks share a common header:
//!
//! ```text
//! | live (1) | key u32 (4) | secs i64 (8) | nanos i64 (8) | entry fields |
//! ```
//!
//! All integers are big-endian. String fields are zero-padded to their
//! declared width and trimmed of trailing zero/whitespace bytes on
//! decode. A block whose live flag is clear decodes to a tombstone.
//!
//! The codec is pure: no I/O, no state.
//!
//! ## Usage
//!
//! ```
//! use shelfdb_codec::datum::{ItemCodec, ItemDatum};
//! use shelfdb_codec::{Record, RecordCodec};
//!
//! let item = ItemDatum {
//!     item_id: 41,
//!     title: "Dune".to_string(),
//!     ..ItemDatum::default()
//! };
//! let record = Record::new("41", item);
//!
//! let block = ItemCodec.encode(&record).unwrap();
//! assert_eq!(block.len(), ItemCodec.record_size());
//!
//! let decoded = ItemCodec.decode(&block).unwrap();
//! assert_eq!(decoded, record);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod datum;
mod error;
mod fields;
mod record;

pub use error::{CodecError, CodecResult};
pub use record::{Record, Timestamp};

use bytes::{Buf, BufMut, BytesMut};

/// Size of the common record header:
/// live flag (1) + key (4) + seconds (8) + nanoseconds (8).
pub const RECORD_HEADER_SIZE: usize = 21;

/// Value of the live flag byte for an occupied slot.
pub const LIVE: u8 = 1;

/// Fixed-width encode/decode for one entity variant.
///
/// Implementors provide the entry-section layout; the record header and
/// tombstone handling are shared. `encode` always produces exactly
/// [`record_size`](Self::record_size) bytes and `decode` rejects any
/// other input length.
pub trait RecordCodec: Send + Sync {
    /// The entity variant this codec lays out.
    type Entry;

    /// Size of the entry section in bytes.
    fn entry_size(&self) -> usize;

    /// Writes the entry fields, in declared order, into `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be represented.
    fn encode_entry(&self, entry: &Self::Entry, buf: &mut BytesMut) -> CodecResult<()>;

    /// Reads the entry fields back out of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if a field holds an unrepresentable value.
    fn decode_entry(&self, buf: &mut &[u8]) -> CodecResult<Self::Entry>;

    /// Total record size: header plus entry section.
    fn record_size(&self) -> usize {
        RECORD_HEADER_SIZE + self.entry_size()
    }

    /// Encodes a record to a block of exactly [`record_size`](Self::record_size) bytes.
    ///
    /// A tombstone encodes to an all-zero block.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidKey`] if the key does not parse as
    /// `u32`, or an entry-level error.
    fn encode(&self, record: &Record<Self::Entry>) -> CodecResult<Vec<u8>> {
        let size = self.record_size();
        let Some(entry) = &record.entry else {
            return Ok(vec![0u8; size]);
        };

        let key: u32 = record.key.parse().map_err(|_| CodecError::InvalidKey {
            key: record.key.clone(),
        })?;

        let mut buf = BytesMut::with_capacity(size);
        buf.put_u8(LIVE);
        buf.put_u32(key);
        buf.put_i64(record.timestamp.secs);
        buf.put_i64(i64::from(record.timestamp.nanos));
        self.encode_entry(entry, &mut buf)?;

        // Entry layouts are declared sizes; a mismatch here is a codec bug.
        if buf.len() != size {
            return Err(CodecError::SizeMismatch {
                expected: size,
                actual: buf.len(),
            });
        }
        Ok(buf.to_vec())
    }

    /// Decodes a block of exactly [`record_size`](Self::record_size) bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::SizeMismatch`] for any other input length,
    /// or an entry-level error.
    fn decode(&self, block: &[u8]) -> CodecResult<Record<Self::Entry>> {
        let size = self.record_size();
        if block.len() != size {
            return Err(CodecError::SizeMismatch {
                expected: size,
                actual: block.len(),
            });
        }

        let mut buf = block;
        let live = buf.get_u8();
        let key = buf.get_u32();
        let secs = buf.get_i64();
        let nanos = buf.get_i64();
        let timestamp = Timestamp::new(secs, nanos as u32);

        let entry = if live == LIVE {
            Some(self.decode_entry(&mut buf)?)
        } else {
            None
        };

        Ok(Record {
            key: key.to_string(),
            timestamp,
            entry,
        })
    }
}
