//! Item variant and its fixed layout.

use crate::error::CodecResult;
use crate::fields;
use crate::RecordCodec;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

const TITLE_WIDTH: usize = 50;
const AUTHOR_WIDTH: usize = 30;
const LOCATION_WIDTH: usize = 256;

/// A physical item in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemDatum {
    /// Stable identifier; doubles as the store key.
    pub item_id: u64,
    /// Title, at most 50 bytes.
    pub title: String,
    /// Author, at most 30 bytes.
    pub author: String,
    /// Whether the item is available for checkout.
    pub enabled: bool,
    /// Number of copies currently available.
    pub copies_available: u32,
    /// Whether the item has been reported lost.
    pub lost: bool,
    /// Shelf location, at most 256 bytes.
    pub location: String,
}

impl ItemDatum {
    /// Serialized size of the entry section.
    pub const SIZE: usize = 8 // item_id
        + TITLE_WIDTH
        + AUTHOR_WIDTH
        + 1 // enabled
        + 4 // copies_available
        + 1 // lost
        + LOCATION_WIDTH;
}

/// Codec for [`ItemDatum`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCodec;

impl RecordCodec for ItemCodec {
    type Entry = ItemDatum;

    fn entry_size(&self) -> usize {
        ItemDatum::SIZE
    }

    fn encode_entry(&self, entry: &ItemDatum, buf: &mut BytesMut) -> CodecResult<()> {
        buf.put_u64(entry.item_id);
        fields::put_fixed_str(buf, &entry.title, TITLE_WIDTH);
        fields::put_fixed_str(buf, &entry.author, AUTHOR_WIDTH);
        fields::put_bool(buf, entry.enabled);
        buf.put_u32(entry.copies_available);
        fields::put_bool(buf, entry.lost);
        fields::put_fixed_str(buf, &entry.location, LOCATION_WIDTH);
        Ok(())
    }

    fn decode_entry(&self, buf: &mut &[u8]) -> CodecResult<ItemDatum> {
        let item_id = buf.get_u64();
        let title = fields::get_fixed_str(buf, TITLE_WIDTH)?;
        let author = fields::get_fixed_str(buf, AUTHOR_WIDTH)?;
        let enabled = fields::get_bool(buf);
        let copies_available = buf.get_u32();
        let lost = fields::get_bool(buf);
        let location = fields::get_fixed_str(buf, LOCATION_WIDTH)?;

        Ok(ItemDatum {
            item_id,
            title,
            author,
            enabled,
            copies_available,
            lost,
            location,
        })
    }
}
