//! Checkout-contract variant and its fixed layout.

use crate::error::CodecResult;
use crate::fields;
use crate::RecordCodec;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// A checkout contract binding a user to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractDatum {
    /// Stable identifier; doubles as the store key.
    pub contract_id: u32,
    /// The borrowing user.
    pub user_id: u32,
    /// The borrowed item.
    pub item_id: u64,
    /// Whether the contract is currently in force.
    pub enabled: bool,
}

impl ContractDatum {
    /// Serialized size of the entry section.
    pub const SIZE: usize = 4 + 4 + 8 + 1;
}

/// Codec for [`ContractDatum`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractCodec;

impl RecordCodec for ContractCodec {
    type Entry = ContractDatum;

    fn entry_size(&self) -> usize {
        ContractDatum::SIZE
    }

    fn encode_entry(&self, entry: &ContractDatum, buf: &mut BytesMut) -> CodecResult<()> {
        buf.put_u32(entry.contract_id);
        buf.put_u32(entry.user_id);
        buf.put_u64(entry.item_id);
        fields::put_bool(buf, entry.enabled);
        Ok(())
    }

    fn decode_entry(&self, buf: &mut &[u8]) -> CodecResult<ContractDatum> {
        let contract_id = buf.get_u32();
        let user_id = buf.get_u32();
        let item_id = buf.get_u64();
        let enabled = fields::get_bool(buf);

        Ok(ContractDatum {
            contract_id,
            user_id,
            item_id,
            enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, Timestamp, RECORD_HEADER_SIZE};

    #[test]
    fn entry_size_matches_field_sum() {
        assert_eq!(ContractDatum::SIZE, 17);
        assert_eq!(ContractCodec.record_size(), RECORD_HEADER_SIZE + 17);
    }

    #[test]
    fn roundtrip() {
        let contract = ContractDatum {
            contract_id: 5,
            user_id: 17,
            item_id: 41,
            enabled: true,
        };
        let record = Record::with_timestamp("5", contract, Timestamp::new(1_700_000_000, 9));

        let block = ContractCodec.encode(&record).unwrap();
        assert_eq!(block.len(), 38);
        assert_eq!(ContractCodec.decode(&block).unwrap(), record);
    }
}
