//! Property tests for codec round-trips.

use proptest::prelude::*;
use shelfdb_codec::datum::{ContractCodec, ContractDatum, ItemCodec, ItemDatum};
use shelfdb_codec::{Record, RecordCodec, Timestamp};

// Decoded strings have trailing zero/whitespace trimmed, so generated
// fields avoid trailing whitespace and stay within their declared widths.
fn field(max: usize) -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[a-zA-Z0-9_-]{{0,{max}}}")).unwrap()
}

proptest! {
    #[test]
    fn item_record_roundtrip(
        key in any::<u32>(),
        item_id in any::<u64>(),
        title in field(50),
        author in field(30),
        enabled in any::<bool>(),
        copies in any::<u32>(),
        lost in any::<bool>(),
        location in field(256),
        secs in any::<i64>(),
        nanos in 0u32..1_000_000_000,
    ) {
        let item = ItemDatum {
            item_id,
            title,
            author,
            enabled,
            copies_available: copies,
            lost,
            location,
        };
        let record = Record::with_timestamp(key.to_string(), item, Timestamp::new(secs, nanos));

        let block = ItemCodec.encode(&record).unwrap();
        prop_assert_eq!(block.len(), ItemCodec.record_size());
        prop_assert_eq!(ItemCodec.decode(&block).unwrap(), record);
    }

    #[test]
    fn contract_record_roundtrip(
        key in any::<u32>(),
        contract_id in any::<u32>(),
        user_id in any::<u32>(),
        item_id in any::<u64>(),
        enabled in any::<bool>(),
    ) {
        let contract = ContractDatum { contract_id, user_id, item_id, enabled };
        let record = Record::new(key.to_string(), contract);

        let block = ContractCodec.encode(&record).unwrap();
        prop_assert_eq!(ContractCodec.decode(&block).unwrap(), record);
    }
}
