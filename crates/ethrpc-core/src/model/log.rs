use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::{Address, AddressCodec, Bytes, Hash32, Hash32Codec, HexStringCodec, IntegerCodec};

use super::{decode_bool, decode_list, FieldTable, Model};

/// An event log entry (`eth_getLogs`, `eth_getFilterLogs`, receipts).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// `true` when the log was dropped by a chain reorganization.
    pub removed: Option<bool>,
    pub log_index: Option<u64>,
    pub transaction_index: Option<u64>,
    pub transaction_hash: Option<Hash32>,
    pub block_hash: Option<Hash32>,
    pub block_number: Option<u64>,
    pub address: Option<Address>,
    pub data: Option<Bytes>,
    pub topics: Vec<Hash32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Log {
    /// The event signature hash, for non-anonymous events.
    pub fn event_signature(&self) -> Option<&Hash32> {
        self.topics.first()
    }
}

impl Model for Log {
    const NAME: &'static str = "log";

    fn build_field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .codec("logIndex", IntegerCodec, |l| &mut l.log_index)
            .codec("transactionIndex", IntegerCodec, |l| &mut l.transaction_index)
            .codec("transactionHash", Hash32Codec, |l| &mut l.transaction_hash)
            .codec("blockHash", Hash32Codec, |l| &mut l.block_hash)
            .codec("blockNumber", IntegerCodec, |l| &mut l.block_number)
            .codec("address", AddressCodec, |l| &mut l.address)
            .codec("data", HexStringCodec, |l| &mut l.data)
            .custom("topics", |l, v| {
                l.topics = decode_list(&Hash32Codec, v)?;
                Ok(())
            })
            .custom("removed", |l, v| {
                l.removed = Some(decode_bool(&v)?);
                Ok(())
            })
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: OnceLock<FieldTable<Log>> = OnceLock::new();
        TABLE.get_or_init(Self::build_field_table)
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}
