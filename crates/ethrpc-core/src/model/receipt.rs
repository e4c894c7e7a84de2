use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::amount::Gwei;
use crate::codec::{
    Address, AddressCodec, Bytes, GweiCodec, Hash32, Hash32Codec, HexStringCodec, IntegerCodec,
};

use super::{decode_records, FieldTable, Log, Model};

/// Result of `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: Option<Hash32>,
    pub transaction_index: Option<u64>,
    pub block_hash: Option<Hash32>,
    pub block_number: Option<u64>,
    pub from: Option<Address>,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub cumulative_gas_used: Option<u64>,
    pub gas_used: Option<u64>,
    pub effective_gas_price: Option<Gwei>,
    /// Set only when the transaction created a contract.
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
    pub logs_bloom: Option<Bytes>,
    /// `1` on success, `0` on failure (post-Byzantium).
    pub status: Option<u64>,
    /// Intermediate state root (pre-Byzantium).
    pub root: Option<Hash32>,
    #[serde(rename = "type")]
    pub transaction_type: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> Option<bool> {
        self.status.map(|s| s == 1)
    }

    /// `gasUsed * effectiveGasPrice`, when both are known.
    pub fn fee(&self) -> Option<Gwei> {
        let gas_used = self.gas_used?;
        let price = self.effective_gas_price?;
        price
            .wei()
            .checked_mul(ethnum::U256::from(gas_used))
            .map(Gwei::from_wei_u256)
    }
}

impl Model for TransactionReceipt {
    const NAME: &'static str = "transaction receipt";

    fn build_field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .codec("transactionHash", Hash32Codec, |r| &mut r.transaction_hash)
            .codec("transactionIndex", IntegerCodec, |r| &mut r.transaction_index)
            .codec("blockHash", Hash32Codec, |r| &mut r.block_hash)
            .codec("blockNumber", IntegerCodec, |r| &mut r.block_number)
            .codec("from", AddressCodec, |r| &mut r.from)
            .codec("to", AddressCodec, |r| &mut r.to)
            .codec("cumulativeGasUsed", IntegerCodec, |r| &mut r.cumulative_gas_used)
            .codec("gasUsed", IntegerCodec, |r| &mut r.gas_used)
            .codec("effectiveGasPrice", GweiCodec, |r| &mut r.effective_gas_price)
            .codec("contractAddress", AddressCodec, |r| &mut r.contract_address)
            .codec("logsBloom", HexStringCodec, |r| &mut r.logs_bloom)
            .codec("status", IntegerCodec, |r| &mut r.status)
            .codec("root", Hash32Codec, |r| &mut r.root)
            .codec("type", IntegerCodec, |r| &mut r.transaction_type)
            .custom("logs", |r, v| {
                r.logs = decode_records(v)?;
                Ok(())
            })
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: OnceLock<FieldTable<TransactionReceipt>> = OnceLock::new();
        TABLE.get_or_init(Self::build_field_table)
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}
