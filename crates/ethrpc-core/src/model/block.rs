use std::sync::OnceLock;

use ethnum::U256;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::amount::Gwei;
use crate::codec::{
    decode_value, Address, AddressCodec, Bytes, GweiCodec, Hash32, Hash32Codec, HexStringCodec,
    IntegerCodec, Timestamp, TimestampCodec, Uint256Codec,
};
use crate::error::{CoreError, FormatError};

use super::{decode_list, expect_array, from_value, FieldTable, Model, Transaction};

/// One element of `Block.transactions`: a hash when the block was fetched
/// with `full = false`, the whole transaction otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransactionEntry {
    Hash(Hash32),
    Full(Box<Transaction>),
}

impl TransactionEntry {
    pub fn hash(&self) -> Option<Hash32> {
        match self {
            Self::Hash(hash) => Some(*hash),
            Self::Full(tx) => tx.hash,
        }
    }
}

fn decode_transaction_entry(value: Value) -> Result<TransactionEntry, CoreError> {
    match value {
        Value::Object(_) => Ok(TransactionEntry::Full(Box::new(from_value(value)?))),
        Value::String(_) => Ok(TransactionEntry::Hash(decode_value(&Hash32Codec, &value)?)),
        other => Err(FormatError::new(
            "transaction entry",
            other.to_string(),
            "expected a transaction object or hash string",
        )
        .into()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// `None` for a pending block.
    pub number: Option<u64>,
    /// `None` for a pending block.
    pub hash: Option<Hash32>,
    pub parent_hash: Option<Hash32>,
    pub nonce: Option<u64>,
    pub sha3_uncles: Option<Hash32>,
    pub logs_bloom: Option<Bytes>,
    pub transactions_root: Option<Hash32>,
    pub state_root: Option<Hash32>,
    pub receipts_root: Option<Hash32>,
    pub miner: Option<Address>,
    pub difficulty: Option<U256>,
    pub total_difficulty: Option<U256>,
    pub extra_data: Option<Bytes>,
    pub size: Option<u64>,
    pub gas_limit: Option<u64>,
    pub gas_used: Option<u64>,
    pub timestamp: Option<Timestamp>,
    pub base_fee_per_gas: Option<Gwei>,
    pub mix_hash: Option<Hash32>,
    pub transactions: Vec<TransactionEntry>,
    pub uncles: Vec<Hash32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn is_pending(&self) -> bool {
        self.hash.is_none()
    }

    pub fn transaction_hashes(&self) -> impl Iterator<Item = Hash32> + '_ {
        self.transactions.iter().filter_map(TransactionEntry::hash)
    }
}

impl Model for Block {
    const NAME: &'static str = "block";

    fn build_field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .codec("number", IntegerCodec, |b| &mut b.number)
            .codec("hash", Hash32Codec, |b| &mut b.hash)
            .codec("parentHash", Hash32Codec, |b| &mut b.parent_hash)
            .codec("nonce", IntegerCodec, |b| &mut b.nonce)
            .codec("sha3Uncles", Hash32Codec, |b| &mut b.sha3_uncles)
            .codec("logsBloom", HexStringCodec, |b| &mut b.logs_bloom)
            .codec("transactionsRoot", Hash32Codec, |b| &mut b.transactions_root)
            .codec("stateRoot", Hash32Codec, |b| &mut b.state_root)
            .codec("receiptsRoot", Hash32Codec, |b| &mut b.receipts_root)
            .codec("miner", AddressCodec, |b| &mut b.miner)
            .codec("difficulty", Uint256Codec, |b| &mut b.difficulty)
            .codec("totalDifficulty", Uint256Codec, |b| &mut b.total_difficulty)
            .codec("extraData", HexStringCodec, |b| &mut b.extra_data)
            .codec("size", IntegerCodec, |b| &mut b.size)
            .codec("gasLimit", IntegerCodec, |b| &mut b.gas_limit)
            .codec("gasUsed", IntegerCodec, |b| &mut b.gas_used)
            .codec("timestamp", TimestampCodec, |b| &mut b.timestamp)
            .codec("baseFeePerGas", GweiCodec, |b| &mut b.base_fee_per_gas)
            .codec("mixHash", Hash32Codec, |b| &mut b.mix_hash)
            .custom("transactions", |b, v| {
                b.transactions = expect_array("transactions", v)?
                    .into_iter()
                    .map(decode_transaction_entry)
                    .collect::<Result<_, _>>()?;
                Ok(())
            })
            .custom("uncles", |b, v| {
                b.uncles = decode_list(&Hash32Codec, v)?;
                Ok(())
            })
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: OnceLock<FieldTable<Block>> = OnceLock::new();
        TABLE.get_or_init(Self::build_field_table)
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}
