use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::amount::Gwei;
use crate::codec::{
    Address, AddressCodec, Bytes, Codec, GweiCodec, Hash32, Hash32Codec, HexStringCodec,
    IntegerCodec, SignatureCodec,
};

use super::{FieldTable, Model};

/// A transaction as returned by `eth_getTransactionBy*` and full blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: Option<Hash32>,
    pub nonce: Option<u64>,
    /// `None` while the transaction is pending.
    pub block_hash: Option<Hash32>,
    /// `None` while the transaction is pending.
    pub block_number: Option<u64>,
    /// `None` while the transaction is pending.
    pub transaction_index: Option<u64>,
    pub from: Option<Address>,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: Option<Gwei>,
    pub gas: Option<u64>,
    pub gas_price: Option<Gwei>,
    pub max_fee_per_gas: Option<Gwei>,
    pub max_priority_fee_per_gas: Option<Gwei>,
    pub input: Option<Bytes>,
    pub v: Option<u64>,
    pub r: Option<Bytes>,
    pub s: Option<Bytes>,
    pub chain_id: Option<u64>,
    #[serde(rename = "type")]
    pub transaction_type: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.block_hash.is_none()
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

impl Model for Transaction {
    const NAME: &'static str = "transaction";

    fn build_field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .codec("hash", Hash32Codec, |t| &mut t.hash)
            .codec("nonce", IntegerCodec, |t| &mut t.nonce)
            .codec("blockHash", Hash32Codec, |t| &mut t.block_hash)
            .codec("blockNumber", IntegerCodec, |t| &mut t.block_number)
            .codec("transactionIndex", IntegerCodec, |t| &mut t.transaction_index)
            .codec("from", AddressCodec, |t| &mut t.from)
            .codec("to", AddressCodec, |t| &mut t.to)
            .codec("value", GweiCodec, |t| &mut t.value)
            .codec("gas", IntegerCodec, |t| &mut t.gas)
            .codec("gasPrice", GweiCodec, |t| &mut t.gas_price)
            .codec("maxFeePerGas", GweiCodec, |t| &mut t.max_fee_per_gas)
            .codec("maxPriorityFeePerGas", GweiCodec, |t| {
                &mut t.max_priority_fee_per_gas
            })
            .codec("input", HexStringCodec, |t| &mut t.input)
            .codec("v", IntegerCodec, |t| &mut t.v)
            .codec("r", SignatureCodec, |t| &mut t.r)
            .codec("s", SignatureCodec, |t| &mut t.s)
            .codec("chainId", IntegerCodec, |t| &mut t.chain_id)
            .codec("type", IntegerCodec, |t| &mut t.transaction_type)
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: OnceLock<FieldTable<Transaction>> = OnceLock::new();
        TABLE.get_or_init(Self::build_field_table)
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

// ==============================================================================
// Outbound Transaction Object
// ==============================================================================

/// Transaction object for `eth_sendTransaction`, `eth_call` and
/// `eth_estimateGas`. Unset fields are omitted from the wire object so the
/// node applies its own defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<Gwei>,
    pub value: Option<Gwei>,
    pub data: Option<Bytes>,
    pub nonce: Option<u64>,
}

impl TransactionRequest {
    pub fn new(from: Address) -> Self {
        Self {
            from,
            to: None,
            gas: None,
            gas_price: None,
            value: None,
            data: None,
            nonce: None,
        }
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    pub fn gas_price(mut self, gas_price: Gwei) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn value(mut self, value: Gwei) -> Self {
        self.value = Some(value);
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Wire object with every quantity hex-encoded.
    pub fn to_params(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("from".into(), AddressCodec.encode(&self.from).into());
        if let Some(to) = &self.to {
            obj.insert("to".into(), AddressCodec.encode(to).into());
        }
        if let Some(gas) = &self.gas {
            obj.insert("gas".into(), IntegerCodec.encode(gas).into());
        }
        if let Some(gas_price) = &self.gas_price {
            obj.insert("gasPrice".into(), GweiCodec.encode(gas_price).into());
        }
        if let Some(value) = &self.value {
            obj.insert("value".into(), GweiCodec.encode(value).into());
        }
        if let Some(data) = &self.data {
            obj.insert("data".into(), HexStringCodec.encode(data).into());
        }
        if let Some(nonce) = &self.nonce {
            obj.insert("nonce".into(), IntegerCodec.encode(nonce).into());
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::construct;
    use serde_json::json;

    fn raw_transaction() -> Value {
        json!({
            "blockHash": "0x1d59ff54b1eb26b013ce3cb5fc9dab3705b415a67127a003c3e61eb445bb8df2",
            "blockNumber": "0x5daf3b",
            "from": "0xa7d9ddbe1f17865597fbd27ec712455208b6b76d",
            "gas": "0xc350",
            "gasPrice": "0x4a817c800",
            "hash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "input": "0x68656c6c6f21",
            "nonce": "0x15",
            "to": "0xf02c1c8e6114b1dbe8937a39260b5b0a374432bb",
            "transactionIndex": "0x41",
            "value": "0xf3dbb76162000",
            "v": "0x25",
            "r": "0x1b5e176d927f8e9ab405058b2d2457392da3e20f328b16ddabcebc33eaac5fea",
            "s": "0x4ba69724e8f69de52f0125ad8b3c5c2cef33019bac3249e2c0a2192766d1721c",
        })
    }

    fn transaction(value: Value) -> Transaction {
        construct(value.as_object().cloned().expect("object")).expect("transaction must construct")
    }

    #[test]
    fn decodes_mined_transaction() {
        let tx = transaction(raw_transaction());
        assert_eq!(tx.block_number, Some(6_139_707));
        assert_eq!(tx.gas, Some(50_000));
        assert_eq!(tx.gas_price.map(|g| g.value()).as_deref(), Some("20"));
        assert_eq!(tx.value.map(|v| v.to_eth()).as_deref(), Some("0.00429"));
        assert_eq!(tx.nonce, Some(21));
        assert_eq!(tx.transaction_index, Some(65));
        assert_eq!(tx.v, Some(37));
        assert_eq!(tx.r.as_ref().map(|r| r.len()), Some(32));
        assert_eq!(tx.input.as_ref().map(Bytes::to_string_lossy).as_deref(), Some("hello!"));
        assert!(!tx.is_pending());
        assert!(!tx.is_contract_creation());
    }

    #[test]
    fn pending_transaction_has_no_block() {
        let mut raw = raw_transaction();
        raw["blockHash"] = Value::Null;
        raw["blockNumber"] = Value::Null;
        raw["transactionIndex"] = Value::Null;
        let tx = transaction(raw);
        assert_eq!(tx.block_hash, None);
        assert_eq!(tx.block_number, None);
        assert!(tx.is_pending());
    }

    #[test]
    fn contract_creation_has_no_recipient() {
        let mut raw = raw_transaction();
        raw["to"] = Value::Null;
        assert!(transaction(raw).is_contract_creation());
    }

    #[test]
    fn short_signature_component_is_padded() {
        let mut raw = raw_transaction();
        raw["s"] = json!(format!("0x{}", "a".repeat(63)));
        let tx = transaction(raw);
        assert_eq!(tx.s.as_ref().map(|s| s[0]), Some(0x0a));
    }

    #[test]
    fn signature_component_missing_a_whole_byte_decodes() {
        let mut raw = raw_transaction();
        raw["r"] = json!(format!("0x{}", "1b".repeat(31)));
        let tx = transaction(raw);
        let r = tx.r.expect("r must be set");
        assert_eq!(r.len(), 32);
        assert_eq!(r[0], 0x00);
        assert_eq!(r[31], 0x1b);
    }

    #[test]
    fn dynamic_fee_fields() {
        let mut raw = raw_transaction();
        raw["type"] = json!("0x2");
        raw["chainId"] = json!("0x1");
        raw["maxFeePerGas"] = json!("0x77359400");
        raw["maxPriorityFeePerGas"] = json!("0x3b9aca00");
        let tx = transaction(raw);
        assert_eq!(tx.transaction_type, Some(2));
        assert_eq!(tx.chain_id, Some(1));
        assert_eq!(tx.max_fee_per_gas.map(|g| g.value()).as_deref(), Some("2"));
        assert_eq!(tx.max_priority_fee_per_gas.map(|g| g.value()).as_deref(), Some("1"));
    }

    #[test]
    fn request_omits_unset_fields() {
        let from: Address = "0xb60e8dd61c5d32be8058bb8eb970870f07233155".parse().unwrap();
        let params = TransactionRequest::new(from).to_params();
        assert_eq!(params, json!({"from": "0xb60e8dd61c5d32be8058bb8eb970870f07233155"}));
    }

    #[test]
    fn request_encodes_quantities_as_hex() {
        let from: Address = "0xb60e8dd61c5d32be8058bb8eb970870f07233155".parse().unwrap();
        let to: Address = "0xd46e8dd67c5d32be8058bb8eb970870f07244567".parse().unwrap();
        let params = TransactionRequest::new(from)
            .to(to)
            .gas(30_400)
            .gas_price(Gwei::from_wei("10000000000000").unwrap())
            .value(Gwei::from_wei("2441406250").unwrap())
            .data(vec![0xd4, 0x6e])
            .nonce(0)
            .to_params();
        assert_eq!(
            params,
            json!({
                "from": "0xb60e8dd61c5d32be8058bb8eb970870f07233155",
                "to": "0xd46e8dd67c5d32be8058bb8eb970870f07244567",
                "gas": "0x76c0",
                "gasPrice": "0x9184e72a000",
                "value": "0x9184e72a",
                "data": "0xd46e",
                "nonce": "0x0",
            })
        );
    }
}
