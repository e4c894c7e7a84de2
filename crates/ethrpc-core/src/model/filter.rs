use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::{decode_value, Address, AddressCodec, Codec, Hash32, Hash32Codec};
use crate::error::{CoreError, FormatError};

use super::{from_value, BlockTag, Log};

/// Log filter options for `eth_newFilter` and `eth_getLogs`.
///
/// Each topic position is either a wildcard (`None`), a single hash, or a
/// list of alternatives any of which may match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub from_block: Option<BlockTag>,
    pub to_block: Option<BlockTag>,
    pub block_hash: Option<Hash32>,
    pub address: Vec<Address>,
    pub topics: Vec<Option<Vec<Hash32>>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_block(mut self, tag: impl Into<BlockTag>) -> Self {
        self.from_block = Some(tag.into());
        self
    }

    pub fn to_block(mut self, tag: impl Into<BlockTag>) -> Self {
        self.to_block = Some(tag.into());
        self
    }

    /// Restrict to one block; mutually exclusive with a block range on the
    /// node side.
    pub fn block_hash(mut self, hash: Hash32) -> Self {
        self.block_hash = Some(hash);
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address.push(address);
        self
    }

    /// Append a topic position. An empty list is a wildcard.
    pub fn topic(mut self, alternatives: Vec<Hash32>) -> Self {
        self.topics.push(if alternatives.is_empty() {
            None
        } else {
            Some(alternatives)
        });
        self
    }

    pub fn to_params(&self) -> Value {
        let mut obj = Map::new();
        if let Some(from) = &self.from_block {
            obj.insert("fromBlock".into(), from.to_param());
        }
        if let Some(to) = &self.to_block {
            obj.insert("toBlock".into(), to.to_param());
        }
        if let Some(hash) = &self.block_hash {
            obj.insert("blockHash".into(), Hash32Codec.encode(hash).into());
        }
        match self.address.as_slice() {
            [] => {}
            [single] => {
                obj.insert("address".into(), AddressCodec.encode(single).into());
            }
            many => {
                let list = many.iter().map(|a| Value::from(AddressCodec.encode(a)));
                obj.insert("address".into(), Value::Array(list.collect()));
            }
        }
        if !self.topics.is_empty() {
            let topics = self.topics.iter().map(|position| match position.as_deref() {
                None | Some([]) => Value::Null,
                Some([single]) => Hash32Codec.encode(single).into(),
                Some(many) => Value::Array(
                    many.iter()
                        .map(|h| Value::from(Hash32Codec.encode(h)))
                        .collect(),
                ),
            });
            obj.insert("topics".into(), Value::Array(topics.collect()));
        }
        Value::Object(obj)
    }
}

/// One element of an `eth_getFilterChanges` result.
///
/// Block and pending-transaction filters yield hashes; log filters yield
/// log objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterChange {
    Hash(Hash32),
    Log(Log),
}

impl FilterChange {
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::String(_) => Ok(Self::Hash(decode_value(&Hash32Codec, &value)?)),
            Value::Object(_) => Ok(Self::Log(from_value(value)?)),
            other => Err(FormatError::new(
                "filter change",
                other.to_string(),
                "expected a hash string or log object",
            )
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn empty_filter_is_empty_object() {
        assert_eq!(Filter::new().to_params(), json!({}));
    }

    #[test]
    fn range_and_single_address() {
        let params = Filter::new()
            .from_block(1u64)
            .to_block(BlockTag::Latest)
            .address(addr(0x11))
            .to_params();
        assert_eq!(
            params,
            json!({
                "fromBlock": "0x1",
                "toBlock": "latest",
                "address": format!("0x{}", "11".repeat(20)),
            })
        );
    }

    #[test]
    fn multiple_addresses_and_topic_alternatives() {
        let a = Hash32::new([0xaa; 32]);
        let b = Hash32::new([0xbb; 32]);
        let params = Filter::new()
            .address(addr(0x01))
            .address(addr(0x02))
            .topic(vec![a])
            .topic(vec![])
            .topic(vec![a, b])
            .to_params();
        assert_eq!(params["address"].as_array().map(Vec::len), Some(2));
        assert_eq!(
            params["topics"],
            json!([a.to_string(), null, [a.to_string(), b.to_string()]])
        );
    }

    #[test]
    fn filter_change_dispatches_on_shape() {
        let hash = FilterChange::from_value(json!(format!("0x{}", "ab".repeat(32))))
            .expect("hash change");
        assert_eq!(hash, FilterChange::Hash(Hash32::new([0xab; 32])));

        let log = FilterChange::from_value(json!({"logIndex": "0x2", "topics": []}))
            .expect("log change");
        assert!(matches!(log, FilterChange::Log(Log { log_index: Some(2), .. })));

        assert!(FilterChange::from_value(json!(7)).is_err());
    }
}
