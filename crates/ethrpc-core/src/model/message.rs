use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::{
    Address, AddressCodec, Bytes, Hash32, Hash32Codec, HexStringCodec, IntegerCodec, Timestamp,
    TimestampCodec,
};

use super::{decode_list, FieldTable, Model};

/// A Whisper message from `shh_getMessages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub hash: Option<Hash32>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub expiry: Option<Timestamp>,
    /// Seconds the message should float in the system.
    pub ttl: Option<u64>,
    /// Unix time the message was sent.
    pub sent: Option<u64>,
    pub topics: Vec<Bytes>,
    pub payload: Option<Bytes>,
    pub work_proved: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Model for Message {
    const NAME: &'static str = "message";

    fn build_field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .codec("hash", Hash32Codec, |m| &mut m.hash)
            .codec("from", AddressCodec, |m| &mut m.from)
            .codec("to", AddressCodec, |m| &mut m.to)
            .codec("expiry", TimestampCodec, |m| &mut m.expiry)
            .codec("ttl", IntegerCodec, |m| &mut m.ttl)
            .codec("sent", IntegerCodec, |m| &mut m.sent)
            .codec("payload", HexStringCodec, |m| &mut m.payload)
            .codec("workProved", IntegerCodec, |m| &mut m.work_proved)
            .custom("topics", |m, v| {
                m.topics = decode_list(&HexStringCodec, v)?;
                Ok(())
            })
    }

    fn field_table() -> &'static FieldTable<Self> {
        static TABLE: OnceLock<FieldTable<Message>> = OnceLock::new();
        TABLE.get_or_init(Self::build_field_table)
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::from_value;
    use serde_json::json;

    #[test]
    fn decodes_whisper_message() {
        let msg: Message = from_value(json!({
            "hash": format!("0x{}", "33".repeat(32)),
            "from": "0x3ec052fc33a8a4b5a3a1e6a6b3f3b7f2a9a0c1d2",
            "to": null,
            "expiry": "0x54caa50a",
            "ttl": "0x64",
            "sent": "0x54ca9ea2",
            "topics": ["0x6578616d706c65"],
            "payload": "0x7b2274797065223a226d657373616765227d",
            "workProved": "0x0",
        }))
        .expect("message must construct");
        assert_eq!(msg.ttl, Some(100));
        assert_eq!(msg.to, None);
        assert_eq!(msg.expiry, Some(Timestamp(0x54caa50a)));
        assert_eq!(msg.topics.len(), 1);
        assert_eq!(msg.topics[0].to_string_lossy(), "example");
        assert_eq!(
            msg.payload.as_ref().map(Bytes::to_string_lossy).as_deref(),
            Some(r#"{"type":"message"}"#)
        );
    }

    #[test]
    fn topics_must_be_hex() {
        assert!(from_value::<Message>(json!({"topics": ["nothex"]})).is_err());
    }
}
