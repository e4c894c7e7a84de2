//! Domain records and the field mapper that builds them from raw JSON.
//!
//! A record type implements [`Model`] by describing its wire fields in a
//! [`FieldTable`]: each wire key maps either to a codec (the common case)
//! or to a custom transform (arrays and nested records). [`construct`]
//! walks the raw object once and dispatches every key through that table.
//! Keys the table does not know are kept verbatim in the record's `extra`
//! map, since nodes routinely return fields a client does not model.

mod block;
mod filter;
mod log;
mod message;
mod receipt;
mod sync_status;
mod tag;
mod transaction;

pub use block::{Block, TransactionEntry};
pub use filter::{Filter, FilterChange};
pub use log::Log;
pub use message::Message;
pub use receipt::TransactionReceipt;
pub use sync_status::SyncStatus;
pub use tag::BlockTag;
pub use transaction::{Transaction, TransactionRequest};

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::codec::{decode_value, Codec};
use crate::error::{CoreError, FormatError};

/// Decodes one wire value into a field of `M`.
pub type FieldDecoder<M> = Box<dyn Fn(&mut M, Value) -> Result<(), CoreError> + Send + Sync>;

/// Per-type table of wire key -> decode function.
///
/// Custom transforms take precedence over codec entries registered under
/// the same key.
pub struct FieldTable<M> {
    custom: HashMap<&'static str, FieldDecoder<M>>,
    codecs: HashMap<&'static str, FieldDecoder<M>>,
}

impl<M: 'static> FieldTable<M> {
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            codecs: HashMap::new(),
        }
    }

    /// Decode `key` through `codec` into the `Option` returned by `slot`.
    pub fn codec<C: Codec>(
        mut self,
        key: &'static str,
        codec: C,
        slot: fn(&mut M) -> &mut Option<C::Value>,
    ) -> Self {
        self.codecs.insert(
            key,
            Box::new(move |model: &mut M, value: Value| {
                *slot(model) = Some(decode_value(&codec, &value)?);
                Ok(())
            }),
        );
        self
    }

    /// Decode `key` with a hand-written transform.
    pub fn custom<F>(mut self, key: &'static str, transform: F) -> Self
    where
        F: Fn(&mut M, Value) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        self.custom.insert(key, Box::new(transform));
        self
    }

    pub fn decoder_for(&self, key: &str) -> Option<&FieldDecoder<M>> {
        self.custom.get(key).or_else(|| self.codecs.get(key))
    }

    pub fn is_custom(&self, key: &str) -> bool {
        self.custom.contains_key(key)
    }

    pub fn knows(&self, key: &str) -> bool {
        self.decoder_for(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.custom.len() + self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: 'static> Default for FieldTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for FieldTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut custom: Vec<_> = self.custom.keys().collect();
        let mut codecs: Vec<_> = self.codecs.keys().collect();
        custom.sort();
        codecs.sort();
        f.debug_struct("FieldTable")
            .field("custom", &custom)
            .field("codecs", &codecs)
            .finish()
    }
}

/// A record decodable from a JSON-RPC result object.
///
/// `field_table` must return the same table on every call; implementors
/// cache `build_field_table()` in a `OnceLock` so the table is built
/// exactly once per process even under concurrent first use.
pub trait Model: Default + Send + Sync + Sized + 'static {
    const NAME: &'static str;

    fn build_field_table() -> FieldTable<Self>;

    fn field_table() -> &'static FieldTable<Self>;

    /// Storage for wire keys the table does not know.
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

/// Build `M` from a raw key -> value mapping.
///
/// JSON `null` on a known key leaves the field unset without consulting
/// the codec, which is how pending blocks and transactions report their
/// missing `hash`, `number` and `blockHash`.
pub fn construct<M: Model>(raw: Map<String, Value>) -> Result<M, CoreError> {
    let table = M::field_table();
    let mut model = M::default();

    for (key, value) in raw {
        match table.decoder_for(&key) {
            Some(_) if value.is_null() => {}
            Some(decode) => {
                decode(&mut model, value).map_err(|source| CoreError::InvalidField {
                    model: M::NAME,
                    field: key.clone(),
                    source: Box::new(source),
                })?;
            }
            None => {
                model.extra_mut().insert(key, value);
            }
        }
    }

    Ok(model)
}

/// Build `M` from a JSON value that must be an object.
pub fn from_value<M: Model>(value: Value) -> Result<M, CoreError> {
    match value {
        Value::Object(raw) => construct(raw),
        other => Err(FormatError::new(M::NAME, other.to_string(), "expected a JSON object").into()),
    }
}

// ==============================================================================
// Transform Helpers
// ==============================================================================

fn expect_array(type_name: &'static str, value: Value) -> Result<Vec<Value>, FormatError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(FormatError::new(type_name, other.to_string(), "expected a JSON array")),
    }
}

/// Decode every element of a JSON array through `codec`.
pub(crate) fn decode_list<C: Codec>(codec: &C, value: Value) -> Result<Vec<C::Value>, CoreError> {
    expect_array(C::NAME, value)?
        .iter()
        .map(|item| decode_value(codec, item).map_err(CoreError::from))
        .collect()
}

/// Decode every element of a JSON array as a nested record.
pub(crate) fn decode_records<M: Model>(value: Value) -> Result<Vec<M>, CoreError> {
    expect_array(M::NAME, value)?
        .into_iter()
        .map(from_value::<M>)
        .collect()
}

pub(crate) fn decode_bool(value: &Value) -> Result<bool, CoreError> {
    value
        .as_bool()
        .ok_or_else(|| FormatError::new("bool", value.to_string(), "expected a JSON boolean").into())
}
