//! Wire codecs: bidirectional transforms between JSON-RPC hex strings and
//! typed values.
//!
//! Every codec is a stateless unit struct implementing [`Codec`]. Prefix
//! handling is centralized in [`strip_prefix`] / [`with_prefix`]; codecs
//! never slice `0x` themselves.

mod address;
mod bytes;
mod hash;
mod quantity;

pub use address::{Address, AddressCodec, ChecksumAddressCodec, HexAddress, HexAddressCodec};
pub use bytes::{Bytes, HexStringCodec, SignatureCodec};
pub use hash::{BlockIdentifierCodec, Hash32, Hash32Codec};
pub use quantity::{
    BlockNumberCodec, GweiCodec, IntegerCodec, Timestamp, TimestampCodec, Uint256Codec,
};

use crate::error::FormatError;

pub const HEX_PREFIX: &str = "0x";

/// A pure decode/encode pair between a wire string and `Self::Value`.
///
/// `decode` rejects malformed input with a [`FormatError`]. `encode` is
/// total: value types validate on construction, so any value can be
/// written back, and `decode(encode(v)) == v`.
pub trait Codec: Send + Sync + 'static {
    type Value;

    /// Human-readable type name used in error messages.
    const NAME: &'static str;

    fn decode(&self, wire: &str) -> Result<Self::Value, FormatError>;

    fn encode(&self, value: &Self::Value) -> String;
}

/// Remove one leading `0x`, if present.
pub fn strip_prefix(input: &str) -> &str {
    input.strip_prefix(HEX_PREFIX).unwrap_or(input)
}

/// Ensure exactly one leading `0x`.
pub fn with_prefix(input: &str) -> String {
    if input.starts_with(HEX_PREFIX) {
        input.to_owned()
    } else {
        format!("{HEX_PREFIX}{input}")
    }
}

/// Decode a JSON value through `codec`; the value must be a string.
pub fn decode_value<C: Codec>(
    codec: &C,
    value: &serde_json::Value,
) -> Result<C::Value, FormatError> {
    match value.as_str() {
        Some(wire) => codec.decode(wire),
        None => Err(FormatError::new(
            C::NAME,
            value.to_string(),
            "expected a JSON string",
        )),
    }
}

/// True when every character of `digits` is a hex digit.
pub(crate) fn is_hex(digits: &str) -> bool {
    digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Decode unprefixed hex digits into bytes, reporting failures against
/// `type_name` and the original `input`.
pub(crate) fn decode_hex_digits(
    type_name: &'static str,
    input: &str,
    digits: &str,
) -> Result<Vec<u8>, FormatError> {
    if digits.len() % 2 != 0 {
        return Err(FormatError::new(
            type_name,
            input,
            format!("odd number of hex digits ({})", digits.len()),
        ));
    }
    hex::decode(digits).map_err(|e| FormatError::new(type_name, input, e.to_string()))
}

/// Decode exactly `N` bytes from unprefixed hex digits.
pub(crate) fn decode_fixed<const N: usize>(
    type_name: &'static str,
    input: &str,
    digits: &str,
) -> Result<[u8; N], FormatError> {
    if digits.len() != N * 2 {
        return Err(FormatError::new(
            type_name,
            input,
            format!("expected {} hex digits, got {}", N * 2, digits.len()),
        ));
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| FormatError::new(type_name, input, e.to_string()))?;
    Ok(out)
}

/// Lowercase `0x`-prefixed hex of `bytes`.
pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    with_prefix(&hex::encode(bytes))
}
