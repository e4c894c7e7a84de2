use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::checksum::keccak256;
use crate::error::FormatError;

use super::{decode_fixed, encode_hex, is_hex, strip_prefix, Codec};

pub const HASH32_LEN: usize = 32;

/// A 32-byte hash (block hash, transaction hash, storage root, topic).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash32([u8; HASH32_LEN]);

impl Hash32 {
    pub const ZERO: Self = Self([0u8; HASH32_LEN]);

    pub const fn new(bytes: [u8; HASH32_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, FormatError> {
        let bytes: [u8; HASH32_LEN] = slice.try_into().map_err(|_| {
            FormatError::new(
                Hash32Codec::NAME,
                hex::encode(slice),
                format!("expected {HASH32_LEN} bytes, got {}", slice.len()),
            )
        })?;
        Ok(Self(bytes))
    }

    /// Keccak-256 of arbitrary data.
    pub fn digest(data: &[u8]) -> Self {
        Self(keccak256(data))
    }

    pub fn as_bytes(&self) -> &[u8; HASH32_LEN] {
        &self.0
    }
}

impl From<[u8; HASH32_LEN]> for Hash32 {
    fn from(bytes: [u8; HASH32_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Hash32Codec.encode(self))
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({self})")
    }
}

impl FromStr for Hash32 {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash32Codec.decode(s)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash32Codec.decode(&s).map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// Codec
// ==============================================================================

/// `0x` + 64 hex digits <-> [`Hash32`].
///
/// Input that is not hex at all is treated as a preimage and hashed with
/// Keccak-256, so `decode("Hello World!")` yields the hash of those bytes.
/// Input that *is* hex must have exactly 64 digits; it is never padded or
/// truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hash32Codec;

impl Codec for Hash32Codec {
    type Value = Hash32;
    const NAME: &'static str = "hash32";

    fn decode(&self, wire: &str) -> Result<Hash32, FormatError> {
        let digits = strip_prefix(wire);
        if !is_hex(digits) {
            return Ok(Hash32::digest(wire.as_bytes()));
        }
        decode_fixed::<HASH32_LEN>(Self::NAME, wire, digits).map(Hash32)
    }

    fn encode(&self, value: &Hash32) -> String {
        encode_hex(&value.0)
    }
}

/// Block identifiers are block hashes on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockIdentifierCodec;

impl Codec for BlockIdentifierCodec {
    type Value = Hash32;
    const NAME: &'static str = "block identifier";

    fn decode(&self, wire: &str) -> Result<Hash32, FormatError> {
        Hash32Codec.decode(wire)
    }

    fn encode(&self, value: &Hash32) -> String {
        Hash32Codec.encode(value)
    }
}
