use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::amount::Gwei;
use crate::error::FormatError;

use super::{is_hex, strip_prefix, with_prefix, Codec};

fn quantity_digits<'a>(type_name: &'static str, wire: &'a str) -> Result<&'a str, FormatError> {
    let digits = strip_prefix(wire);
    if digits.is_empty() {
        return Err(FormatError::new(type_name, wire, "empty quantity"));
    }
    if !is_hex(digits) {
        return Err(FormatError::new(type_name, wire, "quantity is not hex"));
    }
    Ok(digits)
}

pub(crate) fn parse_u256(type_name: &'static str, wire: &str) -> Result<U256, FormatError> {
    let digits = quantity_digits(type_name, wire)?;
    U256::from_str_radix(digits, 16)
        .map_err(|_| FormatError::new(type_name, wire, "quantity exceeds 256 bits"))
}

pub(crate) fn encode_u256(value: U256) -> String {
    with_prefix(&format!("{value:x}"))
}

/// Hex quantity <-> `u64` (block numbers, gas, nonces, indices).
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl Codec for IntegerCodec {
    type Value = u64;
    const NAME: &'static str = "integer";

    fn decode(&self, wire: &str) -> Result<u64, FormatError> {
        let digits = quantity_digits(Self::NAME, wire)?;
        u64::from_str_radix(digits, 16)
            .map_err(|_| FormatError::new(Self::NAME, wire, "quantity exceeds 64 bits"))
    }

    fn encode(&self, value: &u64) -> String {
        with_prefix(&format!("{value:x}"))
    }
}

/// Block heights; same wire form as [`IntegerCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockNumberCodec;

impl Codec for BlockNumberCodec {
    type Value = u64;
    const NAME: &'static str = "block number";

    fn decode(&self, wire: &str) -> Result<u64, FormatError> {
        IntegerCodec.decode(wire)
    }

    fn encode(&self, value: &u64) -> String {
        IntegerCodec.encode(value)
    }
}

/// Hex quantity <-> [`U256`] (difficulty, filter ids, storage words).
#[derive(Debug, Clone, Copy, Default)]
pub struct Uint256Codec;

impl Codec for Uint256Codec {
    type Value = U256;
    const NAME: &'static str = "uint256";

    fn decode(&self, wire: &str) -> Result<U256, FormatError> {
        parse_u256(Self::NAME, wire)
    }

    fn encode(&self, value: &U256) -> String {
        encode_u256(*value)
    }
}

/// Seconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn to_system_time(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hex seconds <-> [`Timestamp`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl Codec for TimestampCodec {
    type Value = Timestamp;
    const NAME: &'static str = "timestamp";

    fn decode(&self, wire: &str) -> Result<Timestamp, FormatError> {
        IntegerCodec
            .decode(wire)
            .map(Timestamp)
            .map_err(|e| FormatError { type_name: Self::NAME, ..e })
    }

    fn encode(&self, value: &Timestamp) -> String {
        IntegerCodec.encode(&value.0)
    }
}

/// Hex wei quantity <-> [`Gwei`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GweiCodec;

impl Codec for GweiCodec {
    type Value = Gwei;
    const NAME: &'static str = "gwei";

    fn decode(&self, wire: &str) -> Result<Gwei, FormatError> {
        parse_u256(Self::NAME, wire).map(Gwei::from_wei_u256)
    }

    fn encode(&self, value: &Gwei) -> String {
        encode_u256(value.wei())
    }
}
