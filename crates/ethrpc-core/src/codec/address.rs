use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::checksum::{checksum_encode, is_checksum_address};
use crate::error::FormatError;

use super::{decode_fixed, encode_hex, strip_prefix, with_prefix, Codec};

pub const ADDRESS_LEN: usize = 20;

fn address_regex() -> &'static Regex {
    static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
    ADDRESS_RE.get_or_init(|| {
        Regex::new(r"^(0x)?[0-9a-fA-F]{40}$").expect("address regex is a valid static pattern")
    })
}

fn check_shape(type_name: &'static str, wire: &str) -> Result<(), FormatError> {
    if address_regex().is_match(wire) {
        Ok(())
    } else {
        Err(FormatError::new(
            type_name,
            wire,
            "expected 40 hex digits with optional 0x prefix",
        ))
    }
}

fn is_mixed_case(digits: &str) -> bool {
    digits.chars().any(|c| c.is_ascii_uppercase()) && digits.chars().any(|c| c.is_ascii_lowercase())
}

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Whether `input` is a well-formed address.
    ///
    /// All-lowercase and all-uppercase digits are accepted as-is; mixed
    /// case must carry a valid EIP-55 checksum.
    pub fn is_address(input: &str) -> bool {
        if !address_regex().is_match(input) {
            return false;
        }
        let digits = strip_prefix(input);
        !is_mixed_case(digits) || is_checksum_address(input)
    }

    /// EIP-55 mixed-case form.
    pub fn to_checksum(&self) -> String {
        ChecksumAddressCodec.encode(self)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&AddressCodec.encode(self))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressCodec.decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AddressCodec.decode(&s).map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// Codecs
// ==============================================================================

/// `0x` + 40 hex digits (any case) <-> [`Address`]; encodes lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressCodec;

impl Codec for AddressCodec {
    type Value = Address;
    const NAME: &'static str = "address";

    fn decode(&self, wire: &str) -> Result<Address, FormatError> {
        check_shape(Self::NAME, wire)?;
        decode_fixed::<ADDRESS_LEN>(Self::NAME, wire, strip_prefix(wire)).map(Address)
    }

    fn encode(&self, value: &Address) -> String {
        encode_hex(&value.0)
    }
}

/// EIP-55 address <-> [`Address`].
///
/// Mixed-case input must match its checksum; single-case input carries no
/// checksum and is accepted. Encoding always emits the checksummed form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumAddressCodec;

impl ChecksumAddressCodec {
    /// EIP-55 form of a 40-digit hex address; any other shape is rejected.
    pub fn checksum_encode(&self, address: &str) -> Result<String, FormatError> {
        check_shape(Self::NAME, address)?;
        checksum_encode(address)
    }
}

impl Codec for ChecksumAddressCodec {
    type Value = Address;
    const NAME: &'static str = "checksum address";

    fn decode(&self, wire: &str) -> Result<Address, FormatError> {
        check_shape(Self::NAME, wire)?;
        let digits = strip_prefix(wire);
        if is_mixed_case(digits) && !is_checksum_address(wire) {
            return Err(FormatError::new(Self::NAME, wire, "EIP-55 checksum mismatch"));
        }
        decode_fixed::<ADDRESS_LEN>(Self::NAME, wire, digits).map(Address)
    }

    fn encode(&self, value: &Address) -> String {
        // Lowercase hex of 20 bytes is always valid checksum input.
        checksum_encode(&hex::encode(value.0)).unwrap_or_else(|_| encode_hex(&value.0))
    }
}

/// A shape-checked, lowercase `0x` address string.
///
/// Unlike [`Address`] it keeps the wire text, for callers that only pass
/// addresses through.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexAddress(String);

impl HexAddress {
    pub fn new(address: &str) -> Result<Self, FormatError> {
        check_shape(HexAddressCodec::NAME, address)?;
        Ok(Self(with_prefix(&address.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Address> for HexAddress {
    fn from(address: Address) -> Self {
        Self(address.to_string())
    }
}

impl fmt::Display for HexAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for HexAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexAddress({})", self.0)
    }
}

impl FromStr for HexAddress {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for HexAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// `0x` + 40 hex digits (any case) <-> [`HexAddress`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressCodec;

impl Codec for HexAddressCodec {
    type Value = HexAddress;
    const NAME: &'static str = "hex address";

    fn decode(&self, wire: &str) -> Result<HexAddress, FormatError> {
        HexAddress::new(wire)
    }

    fn encode(&self, value: &HexAddress) -> String {
        value.0.clone()
    }
}
