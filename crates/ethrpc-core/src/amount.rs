//! Exact token amounts.
//!
//! [`Gwei`] stores an integer number of wei and renders it in any
//! denomination with exact decimal arithmetic. Ether amounts routinely
//! exceed 2^53 wei, so no conversion here ever touches floating point.

use std::fmt;
use std::str::FromStr;

use ethnum::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{Codec, GweiCodec};
use crate::error::{AmountError, FormatError};

/// Decimal places between wei and gwei.
pub const GWEI_DECIMALS: u32 = 9;
/// Decimal places between wei and ether.
pub const ETHER_DECIMALS: u32 = 18;

fn pow10(exp: u32) -> U256 {
    U256::new(10).pow(exp)
}

/// Parse a non-negative decimal string in a unit `decimals` places above
/// wei, returning the exact wei count.
fn parse_scaled(input: &str, decimals: u32) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(AmountError::InvalidDecimal(input.to_owned()));
    }

    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.len() > decimals as usize {
        return Err(AmountError::TooPrecise {
            input: input.to_owned(),
            max_decimals: decimals,
        });
    }

    let overflow = || AmountError::Overflow(input.to_owned());
    let int_value = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10).map_err(|_| overflow())?
    };
    let frac_value = if frac_part.is_empty() {
        U256::ZERO
    } else {
        let digits = U256::from_str_radix(frac_part, 10).map_err(|_| overflow())?;
        digits * pow10(decimals - frac_part.len() as u32)
    };

    int_value
        .checked_mul(pow10(decimals))
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(overflow)
}

/// Render `wei` in a unit `decimals` places above wei, trimming trailing
/// fractional zeros and a dangling decimal point.
fn format_scaled(wei: U256, decimals: u32) -> String {
    let unit = pow10(decimals);
    let int_part = wei / unit;
    let frac_part = wei % unit;
    if frac_part == U256::ZERO {
        return int_part.to_string();
    }
    let digits = frac_part.to_string();
    let padding = "0".repeat(decimals as usize - digits.len());
    format!("{int_part}.{padding}{}", digits.trim_end_matches('0'))
}

/// An exact amount, denominated in gwei for display.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Gwei {
    wei: U256,
}

impl Gwei {
    pub const ZERO: Self = Self { wei: U256::ZERO };

    /// From a gwei-denominated decimal string such as `"21.5"`.
    pub fn new(gwei: &str) -> Result<Self, AmountError> {
        parse_scaled(gwei, GWEI_DECIMALS).map(|wei| Self { wei })
    }

    /// From a wei-denominated integer string.
    pub fn from_wei(wei: &str) -> Result<Self, AmountError> {
        parse_scaled(wei, 0).map(|wei| Self { wei })
    }

    pub fn from_wei_u256(wei: U256) -> Self {
        Self { wei }
    }

    /// From a hex wei quantity as returned by the node (`"0x4563918244f40000"`).
    pub fn from_wei_hex(wei: &str) -> Result<Self, FormatError> {
        GweiCodec.decode(wei)
    }

    pub fn from_eth(eth: &str) -> Result<Self, AmountError> {
        parse_scaled(eth, ETHER_DECIMALS).map(|wei| Self { wei })
    }

    pub fn wei(&self) -> U256 {
        self.wei
    }

    /// Amount in gwei, normalized.
    pub fn value(&self) -> String {
        format_scaled(self.wei, GWEI_DECIMALS)
    }

    pub fn to_wei(&self) -> String {
        self.wei.to_string()
    }

    pub fn to_eth(&self) -> String {
        format_scaled(self.wei, ETHER_DECIMALS)
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.wei.checked_add(other.wei).map(Self::from_wei_u256)
    }

    pub fn eth_to_gwei(eth: &str) -> Result<String, AmountError> {
        Self::from_eth(eth).map(|g| g.value())
    }

    pub fn gwei_to_eth(gwei: &str) -> Result<String, AmountError> {
        Self::new(gwei).map(|g| g.to_eth())
    }

    pub fn wei_to_gwei(wei: &str) -> Result<String, AmountError> {
        Self::from_wei(wei).map(|g| g.value())
    }

    pub fn gwei_to_wei(gwei: &str) -> Result<String, AmountError> {
        Self::new(gwei).map(|g| g.to_wei())
    }
}

impl fmt::Display for Gwei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}

impl fmt::Debug for Gwei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gwei({})", self.value())
    }
}

impl FromStr for Gwei {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Gwei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value())
    }
}

impl<'de> Deserialize<'de> for Gwei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}
