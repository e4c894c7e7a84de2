use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::codec::{Codec, IntegerCodec, HEX_PREFIX};
use crate::error::FormatError;

/// Block selector for state queries: an explicit height or a named tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockTag {
    Number(u64),
    #[default]
    Latest,
    Earliest,
    Pending,
}

impl BlockTag {
    pub const LATEST: &'static str = "latest";
    pub const EARLIEST: &'static str = "earliest";
    pub const PENDING: &'static str = "pending";

    /// Wire form: `0x`-prefixed hex quantity or the tag name.
    pub fn encode(&self) -> String {
        match self {
            Self::Number(n) => IntegerCodec.encode(n),
            Self::Latest => Self::LATEST.to_owned(),
            Self::Earliest => Self::EARLIEST.to_owned(),
            Self::Pending => Self::PENDING.to_owned(),
        }
    }

    pub fn to_param(&self) -> Value {
        Value::String(self.encode())
    }
}

impl From<u64> for BlockTag {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for BlockTag {
    type Err = FormatError;

    /// Accepts a tag name, a `0x` hex quantity or a decimal height.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::LATEST => Ok(Self::Latest),
            Self::EARLIEST => Ok(Self::Earliest),
            Self::PENDING => Ok(Self::Pending),
            hex if hex.starts_with(HEX_PREFIX) => IntegerCodec.decode(hex).map(Self::Number),
            decimal => decimal.parse::<u64>().map(Self::Number).map_err(|_| {
                FormatError::new(
                    "block tag",
                    s,
                    "expected latest, earliest, pending or a block number",
                )
            }),
        }
    }
}

impl Serialize for BlockTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_encode_as_prefixed_hex() {
        assert_eq!(BlockTag::Number(436).encode(), "0x1b4");
        assert_eq!(BlockTag::from(0).encode(), "0x0");
    }

    #[test]
    fn names_encode_verbatim() {
        assert_eq!(BlockTag::Latest.to_param(), Value::String("latest".into()));
        assert_eq!(BlockTag::Earliest.encode(), "earliest");
        assert_eq!(BlockTag::Pending.encode(), "pending");
        assert_eq!(BlockTag::default(), BlockTag::Latest);
    }

    #[test]
    fn parses_names_hex_and_decimal() {
        assert_eq!("pending".parse::<BlockTag>().unwrap(), BlockTag::Pending);
        assert_eq!("0x1b4".parse::<BlockTag>().unwrap(), BlockTag::Number(436));
        assert_eq!("436".parse::<BlockTag>().unwrap(), BlockTag::Number(436));
        assert!("safe".parse::<BlockTag>().is_err());
        assert!("-1".parse::<BlockTag>().is_err());
    }
}
