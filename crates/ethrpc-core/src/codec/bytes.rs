use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormatError;

use super::{decode_hex_digits, encode_hex, strip_prefix, Codec};

/// Arbitrary-length byte string (`extraData`, call data, log data, bloom).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Lossy UTF-8 view, for payloads that carry text.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl Deref for Bytes {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes({self})")
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        HexStringCodec.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// `0x` + even-length hex <-> [`Bytes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HexStringCodec;

impl Codec for HexStringCodec {
    type Value = Bytes;
    const NAME: &'static str = "hex string";

    fn decode(&self, wire: &str) -> Result<Bytes, FormatError> {
        decode_hex_digits(Self::NAME, wire, strip_prefix(wire)).map(Bytes)
    }

    fn encode(&self, value: &Bytes) -> String {
        encode_hex(&value.0)
    }
}

/// Length in hex digits of a signature component (`r`, `s`).
const SIGNATURE_DIGITS: usize = 64;

/// `0x` + 64 hex digits <-> 32 signature bytes.
///
/// Nodes emit `r`/`s` as quantities, so leading zero nibbles are dropped
/// (63 digits for one nibble, fewer for more). Anything up to 64 digits is
/// left-padded with `0` to the full 32 bytes; longer input is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureCodec;

impl Codec for SignatureCodec {
    type Value = Bytes;
    const NAME: &'static str = "signature";

    fn decode(&self, wire: &str) -> Result<Bytes, FormatError> {
        let digits = strip_prefix(wire);
        if digits.len() > SIGNATURE_DIGITS {
            return Err(FormatError::new(
                Self::NAME,
                wire,
                format!(
                    "expected at most {SIGNATURE_DIGITS} hex digits, got {}",
                    digits.len()
                ),
            ));
        }
        let digits = format!("{digits:0>SIGNATURE_DIGITS$}");
        decode_hex_digits(Self::NAME, wire, &digits).map(Bytes)
    }

    fn encode(&self, value: &Bytes) -> String {
        encode_hex(&value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_string_decodes_raw_bytes() {
        let bytes = HexStringCodec.decode("0x74657374").expect("must decode");
        assert_eq!(bytes.to_string_lossy(), "test");
        assert_eq!(HexStringCodec.encode(&bytes), "0x74657374");
    }

    #[test]
    fn hex_string_accepts_empty() {
        let bytes = HexStringCodec.decode("0x").expect("empty data is valid");
        assert!(bytes.is_empty());
        assert_eq!(HexStringCodec.encode(&bytes), "0x");
    }

    #[test]
    fn hex_string_requires_even_length() {
        assert!(HexStringCodec.decode("0x746").is_err());
    }

    #[test]
    fn hex_string_rejects_non_hex() {
        assert!(HexStringCodec.decode("0xzz").is_err());
    }

    #[test]
    fn signature_accepts_full_width() {
        let wire = format!("0x{}", "ab".repeat(32));
        let sig = SignatureCodec.decode(&wire).expect("64 digits must decode");
        assert_eq!(sig.len(), 32);
        assert_eq!(SignatureCodec.encode(&sig), wire);
    }

    #[test]
    fn signature_pads_63_digits_on_the_left() {
        let wire = format!("0x{}", "f".repeat(63));
        let sig = SignatureCodec.decode(&wire).expect("63 digits must be repaired");
        assert_eq!(sig.len(), 32);
        assert_eq!(sig[0], 0x0f);
        assert_eq!(sig[31], 0xff);
    }

    #[test]
    fn signature_pads_shorter_quantities() {
        let wire = format!("0x{}", "1b".repeat(31));
        let sig = SignatureCodec.decode(&wire).expect("62 digits must be padded");
        assert_eq!(sig.len(), 32);
        assert_eq!(sig[0], 0x00);
        assert_eq!(sig[1], 0x1b);
        assert_eq!(SignatureCodec.encode(&sig), format!("0x00{}", "1b".repeat(31)));

        let small = SignatureCodec.decode("0x1").expect("one digit must be padded");
        assert_eq!(small[31], 0x01);
        assert!(small[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn signature_rejects_overlong_or_non_hex() {
        assert!(SignatureCodec.decode(&format!("0x{}", "f".repeat(65))).is_err());
        assert!(SignatureCodec.decode(&format!("0x{}", "zz".repeat(32))).is_err());
    }
}
