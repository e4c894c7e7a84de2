//! EIP-55 mixed-case address checksums.
//!
//! The checksum is derived from the Keccak-256 hash of the lowercase hex
//! digits of the address (ASCII, without `0x`). A letter at character
//! index `i` is uppercased iff nibble `i` of that hash is >= 8; decimal
//! digits are never cased.

use sha3::{Digest, Keccak256};

use crate::codec::{strip_prefix, with_prefix};
use crate::error::FormatError;

const ADDRESS_DIGITS: usize = 40;

/// Keccak-256 of `data`.
#[inline]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a hex address (any case, prefix optional) with EIP-55 casing.
///
/// The result always carries exactly one `0x` prefix. The casing of the
/// input is ignored, so the function is idempotent.
pub fn checksum_encode(address: &str) -> Result<String, FormatError> {
    let digits = strip_prefix(address).to_ascii_lowercase();
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(FormatError::new(
            "checksum address",
            address,
            format!("unknown hex character `{bad}`"),
        ));
    }
    if digits.len() != ADDRESS_DIGITS {
        return Err(FormatError::new(
            "checksum address",
            address,
            format!("expected {ADDRESS_DIGITS} hex digits, got {}", digits.len()),
        ));
    }

    let hash = keccak256(digits.as_bytes());
    let encoded: String = digits
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if c.is_ascii_digit() {
                return c;
            }
            // Character index, not byte index: two nibbles per hash byte.
            let byte = hash.get(i / 2).copied().unwrap_or(0);
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect();

    Ok(with_prefix(&encoded))
}

/// True when `address` is exactly its own EIP-55 encoding.
pub fn is_checksum_address(address: &str) -> bool {
    match checksum_encode(address) {
        Ok(encoded) => strip_prefix(&encoded) == strip_prefix(address),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vectors from the EIP-55 specification.
    const VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn keccak256_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn eip55_vectors_encode_to_themselves() {
        for vector in VECTORS {
            let encoded = checksum_encode(vector).expect("vector must encode");
            assert_eq!(encoded, vector);
            assert!(is_checksum_address(vector));
        }
    }

    #[test]
    fn encoding_ignores_input_case_and_prefix() {
        let lower = "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
        let upper = "0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED";
        assert_eq!(checksum_encode(lower).unwrap(), VECTORS[0]);
        assert_eq!(checksum_encode(upper).unwrap(), VECTORS[0]);
    }

    #[test]
    fn encoding_is_idempotent() {
        let once = checksum_encode("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap();
        let twice = checksum_encode(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn wrong_casing_is_not_a_checksum_address() {
        assert!(!is_checksum_address("0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(!is_checksum_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = checksum_encode("0x12").expect_err("too short");
        assert!(err.reason.contains("expected 40 hex digits"));
        assert!(checksum_encode(&format!("{}00", VECTORS[0])).is_err());
        assert!(!is_checksum_address("0x12"));
    }

    #[test]
    fn non_hex_character_is_rejected() {
        let err = checksum_encode("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeZ")
            .expect_err("must reject non-hex");
        assert!(err.reason.contains("unknown hex character"));
    }
}
