//! Shared test helpers for `ethrpc-core` unit tests.

use std::sync::Once;

use reqwest::Url;

use crate::codec::{Address, Hash32};

static TRACING_INIT: Once = Once::new();

/// Route `tracing` output through the test harness; honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn test_url() -> Url {
    Url::parse("http://127.0.0.1:8545").expect("static test url must parse")
}

// ==============================================================================
// Fixed-Width Values
// ==============================================================================

/// Wire form of a 32-byte hash filled with `b`.
pub fn hash_hex(b: u8) -> String {
    Hash32::new([b; 32]).to_string()
}

pub fn address_from_byte(b: u8) -> Address {
    Address::new([b; 20])
}

/// Lowercase wire form of a 20-byte address filled with `b`.
pub fn address_hex(b: u8) -> String {
    address_from_byte(b).to_string()
}
