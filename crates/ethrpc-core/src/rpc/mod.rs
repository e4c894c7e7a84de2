//! Ethereum JSON-RPC layer.
//!
//! [`protocol`] builds and parses JSON-RPC 2.0 envelopes, [`transport`]
//! moves them over HTTP, [`dispatch`] ties the two together with id
//! allocation and typed decoding, and [`EthClient`] exposes one method per
//! remote procedure. A test double (`mock::MockTransport`) stands in for
//! the node in unit tests.

pub mod client;
pub mod dispatch;
#[cfg(test)]
pub mod mock;
pub mod protocol;
pub mod transport;

pub use client::EthClient;
pub use dispatch::{
    BoolDecoder, Decode, Dispatcher, Each, FilterChangesDecoder, Nullable, Raw, Record,
    StringDecoder, SyncingDecoder,
};
pub use protocol::{MessageFactory, Outcome, ResponseEnvelope};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
