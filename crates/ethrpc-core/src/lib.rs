pub mod amount;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod model;
pub mod rpc;
#[cfg(test)]
mod test_util;

pub use amount::Gwei;
pub use codec::{Address, Bytes, Hash32, HexAddress, Timestamp};
pub use error::{CoreError, FormatError, RpcError, RpcErrorKind};
pub use model::BlockTag;
pub use rpc::{EthClient, HttpTransport};
