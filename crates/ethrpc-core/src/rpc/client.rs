//! Typed Ethereum JSON-RPC endpoint catalog.
//!
//! Every method is one [`Dispatcher::call`] with a fixed method name,
//! wire-encoded parameters and a result decoder.

use std::time::Duration;

use ethnum::U256;
use serde_json::Value;

use crate::amount::Gwei;
use crate::codec::{
    Address, AddressCodec, Bytes, ChecksumAddressCodec, Codec, GweiCodec, Hash32, Hash32Codec,
    HexAddress, HexAddressCodec, HexStringCodec, IntegerCodec, Uint256Codec,
};
use crate::error::CoreError;
use crate::model::{
    Block, BlockTag, Filter, FilterChange, Log, Message, SyncStatus, Transaction,
    TransactionReceipt, TransactionRequest,
};

use super::dispatch::{
    BoolDecoder, Dispatcher, Each, FilterChangesDecoder, Nullable, Record, StringDecoder,
    SyncingDecoder,
};
use super::transport::{parse_connection, HttpTransport, Transport};

fn encode<C: Codec>(codec: C, value: &C::Value) -> Value {
    Value::String(codec.encode(value))
}

/// Ethereum JSON-RPC client over a [`Transport`].
pub struct EthClient<T = HttpTransport> {
    dispatcher: Dispatcher<T>,
}

impl EthClient<HttpTransport> {
    /// Connect to an `http(s)://` endpoint.
    ///
    /// See [`HttpTransport::new`] for the meaning of the remaining
    /// arguments.
    pub fn connect(
        connection: &str,
        user: Option<&str>,
        pass: Option<&str>,
        requests_per_second: Option<u32>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let url = parse_connection(connection)?;
        let transport = HttpTransport::new(user, pass, requests_per_second, timeout)?;
        Ok(Self::new(Dispatcher::new(url, transport)))
    }
}

impl<T: Transport> EthClient<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    /// The underlying dispatcher, for procedures not covered here.
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    // ==========================================================================
    // web3 / net
    // ==========================================================================

    pub async fn web3_client_version(&self) -> Result<String, CoreError> {
        self.dispatcher
            .call("web3_clientVersion", vec![], StringDecoder)
            .await
    }

    /// Keccak-256 of `data`, computed by the node.
    pub async fn web3_sha3(&self, data: &Bytes) -> Result<Hash32, CoreError> {
        self.dispatcher
            .call("web3_sha3", vec![encode(HexStringCodec, data)], Hash32Codec)
            .await
    }

    pub async fn net_version(&self) -> Result<String, CoreError> {
        self.dispatcher.call("net_version", vec![], StringDecoder).await
    }

    pub async fn net_listening(&self) -> Result<bool, CoreError> {
        self.dispatcher.call("net_listening", vec![], BoolDecoder).await
    }

    pub async fn net_peer_count(&self) -> Result<u64, CoreError> {
        self.dispatcher.call("net_peerCount", vec![], IntegerCodec).await
    }

    // ==========================================================================
    // Node state
    // ==========================================================================

    pub async fn eth_protocol_version(&self) -> Result<String, CoreError> {
        self.dispatcher
            .call("eth_protocolVersion", vec![], StringDecoder)
            .await
    }

    /// `None` when the node is not syncing.
    pub async fn eth_syncing(&self) -> Result<Option<SyncStatus>, CoreError> {
        self.dispatcher.call("eth_syncing", vec![], SyncingDecoder).await
    }

    pub async fn eth_coinbase(&self) -> Result<Address, CoreError> {
        self.dispatcher
            .call("eth_coinbase", vec![], ChecksumAddressCodec)
            .await
    }

    pub async fn eth_chain_id(&self) -> Result<u64, CoreError> {
        self.dispatcher.call("eth_chainId", vec![], IntegerCodec).await
    }

    pub async fn eth_mining(&self) -> Result<bool, CoreError> {
        self.dispatcher.call("eth_mining", vec![], BoolDecoder).await
    }

    pub async fn eth_hashrate(&self) -> Result<u64, CoreError> {
        self.dispatcher.call("eth_hashrate", vec![], IntegerCodec).await
    }

    pub async fn eth_gas_price(&self) -> Result<Gwei, CoreError> {
        self.dispatcher.call("eth_gasPrice", vec![], GweiCodec).await
    }

    /// Lowercase `0x` addresses owned by the node.
    pub async fn eth_accounts(&self) -> Result<Vec<HexAddress>, CoreError> {
        self.dispatcher
            .call("eth_accounts", vec![], Each(HexAddressCodec))
            .await
    }

    pub async fn eth_block_number(&self) -> Result<u64, CoreError> {
        self.dispatcher
            .call("eth_blockNumber", vec![], IntegerCodec)
            .await
    }

    // ==========================================================================
    // Account state
    // ==========================================================================

    pub async fn eth_get_balance(&self, address: &Address, block: BlockTag) -> Result<Gwei, CoreError> {
        self.dispatcher
            .call(
                "eth_getBalance",
                vec![encode(AddressCodec, address), block.to_param()],
                GweiCodec,
            )
            .await
    }

    /// Balances of many accounts in one batch, in input order.
    pub async fn eth_get_balances(
        &self,
        addresses: &[Address],
        block: BlockTag,
    ) -> Result<Vec<Gwei>, CoreError> {
        let calls: Vec<(String, Vec<Value>)> = addresses
            .iter()
            .map(|address| {
                (
                    "eth_getBalance".to_owned(),
                    vec![encode(AddressCodec, address), block.to_param()],
                )
            })
            .collect();
        let raw_results = self.dispatcher.call_batch(&calls).await?;
        raw_results
            .iter()
            .map(|raw| crate::codec::decode_value(&GweiCodec, raw).map_err(CoreError::from))
            .collect()
    }

    /// The 32-byte storage word at `position`.
    pub async fn eth_get_storage_at(
        &self,
        address: &Address,
        position: U256,
        block: BlockTag,
    ) -> Result<Bytes, CoreError> {
        self.dispatcher
            .call(
                "eth_getStorageAt",
                vec![
                    encode(AddressCodec, address),
                    encode(Uint256Codec, &position),
                    block.to_param(),
                ],
                HexStringCodec,
            )
            .await
    }

    pub async fn eth_get_transaction_count(
        &self,
        address: &Address,
        block: BlockTag,
    ) -> Result<u64, CoreError> {
        self.dispatcher
            .call(
                "eth_getTransactionCount",
                vec![encode(AddressCodec, address), block.to_param()],
                IntegerCodec,
            )
            .await
    }

    pub async fn eth_get_code(&self, address: &Address, block: BlockTag) -> Result<Bytes, CoreError> {
        self.dispatcher
            .call(
                "eth_getCode",
                vec![encode(AddressCodec, address), block.to_param()],
                HexStringCodec,
            )
            .await
    }

    // ==========================================================================
    // Block counts
    // ==========================================================================

    /// `None` when the block is unknown.
    pub async fn eth_get_block_transaction_count_by_hash(
        &self,
        block_hash: &Hash32,
    ) -> Result<Option<u64>, CoreError> {
        self.dispatcher
            .call(
                "eth_getBlockTransactionCountByHash",
                vec![encode(Hash32Codec, block_hash)],
                Nullable(IntegerCodec),
            )
            .await
    }

    pub async fn eth_get_block_transaction_count_by_number(
        &self,
        block: BlockTag,
    ) -> Result<Option<u64>, CoreError> {
        self.dispatcher
            .call(
                "eth_getBlockTransactionCountByNumber",
                vec![block.to_param()],
                Nullable(IntegerCodec),
            )
            .await
    }

    pub async fn eth_get_uncle_count_by_block_hash(
        &self,
        block_hash: &Hash32,
    ) -> Result<Option<u64>, CoreError> {
        self.dispatcher
            .call(
                "eth_getUncleCountByBlockHash",
                vec![encode(Hash32Codec, block_hash)],
                Nullable(IntegerCodec),
            )
            .await
    }

    pub async fn eth_get_uncle_count_by_block_number(
        &self,
        block: BlockTag,
    ) -> Result<Option<u64>, CoreError> {
        self.dispatcher
            .call(
                "eth_getUncleCountByBlockNumber",
                vec![block.to_param()],
                Nullable(IntegerCodec),
            )
            .await
    }

    // ==========================================================================
    // Signing and sending
    // ==========================================================================

    /// Sign `message` with an unlocked node account.
    pub async fn eth_sign(&self, address: &Address, message: &Bytes) -> Result<Bytes, CoreError> {
        self.dispatcher
            .call(
                "eth_sign",
                vec![encode(AddressCodec, address), encode(HexStringCodec, message)],
                HexStringCodec,
            )
            .await
    }

    pub async fn eth_send_transaction(
        &self,
        transaction: &TransactionRequest,
    ) -> Result<Hash32, CoreError> {
        self.dispatcher
            .call(
                "eth_sendTransaction",
                vec![transaction.to_params()],
                Hash32Codec,
            )
            .await
    }

    pub async fn eth_send_raw_transaction(&self, signed: &Bytes) -> Result<Hash32, CoreError> {
        self.dispatcher
            .call(
                "eth_sendRawTransaction",
                vec![encode(HexStringCodec, signed)],
                Hash32Codec,
            )
            .await
    }

    /// Execute a message call without creating a transaction.
    pub async fn eth_call(
        &self,
        transaction: &TransactionRequest,
        block: BlockTag,
    ) -> Result<Bytes, CoreError> {
        self.dispatcher
            .call(
                "eth_call",
                vec![transaction.to_params(), block.to_param()],
                HexStringCodec,
            )
            .await
    }

    pub async fn eth_estimate_gas(&self, transaction: &TransactionRequest) -> Result<u64, CoreError> {
        self.dispatcher
            .call("eth_estimateGas", vec![transaction.to_params()], IntegerCodec)
            .await
    }

    // ==========================================================================
    // Blocks and transactions
    // ==========================================================================

    /// With `full_transactions`, `Block.transactions` holds whole
    /// transactions instead of hashes.
    pub async fn eth_get_block_by_hash(
        &self,
        block_hash: &Hash32,
        full_transactions: bool,
    ) -> Result<Option<Block>, CoreError> {
        self.dispatcher
            .call(
                "eth_getBlockByHash",
                vec![encode(Hash32Codec, block_hash), Value::Bool(full_transactions)],
                Nullable(Record::<Block>::new()),
            )
            .await
    }

    pub async fn eth_get_block_by_number(
        &self,
        block: BlockTag,
        full_transactions: bool,
    ) -> Result<Option<Block>, CoreError> {
        self.dispatcher
            .call(
                "eth_getBlockByNumber",
                vec![block.to_param(), Value::Bool(full_transactions)],
                Nullable(Record::<Block>::new()),
            )
            .await
    }

    pub async fn eth_get_transaction_by_hash(
        &self,
        hash: &Hash32,
    ) -> Result<Option<Transaction>, CoreError> {
        self.dispatcher
            .call(
                "eth_getTransactionByHash",
                vec![encode(Hash32Codec, hash)],
                Nullable(Record::<Transaction>::new()),
            )
            .await
    }

    pub async fn eth_get_transaction_by_block_hash_and_index(
        &self,
        block_hash: &Hash32,
        index: u64,
    ) -> Result<Option<Transaction>, CoreError> {
        self.dispatcher
            .call(
                "eth_getTransactionByBlockHashAndIndex",
                vec![encode(Hash32Codec, block_hash), encode(IntegerCodec, &index)],
                Nullable(Record::<Transaction>::new()),
            )
            .await
    }

    pub async fn eth_get_transaction_by_block_number_and_index(
        &self,
        block: BlockTag,
        index: u64,
    ) -> Result<Option<Transaction>, CoreError> {
        self.dispatcher
            .call(
                "eth_getTransactionByBlockNumberAndIndex",
                vec![block.to_param(), encode(IntegerCodec, &index)],
                Nullable(Record::<Transaction>::new()),
            )
            .await
    }

    /// `None` while the transaction is pending or unknown.
    pub async fn eth_get_transaction_receipt(
        &self,
        hash: &Hash32,
    ) -> Result<Option<TransactionReceipt>, CoreError> {
        self.dispatcher
            .call(
                "eth_getTransactionReceipt",
                vec![encode(Hash32Codec, hash)],
                Nullable(Record::<TransactionReceipt>::new()),
            )
            .await
    }

    pub async fn eth_get_uncle_by_block_hash_and_index(
        &self,
        block_hash: &Hash32,
        index: u64,
    ) -> Result<Option<Block>, CoreError> {
        self.dispatcher
            .call(
                "eth_getUncleByBlockHashAndIndex",
                vec![encode(Hash32Codec, block_hash), encode(IntegerCodec, &index)],
                Nullable(Record::<Block>::new()),
            )
            .await
    }

    pub async fn eth_get_uncle_by_block_number_and_index(
        &self,
        block: BlockTag,
        index: u64,
    ) -> Result<Option<Block>, CoreError> {
        self.dispatcher
            .call(
                "eth_getUncleByBlockNumberAndIndex",
                vec![block.to_param(), encode(IntegerCodec, &index)],
                Nullable(Record::<Block>::new()),
            )
            .await
    }

    // ==========================================================================
    // Filters and logs
    // ==========================================================================

    /// Install a log filter; returns the filter id.
    pub async fn eth_new_filter(&self, filter: &Filter) -> Result<U256, CoreError> {
        self.dispatcher
            .call("eth_newFilter", vec![filter.to_params()], Uint256Codec)
            .await
    }

    pub async fn eth_new_block_filter(&self) -> Result<U256, CoreError> {
        self.dispatcher
            .call("eth_newBlockFilter", vec![], Uint256Codec)
            .await
    }

    pub async fn eth_new_pending_transaction_filter(&self) -> Result<U256, CoreError> {
        self.dispatcher
            .call("eth_newPendingTransactionFilter", vec![], Uint256Codec)
            .await
    }

    pub async fn eth_uninstall_filter(&self, filter_id: U256) -> Result<bool, CoreError> {
        self.dispatcher
            .call(
                "eth_uninstallFilter",
                vec![encode(Uint256Codec, &filter_id)],
                BoolDecoder,
            )
            .await
    }

    /// Changes since the last poll of `filter_id`.
    pub async fn eth_get_filter_changes(&self, filter_id: U256) -> Result<Vec<FilterChange>, CoreError> {
        self.dispatcher
            .call(
                "eth_getFilterChanges",
                vec![encode(Uint256Codec, &filter_id)],
                FilterChangesDecoder,
            )
            .await
    }

    pub async fn eth_get_filter_logs(&self, filter_id: U256) -> Result<Vec<Log>, CoreError> {
        self.dispatcher
            .call(
                "eth_getFilterLogs",
                vec![encode(Uint256Codec, &filter_id)],
                Each(Record::<Log>::new()),
            )
            .await
    }

    pub async fn eth_get_logs(&self, filter: &Filter) -> Result<Vec<Log>, CoreError> {
        self.dispatcher
            .call(
                "eth_getLogs",
                vec![filter.to_params()],
                Each(Record::<Log>::new()),
            )
            .await
    }

    // ==========================================================================
    // Whisper
    // ==========================================================================

    pub async fn shh_version(&self) -> Result<String, CoreError> {
        self.dispatcher.call("shh_version", vec![], StringDecoder).await
    }

    pub async fn shh_get_messages(&self, filter_id: U256) -> Result<Vec<Message>, CoreError> {
        self.dispatcher
            .call(
                "shh_getMessages",
                vec![encode(Uint256Codec, &filter_id)],
                Each(Record::<Message>::new()),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Timestamp;
    use crate::model::TransactionEntry;
    use crate::rpc::mock::MockTransport;
    use crate::test_util::{address_from_byte, address_hex, hash_hex, init_tracing, test_url};
    use serde_json::json;

    fn client(mock: MockTransport) -> EthClient<MockTransport> {
        init_tracing();
        EthClient::new(Dispatcher::with_start_id(test_url(), mock, 1))
    }

    fn last_params(client: &EthClient<MockTransport>) -> Value {
        client
            .dispatcher()
            .transport()
            .requests()
            .last()
            .map(|r| r["params"].clone())
            .expect("a request must have been sent")
    }

    #[tokio::test]
    async fn gas_price_is_exact() {
        let c = client(
            MockTransport::builder()
                .with_result("eth_gasPrice", json!("0x4563918244f40000"))
                .build(),
        );
        let price = c.eth_gas_price().await.expect("gas price");
        assert_eq!(price.to_eth(), "5");
        assert_eq!(price.value(), "5000000000");
    }

    #[tokio::test]
    async fn balance_sends_address_and_tag() {
        let c = client(
            MockTransport::builder()
                .with_result("eth_getBalance", json!("0xde0b6b3a7640000"))
                .build(),
        );
        let balance = c
            .eth_get_balance(&address_from_byte(0x42), BlockTag::Number(436))
            .await
            .expect("balance");
        assert_eq!(balance.to_eth(), "1");
        assert_eq!(last_params(&c), json!([address_hex(0x42), "0x1b4"]));
    }

    #[tokio::test]
    async fn balances_batch_in_input_order() {
        let c = client(
            MockTransport::builder()
                .with_body("eth_getBalance", |id| {
                    json!({"jsonrpc": "2.0", "id": id, "result": format!("{:#x}", id * 1_000_000_000)})
                        .to_string()
                })
                .build(),
        );
        let balances = c
            .eth_get_balances(
                &[address_from_byte(1), address_from_byte(2), address_from_byte(3)],
                BlockTag::Latest,
            )
            .await
            .expect("balances");
        let gwei: Vec<String> = balances.iter().map(Gwei::value).collect();
        assert_eq!(gwei, vec!["1", "2", "3"]);
        assert_eq!(c.dispatcher().transport().send_count(), 1);
    }

    #[tokio::test]
    async fn accounts_are_lowercase_strings() {
        let c = client(
            MockTransport::builder()
                .with_result(
                    "eth_accounts",
                    json!(["0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB", address_hex(7)]),
                )
                .build(),
        );
        let accounts = c.eth_accounts().await.expect("accounts");
        let rendered: Vec<&str> = accounts.iter().map(HexAddress::as_str).collect();
        assert_eq!(
            rendered,
            vec!["0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb", address_hex(7).as_str()]
        );
    }

    #[tokio::test]
    async fn coinbase_is_checksum_validated() {
        let good = client(
            MockTransport::builder()
                .with_result("eth_coinbase", json!("0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB"))
                .build(),
        );
        let coinbase = good.eth_coinbase().await.expect("coinbase");
        assert_eq!(coinbase.to_checksum(), "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB");

        let bad = client(
            MockTransport::builder()
                .with_result("eth_coinbase", json!("0xdbf03B407c01E7cD3CBea99509d93f8DDDC8C6FB"))
                .build(),
        );
        assert!(matches!(bad.eth_coinbase().await, Err(CoreError::Format(_))));
    }

    #[tokio::test]
    async fn pending_block_by_number() {
        let c = client(
            MockTransport::builder()
                .with_result(
                    "eth_getBlockByNumber",
                    json!({
                        "number": null,
                        "hash": null,
                        "parentHash": hash_hex(9),
                        "timestamp": "0x55ba467c",
                        "transactions": [hash_hex(1)],
                        "uncles": [],
                    }),
                )
                .build(),
        );
        let block = c
            .eth_get_block_by_number(BlockTag::Pending, false)
            .await
            .expect("block call")
            .expect("pending block exists");
        assert!(block.is_pending());
        assert_eq!(block.timestamp, Some(Timestamp(0x55ba467c)));
        assert_eq!(
            block.transactions,
            vec![TransactionEntry::Hash(Hash32::new([1; 32]))]
        );
        assert_eq!(last_params(&c), json!(["pending", false]));
    }

    #[tokio::test]
    async fn unknown_receipt_is_none() {
        let c = client(
            MockTransport::builder()
                .with_result("eth_getTransactionReceipt", Value::Null)
                .build(),
        );
        let receipt = c
            .eth_get_transaction_receipt(&Hash32::new([5; 32]))
            .await
            .expect("receipt call");
        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn send_transaction_encodes_request_object() {
        let c = client(
            MockTransport::builder()
                .with_result("eth_sendTransaction", json!(hash_hex(0xee)))
                .build(),
        );
        let request = TransactionRequest::new(address_from_byte(1))
            .to(address_from_byte(2))
            .value(Gwei::new("1").expect("valid gwei"));
        let hash = c.eth_send_transaction(&request).await.expect("send");
        assert_eq!(hash, Hash32::new([0xee; 32]));
        assert_eq!(
            last_params(&c),
            json!([{"from": address_hex(1), "to": address_hex(2), "value": "0x3b9aca00"}])
        );
    }

    #[tokio::test]
    async fn filter_lifecycle() {
        let c = client(
            MockTransport::builder()
                .with_result("eth_newBlockFilter", json!("0x1"))
                .with_result("eth_getFilterChanges", json!([hash_hex(3), hash_hex(4)]))
                .with_result("eth_uninstallFilter", json!(true))
                .build(),
        );
        let id = c.eth_new_block_filter().await.expect("filter id");
        assert_eq!(id, U256::ONE);
        let changes = c.eth_get_filter_changes(id).await.expect("changes");
        assert_eq!(
            changes,
            vec![
                FilterChange::Hash(Hash32::new([3; 32])),
                FilterChange::Hash(Hash32::new([4; 32])),
            ]
        );
        assert_eq!(last_params(&c), json!(["0x1"]));
        assert!(c.eth_uninstall_filter(id).await.expect("uninstall"));
    }

    #[tokio::test]
    async fn get_logs_decodes_each_entry() {
        let c = client(
            MockTransport::builder()
                .with_result(
                    "eth_getLogs",
                    json!([
                        {"logIndex": "0x0", "address": address_hex(9), "topics": [hash_hex(1)], "data": "0x"},
                        {"logIndex": "0x1", "address": address_hex(9), "topics": [], "data": "0x00"},
                    ]),
                )
                .build(),
        );
        let filter = Filter::new().from_block(1u64).address(address_from_byte(9));
        let logs = c.eth_get_logs(&filter).await.expect("logs");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].log_index, Some(1));
        assert_eq!(
            last_params(&c),
            json!([{"fromBlock": "0x1", "address": address_hex(9)}])
        );
    }

    #[tokio::test]
    async fn syncing_idle_node() {
        let c = client(MockTransport::builder().with_result("eth_syncing", json!(false)).build());
        assert_eq!(c.eth_syncing().await.expect("syncing"), None);
    }

    #[tokio::test]
    async fn storage_position_is_hex_quantity() {
        let c = client(
            MockTransport::builder()
                .with_result("eth_getStorageAt", json!(format!("0x{}", "00".repeat(31) + "2a")))
                .build(),
        );
        let word = c
            .eth_get_storage_at(&address_from_byte(1), U256::new(2), BlockTag::Latest)
            .await
            .expect("storage");
        assert_eq!(word.len(), 32);
        assert_eq!(word[31], 0x2a);
        assert_eq!(last_params(&c), json!([address_hex(1), "0x2", "latest"]));
    }

    #[tokio::test]
    async fn client_version_and_net() {
        let c = client(
            MockTransport::builder()
                .with_result("web3_clientVersion", json!("Geth/v1.13.0"))
                .with_result("net_version", json!("1"))
                .with_result("net_listening", json!(true))
                .with_result("net_peerCount", json!("0x19"))
                .build(),
        );
        assert_eq!(c.web3_client_version().await.expect("version"), "Geth/v1.13.0");
        assert_eq!(c.net_version().await.expect("net version"), "1");
        assert!(c.net_listening().await.expect("listening"));
        assert_eq!(c.net_peer_count().await.expect("peers"), 25);
    }

    #[tokio::test]
    async fn node_errors_propagate() {
        let c = client(
            MockTransport::builder()
                .with_error("eth_sendRawTransaction", -32000, "nonce too low")
                .build(),
        );
        let err = c
            .eth_send_raw_transaction(&Bytes::new(vec![0xf8]))
            .await
            .expect_err("must fail");
        let obj = err.rpc_error_object().expect("node error");
        assert_eq!(obj.message, "nonce too low");
    }
}
