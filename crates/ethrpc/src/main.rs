mod cli;

use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use serde_json::Value;

use ethrpc_core::codec::ChecksumAddressCodec;
use ethrpc_core::{Address, BlockTag, EthClient, Gwei, Hash32, HttpTransport};

use cli::{Command, Unit};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    if args.is_offline() {
        return run_offline(&args.command);
    }

    let client = EthClient::connect(
        &args.rpc_url,
        args.rpc_user.as_deref(),
        args.rpc_pass.as_deref(),
        args.rps,
        Duration::from_secs(args.timeout_secs),
    )
    .context("configure RPC client")?;

    // Verify the endpoint answers before running the command so connection
    // problems get a hint instead of a bare transport error.
    let chain_id = client.eth_chain_id().await.map_err(|err| {
        let message = format_rpc_connect_error(&args.rpc_url, &error_chain(&err));
        eyre!(message).wrap_err("while attempting to connect to the Ethereum node")
    })?;
    tracing::info!(chain_id, "connected to Ethereum node");

    run_online(&client, &args.command).await
}

async fn run_online(client: &EthClient<HttpTransport>, command: &Command) -> eyre::Result<()> {
    match command {
        Command::ClientVersion => {
            println!("{}", client.web3_client_version().await?);
        }
        Command::BlockNumber => {
            println!("{}", client.eth_block_number().await?);
        }
        Command::GasPrice => {
            let price = client.eth_gas_price().await?;
            println!("{} gwei", price.value());
        }
        Command::Balance { address, block } => {
            let address: Address = address.parse().context("parse address")?;
            let block: BlockTag = block.parse().context("parse block tag")?;
            let balance = client.eth_get_balance(&address, block).await?;
            println!("{} ETH", balance.to_eth());
        }
        Command::Block { id, full } => {
            let block = match parse_block_id(id)? {
                BlockId::Hash(hash) => client.eth_get_block_by_hash(&hash, *full).await?,
                BlockId::Tag(tag) => client.eth_get_block_by_number(tag, *full).await?,
            };
            let block = block.ok_or_else(|| eyre!("block `{id}` not found"))?;
            print_json(&block)?;
        }
        Command::Tx { hash } => {
            let hash: Hash32 = hash.parse().context("parse transaction hash")?;
            let tx = client
                .eth_get_transaction_by_hash(&hash)
                .await?
                .ok_or_else(|| eyre!("transaction {hash} not found"))?;
            print_json(&tx)?;
        }
        Command::Receipt { hash } => {
            let hash: Hash32 = hash.parse().context("parse transaction hash")?;
            let receipt = client
                .eth_get_transaction_receipt(&hash)
                .await?
                .ok_or_else(|| eyre!("no receipt for {hash}; unknown or still pending"))?;
            print_json(&receipt)?;
        }
        Command::Syncing => match client.eth_syncing().await? {
            Some(status) => print_json(&status)?,
            None => println!("false"),
        },
        Command::Accounts => {
            for account in client.eth_accounts().await? {
                println!("{account}");
            }
        }
        Command::Checksum { .. } | Command::Convert { .. } => run_offline(command)?,
    }
    Ok(())
}

fn run_offline(command: &Command) -> eyre::Result<()> {
    match command {
        Command::Checksum { address } => {
            let checksummed = ChecksumAddressCodec
                .checksum_encode(address)
                .context("checksum address")?;
            println!("{checksummed}");
        }
        Command::Convert { amount, from, to } => {
            println!("{}", convert_amount(amount, *from, *to)?);
        }
        _ => return Err(eyre!("command requires a node connection")),
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> eyre::Result<()> {
    let rendered: Value = serde_json::to_value(value).context("serialize result")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&rendered).context("render result")?
    );
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum BlockId {
    Hash(Hash32),
    Tag(BlockTag),
}

/// A full 32-byte hex value selects by hash; anything else is a block tag.
fn parse_block_id(id: &str) -> eyre::Result<BlockId> {
    if id.len() == 66 && id.starts_with("0x") {
        let hash = id.parse::<Hash32>().context("parse block hash")?;
        return Ok(BlockId::Hash(hash));
    }
    let tag = id.parse::<BlockTag>().context("parse block tag")?;
    Ok(BlockId::Tag(tag))
}

fn convert_amount(amount: &str, from: Unit, to: Unit) -> eyre::Result<String> {
    let parsed = match from {
        Unit::Wei => Gwei::from_wei(amount),
        Unit::Gwei => Gwei::new(amount),
        Unit::Eth => Gwei::from_eth(amount),
    }
    .with_context(|| format!("parse `{amount}` as {from:?}"))?;

    Ok(match to {
        Unit::Wei => parsed.to_wei(),
        Unit::Gwei => parsed.value(),
        Unit::Eth => parsed.to_eth(),
    })
}

/// `err` and its sources, outermost first, joined by `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("dns error") || source_error.contains("failed to lookup address") {
        lines.push("hint: hostname resolution failed; check the endpoint host".into());
    } else if source_error.contains("Connection refused") {
        lines.push("hint: nothing is listening there; is the node running with HTTP RPC enabled (geth --http)?".into());
    } else if source_error.contains("certificate") || source_error.contains("tls") {
        lines.push("hint: TLS handshake failed; check that the endpoint really serves HTTPS".into());
    } else if source_error.contains("HTTP status 401") || source_error.contains("HTTP status 403") {
        lines.push("hint: authentication failed; check token-in-URL or --rpc-user/--rpc-pass".into());
    } else if source_error.contains("HTTP status 404") {
        lines.push("hint: endpoint path is invalid; check the full RPC URL".into());
    } else if source_error.contains("does not exist") {
        lines.push("hint: the endpoint does not expose the eth namespace".into());
    } else if source_error.contains("error sending request for url") {
        lines.push("hint: request could not be sent; check the URL and that the endpoint is reachable".into());
    }

    lines.join("\n")
}
