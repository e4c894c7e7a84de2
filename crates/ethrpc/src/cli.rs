use clap::{Parser, Subcommand, ValueEnum};

/// ethrpc: query an Ethereum node over JSON-RPC.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Node JSON-RPC URL.
    #[arg(long, default_value = "http://127.0.0.1:8545", env = "ETHRPC_URL")]
    pub rpc_url: String,

    /// RPC username (optional; not needed for token-in-URL providers).
    #[arg(long, env = "ETHRPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password (optional; not needed for token-in-URL providers).
    #[arg(long, env = "ETHRPC_PASS")]
    pub rpc_pass: Option<String>,

    /// Maximum outbound requests per second. Unlimited when omitted.
    #[arg(long, env = "ETHRPC_RPS")]
    pub rps: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value = "30", env = "ETHRPC_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the node's client version string.
    ClientVersion,

    /// Print the current block height.
    BlockNumber,

    /// Print the current gas price.
    GasPrice,

    /// Print an account balance.
    Balance {
        address: String,

        /// Block number, `latest`, `earliest` or `pending`.
        #[arg(long, default_value = "latest")]
        block: String,
    },

    /// Print a block by number, tag or hash.
    Block {
        /// Block hash, number, `latest`, `earliest` or `pending`.
        id: String,

        /// Include full transactions instead of hashes.
        #[arg(long)]
        full: bool,
    },

    /// Print a transaction by hash.
    Tx { hash: String },

    /// Print a transaction receipt by hash.
    Receipt { hash: String },

    /// Print sync progress, or `false` when the node is synced.
    Syncing,

    /// List the node's accounts.
    Accounts,

    /// Print the EIP-55 checksum form of an address. Works offline.
    Checksum { address: String },

    /// Convert an amount between denominations. Works offline.
    Convert {
        amount: String,

        #[arg(long, value_enum)]
        from: Unit,

        #[arg(long, value_enum)]
        to: Unit,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Unit {
    Wei,
    Gwei,
    Eth,
}

impl Cli {
    /// Whether the command needs a node connection.
    pub fn is_offline(&self) -> bool {
        matches!(self.command, Command::Checksum { .. } | Command::Convert { .. })
    }
}
