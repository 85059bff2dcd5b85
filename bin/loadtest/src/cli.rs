//! CLI definition for the loadtest binary.

use std::time::Duration;

use alloy_primitives::Address;
use base_loadtest::{
    ConfigError, ConfirmConfig, ConfirmPolicy, DEFAULT_DEPLOY_GAS_LIMIT, DEFAULT_GAS_LIMIT,
    DEFAULT_GENERATED_KEYS, DEFAULT_MAX_NODES, DEFAULT_NODE_ENDPOINT,
    DEFAULT_NUM_TRANSACTIONS, DEFAULT_NUM_WORKERS, DEFAULT_RECEIPT_RETRIES, FailurePolicy,
    KeyConfig, LoadTestConfig, LogConfig, LogFormat, PrivacyConfig,
};
use clap::{ArgAction, Parser, Subcommand};
use url::Url;

/// Loadtest - concurrent transaction load for permissioned EVM networks.
#[derive(Debug, Clone, Parser)]
#[command(name = "loadtest")]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,

    /// Load test configuration arguments.
    #[command(flatten)]
    pub loadtest: LoadTestArgs,

    /// Logging configuration arguments.
    #[command(flatten)]
    pub logging: LogArgs,
}

/// Subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// Run the full load test.
    Run,
    /// Send one transaction from the first account and confirm it.
    TransactOnce,
}

/// Core load test arguments.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Load test")]
pub(crate) struct LoadTestArgs {
    /// Base node JSON-RPC endpoint. Worker `i` uses port `base + i % max-nodes`.
    #[arg(
        long = "node-endpoint",
        env = "LOADTEST_NODE_ENDPOINT",
        default_value = DEFAULT_NODE_ENDPOINT,
        value_parser = parse_url,
        global = true
    )]
    pub node_endpoint: Url,

    /// Base private transaction manager endpoint, used with `--private-for`.
    #[arg(
        long = "private-endpoint",
        env = "LOADTEST_PRIVATE_ENDPOINT",
        value_parser = parse_url,
        global = true
    )]
    pub private_endpoint: Option<Url>,

    /// Colon separated public keys receiving private transactions.
    #[arg(
        long = "private-for",
        env = "LOADTEST_PRIVATE_FOR",
        value_delimiter = ':',
        global = true
    )]
    pub private_for: Vec<String>,

    /// Upper bound on a single receipt poll (e.g., "3s", "500ms").
    #[arg(
        long = "expected-latency",
        env = "LOADTEST_EXPECTED_LATENCY",
        default_value = "3s",
        value_parser = parse_duration,
        global = true
    )]
    pub expected_latency: Duration,

    /// Maximum receipt polls per transaction.
    #[arg(
        long = "receipt-retries",
        env = "LOADTEST_RECEIPT_RETRIES",
        default_value_t = DEFAULT_RECEIPT_RETRIES,
        global = true
    )]
    pub receipt_retries: u32,

    /// Gas limit of load transactions.
    #[arg(
        long = "gas-limit",
        env = "LOADTEST_GAS_LIMIT",
        default_value_t = DEFAULT_GAS_LIMIT,
        global = true
    )]
    pub gas_limit: u64,

    /// Gas limit of the contract deployment.
    #[arg(
        long = "deploy-gas-limit",
        env = "LOADTEST_DEPLOY_GAS_LIMIT",
        default_value_t = DEFAULT_DEPLOY_GAS_LIMIT,
        global = true
    )]
    pub deploy_gas_limit: u64,

    /// Confirm every round before starting the next one.
    #[arg(
        long = "check-batch-receipts",
        env = "LOADTEST_CHECK_BATCH_RECEIPTS",
        default_value = "false",
        global = true
    )]
    pub check_batch_receipts: bool,

    /// Confirm every transaction after the last round.
    #[arg(
        long = "confirm-at-end",
        env = "LOADTEST_CONFIRM_AT_END",
        default_value = "false",
        global = true
    )]
    pub confirm_at_end: bool,

    /// Stop a worker at its first unconfirmed transaction.
    #[arg(
        long = "halt-on-unconfirmed",
        env = "LOADTEST_HALT_ON_UNCONFIRMED",
        default_value = "false",
        global = true
    )]
    pub halt_on_unconfirmed: bool,

    /// Hex private key deploying the contract.
    #[arg(long = "deploy-key", env = "LOADTEST_DEPLOY_KEY", global = true)]
    pub deploy_key: Option<String>,

    /// Colon separated hex private keys of the sending accounts.
    #[arg(long = "from-keys", env = "LOADTEST_FROM_KEYS", value_delimiter = ':', global = true)]
    pub from_keys: Vec<String>,

    /// Number of random sending accounts generated in addition to `--from-keys`.
    #[arg(
        long = "generated-keys",
        env = "LOADTEST_GENERATED_KEYS",
        default_value_t = DEFAULT_GENERATED_KEYS,
        global = true
    )]
    pub generated_keys: usize,

    /// Number of concurrent workers.
    #[arg(
        long = "threads",
        env = "LOADTEST_THREADS",
        default_value_t = DEFAULT_NUM_WORKERS,
        global = true
    )]
    pub threads: usize,

    /// Number of node ports workers are spread over.
    #[arg(
        long = "max-nodes",
        env = "LOADTEST_MAX_NODES",
        default_value_t = DEFAULT_MAX_NODES,
        global = true
    )]
    pub max_nodes: u16,

    /// Requested number of transactions.
    #[arg(
        long = "transactions",
        env = "LOADTEST_TRANSACTIONS",
        default_value_t = DEFAULT_NUM_TRANSACTIONS,
        global = true
    )]
    pub transactions: u64,

    /// Chain id used for signing. Queried from the node when unset.
    #[arg(long = "chain-id", env = "LOADTEST_CHAIN_ID", global = true)]
    pub chain_id: Option<u64>,

    /// Address of an already deployed `GetSetAdd` contract. Skips deployment.
    #[arg(
        long = "contract-address",
        env = "LOADTEST_CONTRACT_ADDRESS",
        value_parser = parse_address,
        global = true
    )]
    pub contract_address: Option<Address>,
}

/// Logging configuration arguments.
#[derive(Debug, Clone, Parser)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// Increase logging verbosity (none=INFO, -v=DEBUG, -vv=TRACE).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Stdout log format.
    #[arg(
        long = "log-format",
        default_value = "full",
        env = "LOADTEST_LOG_FORMAT",
        global = true
    )]
    pub format: LogFormat,
}

impl From<LogArgs> for LogConfig {
    fn from(args: LogArgs) -> Self {
        Self::from_verbosity(args.verbosity, args.format)
    }
}

impl TryFrom<Cli> for LoadTestConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let args = cli.loadtest;

        let privacy = match (args.private_endpoint, args.private_for.is_empty()) {
            (_, true) => None,
            (Some(endpoint), false) => {
                Some(PrivacyConfig { endpoint, private_for: args.private_for })
            }
            (None, false) => {
                return Err(ConfigError::InvalidUrl {
                    field: "private-endpoint",
                    reason: "required when --private-for is set".to_string(),
                });
            }
        };

        let config = Self {
            node_endpoint: args.node_endpoint,
            max_nodes: args.max_nodes,
            privacy,
            num_workers: args.threads,
            num_transactions: args.transactions,
            gas_limit: args.gas_limit,
            deploy_gas_limit: args.deploy_gas_limit,
            chain_id: args.chain_id,
            contract: args.contract_address,
            confirm: ConfirmConfig {
                expected_latency: args.expected_latency,
                receipt_retries: args.receipt_retries,
                policy: ConfirmPolicy::from_flags(args.check_batch_receipts, args.confirm_at_end),
                on_failure: FailurePolicy::from_halt(args.halt_on_unconfirmed),
            },
            keys: KeyConfig {
                deploy_key: args.deploy_key,
                from_keys: args.from_keys,
                generated: args.generated_keys,
            },
            log: cli.logging.into(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Parse a duration string like "3s", "500ms".
fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

/// Parse a URL string.
fn parse_url(s: &str) -> Result<Url, url::ParseError> {
    Url::parse(s)
}

/// Parse an Ethereum address from hex string.
fn parse_address(s: &str) -> Result<Address, alloy_primitives::hex::FromHexError> {
    s.parse()
}
