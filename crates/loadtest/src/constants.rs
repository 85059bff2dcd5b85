//! Constants used throughout the load generator.

use std::time::Duration;

/// Base delays, in milliseconds, slept between receipt polls.
///
/// Entry `i` is used after the `i`-th unsuccessful poll. Polls past the end of
/// the table reuse the last entry.
pub const BACKOFF_TABLE_MS: [u64; 11] =
    [0, 500, 500, 3_000, 3_000, 5_000, 5_000, 8_000, 8_000, 10_000, 10_000];

/// Argument passed to every `add(uint256)` call issued by the workers.
pub const ADD_ARGUMENT: u64 = 3;

/// Quorum expects `v` of private transactions to be `37` or `38`.
pub const PRIVATE_TX_V_BASE: u64 = 37;

/// Timeout applied to every HTTP request made by a network client.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Configuration defaults
// ============================================================================

/// Default node JSON-RPC endpoint.
pub const DEFAULT_NODE_ENDPOINT: &str = "http://127.0.0.1:8545";

/// Default per-poll timeout when waiting for a receipt.
pub const DEFAULT_EXPECTED_LATENCY: Duration = Duration::from_secs(3);

/// Default number of receipt polls before a transaction is inconclusive.
pub const DEFAULT_RECEIPT_RETRIES: u32 = 15;

/// Default gas limit of every load transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 6_000_000;

/// Default gas limit of the contract deployment transaction.
pub const DEFAULT_DEPLOY_GAS_LIMIT: u64 = 500_000_000;

/// Default number of accounts generated in addition to the provided keys.
pub const DEFAULT_GENERATED_KEYS: usize = 200;

/// Default number of concurrent workers.
pub const DEFAULT_NUM_WORKERS: usize = 20;

/// Default number of distinct node endpoints the workers spread over.
pub const DEFAULT_MAX_NODES: u16 = 1;

/// Default number of transactions requested for a run.
pub const DEFAULT_NUM_TRANSACTIONS: u64 = 2_000;
