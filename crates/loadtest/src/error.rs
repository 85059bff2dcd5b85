//! Error types for the load generator.

use alloy_primitives::{Address, TxHash};
use thiserror::Error;

use crate::{
    accounts::LedgerError, config::ConfigError, confirm::ConfirmOutcome,
    partition::PartitionError, rpc::RpcError,
};

/// Errors that end a single worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker could not open its network client.
    #[error("worker {worker} could not open a client: {source}")]
    Connect {
        /// Worker id.
        worker: usize,
        /// Underlying RPC error.
        #[source]
        source: RpcError,
    },

    /// A transaction could not be signed.
    #[error("worker {worker} failed to sign for {account}: {source}")]
    Signing {
        /// Worker id.
        worker: usize,
        /// Sending account.
        account: Address,
        /// Underlying signer error.
        #[source]
        source: alloy_signer::Error,
    },

    /// The network refused a submission. Never retried.
    #[error("worker {worker} failed to submit from {account} with nonce {nonce}: {source}")]
    Submission {
        /// Worker id.
        worker: usize,
        /// Sending account.
        account: Address,
        /// Nonce of the refused transaction.
        nonce: u64,
        /// Underlying RPC error.
        #[source]
        source: RpcError,
    },

    /// A confirmation did not succeed and the run halts on unconfirmed transactions.
    #[error("worker {worker}: transaction {tx_hash} was not confirmed ({outcome:?})")]
    Validation {
        /// Worker id.
        worker: usize,
        /// Hash of the unconfirmed transaction.
        tx_hash: TxHash,
        /// Outcome of the confirmation.
        outcome: ConfirmOutcome,
    },

    /// The worker task panicked or was aborted.
    #[error("worker {worker} did not complete: {reason}")]
    Join {
        /// Worker id.
        worker: usize,
        /// Join failure description.
        reason: String,
    },
}

impl WorkerError {
    /// Returns the id of the failed worker.
    pub const fn worker(&self) -> usize {
        match self {
            Self::Connect { worker, .. } |
            Self::Signing { worker, .. } |
            Self::Submission { worker, .. } |
            Self::Validation { worker, .. } |
            Self::Join { worker, .. } => *worker,
        }
    }

    /// Returns true for failures of the worker itself, as opposed to a
    /// failed validation that a more lenient policy would only have counted.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Validation { .. })
    }
}

/// Main error type for the load generator.
#[derive(Debug, Error)]
pub enum LoadTestError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The run could not be prepared.
    #[error("Setup error: {0}")]
    Setup(String),

    /// RPC failure during setup.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// The workload could not be partitioned.
    #[error("Partition error: {0}")]
    Partition(#[from] PartitionError),

    /// Accounts could not be handed out to workers.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A setup transaction could not be signed.
    #[error("Signing error: {0}")]
    Signing(#[from] alloy_signer::Error),

    /// The target contract could not be deployed.
    #[error("Deployment error: {0}")]
    Deploy(String),

    /// A single worker failed.
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The run completed but did not validate.
    #[error(
        "run failed: {failed_workers} worker(s) aborted, {on_chain_failures} transaction(s) \
         failed on chain, {inconclusive} confirmation(s) inconclusive"
    )]
    RunFailed {
        /// Number of workers that ended with an error.
        failed_workers: usize,
        /// Number of reverted transactions.
        on_chain_failures: u64,
        /// Number of transactions without a receipt after all polls.
        inconclusive: u64,
    },
}

/// Result type alias for load generator operations.
pub type LoadTestResult<T> = Result<T, LoadTestError>;
