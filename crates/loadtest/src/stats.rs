//! Atomic statistics shared by all workers of a run.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::confirm::ConfirmOutcome;

/// Thread-safe counters updated live by the workers.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Transactions accepted by a node.
    pub tx_submitted: AtomicU64,
    /// Transactions confirmed with a success receipt.
    pub tx_confirmed: AtomicU64,
    /// Transactions with a failed receipt.
    pub tx_on_chain_failures: AtomicU64,
    /// Transactions without a receipt after every poll.
    pub tx_inconclusive: AtomicU64,
}

impl RunStats {
    /// Creates a new stats collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a submission accepted by a node.
    pub fn record_submitted(&self) {
        self.tx_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the outcome of one confirmation.
    pub fn record_outcome(&self, outcome: ConfirmOutcome) {
        let counter = match outcome {
            ConfirmOutcome::Success => &self.tx_confirmed,
            ConfirmOutcome::OnChainFailure => &self.tx_on_chain_failures,
            ConfirmOutcome::Inconclusive => &self.tx_inconclusive,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of submitted transactions.
    pub fn submitted(&self) -> u64 {
        self.tx_submitted.load(Ordering::Relaxed)
    }

    /// Returns the number of confirmed transactions.
    pub fn confirmed(&self) -> u64 {
        self.tx_confirmed.load(Ordering::Relaxed)
    }

    /// Returns the number of reverted transactions.
    pub fn on_chain_failures(&self) -> u64 {
        self.tx_on_chain_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of inconclusive confirmations.
    pub fn inconclusive(&self) -> u64 {
        self.tx_inconclusive.load(Ordering::Relaxed)
    }
}
