//! Static partitioning of accounts and workload across a fixed worker pool.

use std::ops::Range;

use thiserror::Error;

use crate::endpoint::{Endpoint, EndpointRouter};

/// Errors produced while computing a [`PartitionPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// At least one worker is required.
    #[error("worker count must be greater than 0")]
    NoWorkers,

    /// Fewer accounts than workers, so some worker would own no account.
    #[error("{accounts} accounts cannot be spread over {workers} workers")]
    NotEnoughAccounts {
        /// Number of available accounts.
        accounts: usize,
        /// Number of requested workers.
        workers: usize,
    },
}

/// Work statically assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkAssignment {
    /// Index of the worker, also used to pick its endpoint.
    pub worker_id: usize,
    /// Ledger indices of the accounts the worker exclusively owns.
    pub accounts: Range<usize>,
    /// Node endpoint the worker submits to.
    pub endpoint: Endpoint,
    /// Private transaction manager endpoint, when private submission is enabled.
    pub private_endpoint: Option<Endpoint>,
    /// Number of rounds; each round submits one transaction per owned account.
    pub rounds: u64,
}

impl WorkAssignment {
    /// Returns the number of transactions this worker will submit.
    pub fn planned_transactions(&self) -> u64 {
        self.accounts.len() as u64 * self.rounds
    }
}

/// Work distribution for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    /// Number of accounts each worker owns.
    pub accounts_per_worker: usize,
    /// Number of rounds each worker executes.
    pub rounds_per_worker: u64,
    /// Number of accounts in the ledger.
    pub num_accounts: usize,
    /// Number of transactions requested.
    pub requested: u64,
    /// Per-worker assignments, ordered by worker id.
    pub assignments: Vec<WorkAssignment>,
}

impl PartitionPlan {
    /// Returns the number of transactions the plan actually issues.
    ///
    /// Integer division may leave this below [`Self::requested`].
    pub fn realized(&self) -> u64 {
        self.assignments.len() as u64 * self.accounts_per_worker as u64 * self.rounds_per_worker
    }

    /// Returns how many requested transactions the plan will not issue.
    pub fn shortfall(&self) -> u64 {
        self.requested.saturating_sub(self.realized())
    }

    /// Returns the number of accounts left without a worker.
    pub fn unused_accounts(&self) -> usize {
        self.num_accounts - self.assignments.len() * self.accounts_per_worker
    }
}

/// Computes [`PartitionPlan`]s.
#[derive(Debug, Clone)]
pub struct Partitioner {
    router: EndpointRouter,
    private_router: Option<EndpointRouter>,
}

impl Partitioner {
    /// Creates a partitioner resolving worker endpoints through `router`, and
    /// private manager endpoints through `private_router` when given.
    pub const fn new(router: EndpointRouter, private_router: Option<EndpointRouter>) -> Self {
        Self { router, private_router }
    }

    /// Splits `num_accounts` accounts over `num_workers` workers, each running
    /// enough rounds to approach `target` transactions in total.
    pub fn plan(
        &self,
        num_accounts: usize,
        num_workers: usize,
        target: u64,
    ) -> Result<PartitionPlan, PartitionError> {
        let (accounts_per_worker, rounds_per_worker) =
            split_counts(num_accounts, num_workers, target)?;

        let assignments = (0..num_workers)
            .map(|worker_id| {
                let first = worker_id * accounts_per_worker;
                WorkAssignment {
                    worker_id,
                    accounts: first..first + accounts_per_worker,
                    endpoint: self.router.resolve(worker_id),
                    private_endpoint: self.private_router.as_ref().map(|r| r.resolve(worker_id)),
                    rounds: rounds_per_worker,
                }
            })
            .collect();

        Ok(PartitionPlan {
            accounts_per_worker,
            rounds_per_worker,
            num_accounts,
            requested: target,
            assignments,
        })
    }
}

/// Returns `(accounts_per_worker, rounds_per_worker)`.
fn split_counts(
    num_accounts: usize,
    num_workers: usize,
    target: u64,
) -> Result<(usize, u64), PartitionError> {
    if num_workers == 0 {
        return Err(PartitionError::NoWorkers);
    }
    let accounts_per_worker = num_accounts / num_workers;
    if accounts_per_worker == 0 {
        return Err(PartitionError::NotEnoughAccounts {
            accounts: num_accounts,
            workers: num_workers,
        });
    }
    let rounds_per_worker = target / (num_workers as u64 * accounts_per_worker as u64);
    Ok((accounts_per_worker, rounds_per_worker))
}
