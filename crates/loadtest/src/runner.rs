//! Fans assignments out to concurrent workers and aggregates their results.

use std::{fmt, sync::Arc, time::Duration};

use alloy_primitives::TxKind;
use alloy_signer_local::PrivateKeySigner;
use tokio::{task::JoinHandle, time::Instant};
use tracing::{error, info, warn};

use crate::{
    accounts::AccountLedger,
    confirm::{Confirmation, Confirmer},
    contract::CallDefinition,
    error::{LoadTestError, LoadTestResult, WorkerError},
    partition::PartitionPlan,
    rpc::{ClientFactory, NetworkClient},
    stats::RunStats,
    submitter::{Worker, WorkerReport, WorkerSettings},
    tx::{TxParams, sign_public},
};

/// Aggregate counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Transactions the plan schedules.
    pub planned: u64,
    /// Transactions requested by the configuration.
    pub requested: u64,
    /// Transactions accepted by a node.
    pub submitted: u64,
    /// Transactions confirmed with a success receipt.
    pub confirmed: u64,
    /// Transactions with a failed receipt.
    pub on_chain_failures: u64,
    /// Transactions without a receipt after every poll.
    pub inconclusive: u64,
}

impl RunTotals {
    fn from_stats(plan: &PartitionPlan, stats: &RunStats) -> Self {
        Self {
            planned: plan.realized(),
            requested: plan.requested,
            submitted: stats.submitted(),
            confirmed: stats.confirmed(),
            on_chain_failures: stats.on_chain_failures(),
            inconclusive: stats.inconclusive(),
        }
    }

    /// Returns the share of submitted transactions that confirmed, between 0.0 and 1.0.
    pub fn success_rate(&self) -> f64 {
        if self.submitted == 0 {
            return 0.0;
        }
        self.confirmed as f64 / self.submitted as f64
    }
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunReport {
    /// Aggregate counts.
    pub totals: RunTotals,
    /// Reports of the workers that completed, ordered by worker id.
    pub workers: Vec<WorkerReport>,
    /// Errors of the workers that did not complete, ordered by worker id.
    pub worker_errors: Vec<WorkerError>,
    /// Ledger accounts no worker owned.
    pub unused_accounts: usize,
    /// Wall time from the first spawn to the last join.
    pub elapsed: Duration,
}

impl RunReport {
    /// Returns true when every worker completed and no confirmation failed.
    pub fn is_success(&self) -> bool {
        self.worker_errors.is_empty() &&
            self.totals.on_chain_failures == 0 &&
            self.totals.inconclusive == 0
    }

    /// Returns the number of workers that stopped on their own failure, as
    /// opposed to halting on a failed confirmation.
    pub fn aborted_workers(&self) -> usize {
        self.worker_errors.iter().filter(|err| err.is_terminal()).count()
    }

    /// Returns submitted transactions per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.totals.submitted as f64 / secs
    }

    /// Converts an unsuccessful report into [`LoadTestError::RunFailed`].
    pub fn into_result(self) -> LoadTestResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(LoadTestError::RunFailed {
            failed_workers: self.worker_errors.len(),
            on_chain_failures: self.totals.on_chain_failures,
            inconclusive: self.totals.inconclusive,
        })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = &self.totals;
        write!(
            f,
            "completed: {} of {} planned ({} requested), confirmed: {}, failed on chain: {}, \
             inconclusive: {}, success rate: {:.1}%, failed workers: {} ({} aborted), \
             {:.1} tx/s over {:?}",
            totals.submitted,
            totals.planned,
            totals.requested,
            totals.confirmed,
            totals.on_chain_failures,
            totals.inconclusive,
            totals.success_rate() * 100.0,
            self.worker_errors.len(),
            self.aborted_workers(),
            self.throughput(),
            self.elapsed,
        )
    }
}

/// Runs a [`PartitionPlan`] with one task per assignment.
#[derive(Debug)]
pub struct Runner<F> {
    factory: F,
    settings: Arc<WorkerSettings>,
}

impl<F: ClientFactory> Runner<F> {
    /// Creates a runner opening worker clients through `factory`.
    pub fn new(factory: F, settings: WorkerSettings) -> Self {
        Self { factory, settings: Arc::new(settings) }
    }

    /// Executes `plan` with the accounts of `ledger`.
    ///
    /// Every worker runs to completion; a failing worker never cancels its
    /// siblings. Worker failures are collected in the report. Counters start
    /// from zero on every call.
    pub async fn run(
        &self,
        plan: &PartitionPlan,
        ledger: AccountLedger,
    ) -> LoadTestResult<RunReport> {
        if plan.shortfall() > 0 {
            warn!(
                requested = plan.requested,
                realized = plan.realized(),
                shortfall = plan.shortfall(),
                "Requested transaction count is not a multiple of workers * accounts per worker"
            );
        }
        if plan.unused_accounts() > 0 {
            warn!(unused = plan.unused_accounts(), "Accounts left without a worker");
        }

        let owned = ledger.split(plan)?;
        info!(
            workers = plan.assignments.len(),
            accounts_per_worker = plan.accounts_per_worker,
            rounds = plan.rounds_per_worker,
            realized = plan.realized(),
            "Starting load"
        );

        let stats = Arc::new(RunStats::new());
        let start = Instant::now();
        let mut handles: Vec<(usize, JoinHandle<Result<WorkerReport, WorkerError>>)> =
            Vec::with_capacity(plan.assignments.len());
        let mut worker_errors = Vec::new();

        for (assignment, accounts) in plan.assignments.iter().zip(owned) {
            let worker = assignment.worker_id;
            let opened =
                self.factory.open(&assignment.endpoint, assignment.private_endpoint.as_ref());
            let client = match opened {
                Ok(client) => client,
                Err(source) => {
                    error!(
                        worker,
                        endpoint = %assignment.endpoint,
                        error = %source,
                        "Failed to open client"
                    );
                    worker_errors.push(WorkerError::Connect { worker, source });
                    continue;
                }
            };

            let task = Worker::new(
                assignment.clone(),
                accounts,
                client,
                Arc::clone(&self.settings),
                Arc::clone(&stats),
            );
            handles.push((worker, tokio::spawn(task.run())));
        }

        let mut workers = Vec::with_capacity(handles.len());
        for (worker, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => workers.push(report),
                Ok(Err(err)) => {
                    error!(worker, error = %err, "Worker failed");
                    worker_errors.push(err);
                }
                Err(join) => {
                    error!(worker, error = %join, "Worker task did not complete");
                    worker_errors.push(WorkerError::Join { worker, reason: join.to_string() });
                }
            }
        }
        worker_errors.sort_by_key(WorkerError::worker);

        let report = RunReport {
            totals: RunTotals::from_stats(plan, &stats),
            workers,
            worker_errors,
            unused_accounts: plan.unused_accounts(),
            elapsed: start.elapsed(),
        };

        info!(
            submitted = report.totals.submitted,
            confirmed = report.totals.confirmed,
            on_chain_failures = report.totals.on_chain_failures,
            inconclusive = report.totals.inconclusive,
            failed_workers = report.worker_errors.len(),
            aborted_workers = report.aborted_workers(),
            elapsed = ?report.elapsed,
            tps = report.throughput(),
            "Load finished"
        );
        Ok(report)
    }
}

/// Sends a single call from `signer` with a freshly read pending nonce and
/// confirms it.
pub async fn transact_once<C>(
    client: &C,
    signer: &PrivateKeySigner,
    call: &CallDefinition,
    params: TxParams,
    confirmer: &Confirmer,
) -> LoadTestResult<Confirmation>
where
    C: NetworkClient + ?Sized,
{
    let nonce = client.pending_nonce(signer.address()).await?;
    let signed = sign_public(signer, params, nonce, TxKind::Call(call.target), call.input.clone())?;
    let tx_hash = client.send_raw_transaction(signed.raw).await?;
    info!(%tx_hash, from = %signer.address(), nonce, "Transaction sent");

    let confirmation = confirmer.confirm(client, tx_hash).await;
    info!(
        %tx_hash,
        outcome = ?confirmation.outcome,
        attempts = confirmation.attempts,
        "Transaction confirmation finished"
    );
    Ok(confirmation)
}
