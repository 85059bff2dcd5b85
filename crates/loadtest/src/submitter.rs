//! Workers submitting the load call from the accounts they own.

use std::sync::Arc;

use alloy_primitives::{TxHash, TxKind};
use alloy_signer_local::PrivateKeySigner;
use tracing::{debug, info, warn};

use crate::{
    accounts::Account,
    config::{ConfirmConfig, ConfirmPolicy, FailurePolicy},
    confirm::{ConfirmOutcome, Confirmer},
    contract::CallDefinition,
    error::WorkerError,
    partition::WorkAssignment,
    rpc::{NetworkClient, RpcError},
    stats::RunStats,
    tx::{SignedCall, TxParams, sign_private, sign_public},
};

/// Settings shared by every worker of a run.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// The call every transaction performs.
    pub call: CallDefinition,
    /// Chain id and gas limit.
    pub params: TxParams,
    /// Recipients of private transactions. Empty for public submission.
    pub private_for: Vec<String>,
    /// Receipt polling.
    pub confirm: ConfirmConfig,
}

/// Counts produced by one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker id.
    pub worker_id: usize,
    /// Transactions accepted by the node.
    pub submitted: u64,
    /// Transactions confirmed with a success receipt.
    pub confirmed: u64,
    /// Transactions with a failed receipt.
    pub on_chain_failures: u64,
    /// Transactions without a receipt after every poll.
    pub inconclusive: u64,
}

impl WorkerReport {
    const fn record(&mut self, outcome: ConfirmOutcome) {
        match outcome {
            ConfirmOutcome::Success => self.confirmed += 1,
            ConfirmOutcome::OnChainFailure => self.on_chain_failures += 1,
            ConfirmOutcome::Inconclusive => self.inconclusive += 1,
        }
    }
}

/// Submits one transaction per owned account per round, sequentially.
#[derive(Debug)]
pub struct Worker<C> {
    assignment: WorkAssignment,
    accounts: Vec<Account>,
    client: C,
    settings: Arc<WorkerSettings>,
    confirmer: Confirmer,
    stats: Arc<RunStats>,
}

impl<C: NetworkClient> Worker<C> {
    /// Creates a worker owning `accounts` and submitting through `client`.
    pub fn new(
        assignment: WorkAssignment,
        accounts: Vec<Account>,
        client: C,
        settings: Arc<WorkerSettings>,
        stats: Arc<RunStats>,
    ) -> Self {
        let confirmer = settings.confirm.confirmer();
        Self { assignment, accounts, client, settings, confirmer, stats }
    }

    /// Runs every round of the assignment.
    ///
    /// Returns at the first refused submission. Under [`FailurePolicy::Halt`]
    /// it also returns at the first confirmation that is not a success.
    pub async fn run(mut self) -> Result<WorkerReport, WorkerError> {
        let worker = self.assignment.worker_id;
        let mut report = WorkerReport { worker_id: worker, ..Default::default() };
        let mut pending = Vec::with_capacity(self.accounts.len());

        info!(
            worker,
            endpoint = %self.assignment.endpoint,
            accounts = self.accounts.len(),
            rounds = self.assignment.rounds,
            "Worker started"
        );

        for round in 0..self.assignment.rounds {
            for index in 0..self.accounts.len() {
                let tx_hash = self.submit(index).await?;
                report.submitted += 1;
                self.stats.record_submitted();
                pending.push(tx_hash);
            }
            debug!(worker, round, submitted = report.submitted, "Round submitted");

            if self.settings.confirm.policy == ConfirmPolicy::EveryRound {
                self.confirm_pending(&mut pending, &mut report).await?;
            }
        }

        if self.settings.confirm.policy == ConfirmPolicy::EndOfRun {
            self.confirm_pending(&mut pending, &mut report).await?;
        }

        info!(
            worker,
            submitted = report.submitted,
            confirmed = report.confirmed,
            on_chain_failures = report.on_chain_failures,
            inconclusive = report.inconclusive,
            "Worker finished"
        );
        Ok(report)
    }

    /// Signs and submits the call from account `index`, advancing its nonce
    /// once the node accepted it.
    async fn submit(&mut self, index: usize) -> Result<TxHash, WorkerError> {
        let account = &self.accounts[index];
        let tx_hash = if self.settings.private_for.is_empty() {
            self.send_public(account).await?
        } else {
            self.send_private(account).await?
        };

        self.accounts[index].advance_nonce();
        Ok(tx_hash)
    }

    async fn send_public(&self, account: &Account) -> Result<TxHash, WorkerError> {
        let call = &self.settings.call;
        let params = self.settings.params;
        let signed = self.sign(account, |signer, nonce| {
            sign_public(signer, params, nonce, TxKind::Call(call.target), call.input.clone())
        })?;

        let tx_hash = self
            .client
            .send_raw_transaction(signed.raw)
            .await
            .map_err(|source| self.submission_error(account, source))?;
        debug!(worker = self.assignment.worker_id, %tx_hash, nonce = account.nonce(), "Submitted");
        Ok(tx_hash)
    }

    async fn send_private(&self, account: &Account) -> Result<TxHash, WorkerError> {
        let call = &self.settings.call;
        let payload_hash = self
            .client
            .store_private_payload(call.input.clone())
            .await
            .map_err(|source| self.submission_error(account, source))?;

        let gas_limit = self.settings.params.gas_limit;
        let signed = self.sign(account, |signer, nonce| {
            sign_private(signer, gas_limit, nonce, call.target, payload_hash)
        })?;

        let tx_hash = self
            .client
            .send_raw_private_transaction(signed.raw, &self.settings.private_for)
            .await
            .map_err(|source| self.submission_error(account, source))?;
        debug!(
            worker = self.assignment.worker_id,
            %tx_hash,
            nonce = account.nonce(),
            "Submitted private"
        );
        Ok(tx_hash)
    }

    fn sign<F>(&self, account: &Account, sign: F) -> Result<SignedCall, WorkerError>
    where
        F: FnOnce(&PrivateKeySigner, u64) -> alloy_signer::Result<SignedCall>,
    {
        sign(account.signer(), account.nonce()).map_err(|source| WorkerError::Signing {
            worker: self.assignment.worker_id,
            account: account.address(),
            source,
        })
    }

    fn submission_error(&self, account: &Account, source: RpcError) -> WorkerError {
        let worker = self.assignment.worker_id;
        let (address, nonce) = (account.address(), account.nonce());
        warn!(worker, account = %address, nonce, error = %source, "Submission refused");
        WorkerError::Submission { worker, account: address, nonce, source }
    }

    async fn confirm_pending(
        &self,
        pending: &mut Vec<TxHash>,
        report: &mut WorkerReport,
    ) -> Result<(), WorkerError> {
        let worker = self.assignment.worker_id;
        for tx_hash in pending.drain(..) {
            let confirmation = self.confirmer.confirm(&self.client, tx_hash).await;
            report.record(confirmation.outcome);
            self.stats.record_outcome(confirmation.outcome);

            if confirmation.outcome.is_success() {
                continue;
            }

            warn!(
                worker,
                %tx_hash,
                outcome = ?confirmation.outcome,
                attempts = confirmation.attempts,
                "Transaction not confirmed"
            );
            if self.settings.confirm.on_failure == FailurePolicy::Halt {
                return Err(WorkerError::Validation {
                    worker,
                    tx_hash,
                    outcome: confirmation.outcome,
                });
            }
        }
        Ok(())
    }
}
