//! Signing accounts and the ledger that hands them out to workers.
//!
//! Every account is owned by exactly one worker for the whole run. The ledger
//! enforces this by moving accounts out when it is split, so no nonce is ever
//! shared or locked.

use std::fmt;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::ConfigError,
    partition::PartitionPlan,
    rpc::{NetworkClient, RpcResult},
};

/// Errors raised when handing accounts out to workers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// An assignment references an account the ledger does not hold.
    #[error("account {index} is out of range for a ledger of {len} accounts")]
    OutOfRange {
        /// Requested account index.
        index: usize,
        /// Number of accounts in the ledger.
        len: usize,
    },

    /// Two assignments reference the same account.
    #[error("account {index} is assigned to more than one worker")]
    AlreadyAssigned {
        /// Account index assigned twice.
        index: usize,
    },
}

/// A signing identity with its next nonce.
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    nonce: u64,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.signer.address())
            .field("nonce", &self.nonce)
            .finish()
    }
}

impl Account {
    /// Creates an account for `signer` with a zero nonce.
    pub const fn new(signer: PrivateKeySigner) -> Self {
        Self { signer, nonce: 0 }
    }

    /// Generates an account with a random key.
    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    /// Returns the account address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Returns the account signer.
    pub const fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Returns the nonce the next transaction must carry.
    pub const fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Sets the nonce, typically to the network's pending count.
    pub const fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    /// Moves to the next nonce after a transaction was accepted.
    pub const fn advance_nonce(&mut self) {
        self.nonce += 1;
    }
}

/// Parses a hex private key, with or without a `0x` prefix.
pub fn parse_private_key(key: &str, index: usize) -> Result<PrivateKeySigner, ConfigError> {
    let trimmed = key.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex.parse::<PrivateKeySigner>()
        .map_err(|e| ConfigError::InvalidKey { index, reason: e.to_string() })
}

/// Builds the ordered account list from provided keys followed by generated ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountSource;

impl AccountSource {
    /// Loads `provided` keys in order, then appends `generated` random accounts.
    pub fn load(&self, provided: &[String], generated: usize) -> Result<Vec<Account>, ConfigError> {
        let mut accounts = Vec::with_capacity(provided.len() + generated);
        for (index, key) in provided.iter().enumerate() {
            accounts.push(Account::new(parse_private_key(key, index)?));
        }
        accounts.extend((0..generated).map(|_| Account::random()));

        info!(provided = provided.len(), generated, "Loaded accounts");
        Ok(accounts)
    }
}

/// Ordered collection of all accounts of a run.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    accounts: Vec<Account>,
}

impl AccountLedger {
    /// Creates a ledger over `accounts`.
    pub const fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Returns the number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the ledger holds no account.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Returns the account at `index`.
    pub fn get(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    /// Returns an iterator over all accounts.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// Sets every account's nonce to the network's pending transaction count.
    pub async fn init_nonces<C>(&mut self, client: &C) -> RpcResult<()>
    where
        C: NetworkClient + ?Sized,
    {
        for account in &mut self.accounts {
            let nonce = client.pending_nonce(account.address()).await?;
            debug!(address = %account.address(), nonce, "Initialized nonce");
            account.set_nonce(nonce);
        }
        Ok(())
    }

    /// Consumes the ledger, moving each assignment's accounts into its own vector.
    ///
    /// The result is ordered like `plan.assignments`. Accounts not covered by
    /// any assignment are dropped.
    pub fn split(self, plan: &PartitionPlan) -> Result<Vec<Vec<Account>>, LedgerError> {
        let len = self.accounts.len();
        let mut slots: Vec<Option<Account>> = self.accounts.into_iter().map(Some).collect();

        plan.assignments
            .iter()
            .map(|assignment| {
                assignment
                    .accounts
                    .clone()
                    .map(|index| -> Result<Account, LedgerError> {
                        slots
                            .get_mut(index)
                            .ok_or(LedgerError::OutOfRange { index, len })?
                            .take()
                            .ok_or(LedgerError::AlreadyAssigned { index })
                    })
                    .collect()
            })
            .collect()
    }
}

impl From<Vec<Account>> for AccountLedger {
    fn from(accounts: Vec<Account>) -> Self {
        Self::new(accounts)
    }
}
