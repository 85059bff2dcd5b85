//! Configuration types and validation for a load test run.

use std::time::Duration;

use alloy_primitives::Address;
use thiserror::Error;
use url::Url;

use crate::{
    confirm::Confirmer,
    endpoint::EndpointRouter,
    logging::LogConfig,
    partition::Partitioner,
};

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid URL format.
    #[error("invalid {field} URL: {reason}")]
    InvalidUrl {
        /// The field name that contains the invalid URL.
        field: &'static str,
        /// The reason the URL is invalid.
        reason: String,
    },
    /// A field value is out of the allowed range.
    #[error("{field} must be {constraint}, got {value}")]
    OutOfRange {
        /// The field name that is out of range.
        field: &'static str,
        /// The constraint description.
        constraint: &'static str,
        /// The actual value.
        value: String,
    },
    /// A private key could not be parsed.
    #[error("invalid private key #{index}: {reason}")]
    InvalidKey {
        /// Position of the key in the configured list.
        index: usize,
        /// The reason the key is invalid.
        reason: String,
    },
}

/// When workers poll for the receipts of their submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmPolicy {
    /// Submit only.
    #[default]
    None,
    /// Confirm every hash of a round before starting the next one.
    EveryRound,
    /// Confirm every hash once all rounds are submitted.
    EndOfRun,
}

impl ConfirmPolicy {
    /// Derives the policy from the two command line switches.
    ///
    /// Per-round checking already confirms every transaction, so it wins when
    /// both are set.
    pub const fn from_flags(check_batch_receipts: bool, confirm_at_end: bool) -> Self {
        match (check_batch_receipts, confirm_at_end) {
            (true, _) => Self::EveryRound,
            (false, true) => Self::EndOfRun,
            (false, false) => Self::None,
        }
    }
}

/// What a worker does when a confirmation is not a success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the failing worker with a validation error. Other workers keep
    /// running and the run reports the failure once all of them are joined.
    Halt,
    /// Record the failure and keep going.
    #[default]
    Count,
}

impl FailurePolicy {
    /// Maps the `halt-on-unconfirmed` switch to a policy.
    pub const fn from_halt(halt: bool) -> Self {
        if halt { Self::Halt } else { Self::Count }
    }
}

/// Receipt polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmConfig {
    /// Upper bound on a single receipt poll.
    pub expected_latency: Duration,
    /// Maximum number of receipt polls per transaction.
    pub receipt_retries: u32,
    /// When to confirm.
    pub policy: ConfirmPolicy,
    /// What to do with unconfirmed transactions.
    pub on_failure: FailurePolicy,
}

impl ConfirmConfig {
    /// Builds the [`Confirmer`] described by this configuration.
    pub const fn confirmer(&self) -> Confirmer {
        Confirmer::new(self.receipt_retries, self.expected_latency)
    }
}

/// Private transaction configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyConfig {
    /// Base URL of the private transaction manager.
    pub endpoint: Url,
    /// Public keys of the recipients of every private transaction.
    pub private_for: Vec<String>,
}

/// Key material for the run.
#[derive(Clone, Default)]
pub struct KeyConfig {
    /// Hex private key deploying the contract.
    pub deploy_key: Option<String>,
    /// Hex private keys of the sending accounts.
    pub from_keys: Vec<String>,
    /// Number of random accounts generated in addition to `from_keys`.
    pub generated: usize,
}

impl std::fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyConfig")
            .field("deploy_key", &self.deploy_key.as_ref().map(|_| "[REDACTED]"))
            .field("from_keys", &self.from_keys.len())
            .field("generated", &self.generated)
            .finish()
    }
}

/// Validated configuration of a load test.
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    /// Base node endpoint. Worker `i` uses port `base + i % max_nodes`.
    pub node_endpoint: Url,
    /// Number of node ports workers are spread over.
    pub max_nodes: u16,
    /// Private transaction settings, when private submission is enabled.
    pub privacy: Option<PrivacyConfig>,
    /// Number of concurrent workers.
    pub num_workers: usize,
    /// Requested number of transactions.
    pub num_transactions: u64,
    /// Gas limit of load transactions.
    pub gas_limit: u64,
    /// Gas limit of the deployment transaction.
    pub deploy_gas_limit: u64,
    /// Chain id used for signing. Queried from the node when unset.
    pub chain_id: Option<u64>,
    /// Already deployed contract. Deployment is skipped when set.
    pub contract: Option<Address>,
    /// Receipt polling.
    pub confirm: ConfirmConfig,
    /// Key material.
    pub keys: KeyConfig,
    /// Logging configuration.
    pub log: LogConfig,
}

impl LoadTestConfig {
    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.node_endpoint, "node-endpoint")?;
        if let Some(privacy) = &self.privacy {
            validate_url(&privacy.endpoint, "private-endpoint")?;
        }

        non_zero("threads", self.num_workers as u64)?;
        non_zero("accounts", self.num_accounts() as u64)?;
        non_zero("max-nodes", u64::from(self.max_nodes))?;
        non_zero("receipt-retries", u64::from(self.confirm.receipt_retries))?;
        non_zero("gas-limit", self.gas_limit)?;

        if self.confirm.expected_latency.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "expected-latency",
                constraint: "greater than 0",
                value: "0s".to_string(),
            });
        }

        if self.contract.is_none() && self.keys.deploy_key.is_none() {
            return Err(ConfigError::OutOfRange {
                field: "deploy-key",
                constraint: "set when no contract address is given",
                value: "none".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the number of accounts the run will use.
    pub fn num_accounts(&self) -> usize {
        self.keys.from_keys.len() + self.keys.generated
    }

    /// Builds the partitioner for the configured endpoints.
    pub fn partitioner(&self) -> Result<Partitioner, ConfigError> {
        let router =
            EndpointRouter::new(self.node_endpoint.clone(), self.max_nodes, "node-endpoint")?;
        let private_router = self
            .privacy
            .as_ref()
            .map(|p| EndpointRouter::new(p.endpoint.clone(), self.max_nodes, "private-endpoint"))
            .transpose()?;
        Ok(Partitioner::new(router, private_router))
    }

    /// Returns the recipients of private transactions, empty for public runs.
    pub fn private_for(&self) -> &[String] {
        self.privacy.as_ref().map(|p| p.private_for.as_slice()).unwrap_or_default()
    }
}

/// Validate that a URL has a scheme and host.
pub fn validate_url(url: &Url, field: &'static str) -> Result<(), ConfigError> {
    if url.scheme().is_empty() {
        return Err(ConfigError::InvalidUrl { field, reason: "missing scheme".to_string() });
    }

    if url.host().is_none() {
        return Err(ConfigError::InvalidUrl { field, reason: "missing host".to_string() });
    }

    Ok(())
}

fn non_zero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::OutOfRange {
            field,
            constraint: "greater than 0",
            value: value.to_string(),
        });
    }
    Ok(())
}
