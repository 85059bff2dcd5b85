#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/base/base/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod accounts;
pub use accounts::{Account, AccountLedger, AccountSource, LedgerError, parse_private_key};

mod config;
pub use config::{
    ConfigError, ConfirmConfig, ConfirmPolicy, FailurePolicy, KeyConfig, LoadTestConfig,
    PrivacyConfig, validate_url,
};

mod confirm;
pub use confirm::{ConfirmOutcome, Confirmation, Confirmer, backoff_base, jitter};

mod constants;
pub use constants::*;

mod contract;
pub use contract::{CallDefinition, GetSetAdd, deploy, deploy_bytecode, encode_add_call};

mod endpoint;
pub use endpoint::{Endpoint, EndpointRouter};

mod error;
pub use error::{LoadTestError, LoadTestResult, WorkerError};

mod logging;
pub use logging::{LogConfig, LogFormat};

mod partition;
pub use partition::{PartitionError, PartitionPlan, Partitioner, WorkAssignment};

mod rpc;
pub use rpc::{
    ClientFactory, HttpClientFactory, HttpNetworkClient, HttpProvider, NetworkClient,
    PrivateManagerClient, ReceiptStatus, RpcError, RpcResult,
};

mod runner;
pub use runner::{RunReport, RunTotals, Runner, transact_once};

mod stats;
pub use stats::RunStats;

mod submitter;
pub use submitter::{Worker, WorkerReport, WorkerSettings};

mod tx;
pub use tx::{SignedCall, TxParams, sign_private, sign_public};

#[cfg(test)]
mod test_utils;
