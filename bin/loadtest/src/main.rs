#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/base/base/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cli;

use alloy_primitives::Address;
use base_loadtest::{
    ADD_ARGUMENT, AccountLedger, AccountSource, CallDefinition, ClientFactory, Endpoint,
    HttpClientFactory, HttpNetworkClient, LoadTestConfig, LoadTestError, NetworkClient,
    Runner, TxParams, WorkerSettings, deploy, parse_private_key, transact_once,
};
use clap::Parser;
use cli::{Cli, Command};
use eyre::{Result, WrapErr};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignores errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command;
    let config = LoadTestConfig::try_from(cli)?;
    config.log.init_tracing_subscriber()?;

    match command {
        Command::Run => run(config).await,
        Command::TransactOnce => transact(config).await,
    }
}

/// Deploys the target contract, spreads the accounts over the workers and runs the load.
async fn run(config: LoadTestConfig) -> Result<()> {
    let accounts = AccountSource.load(&config.keys.from_keys, config.keys.generated)?;
    let mut ledger = AccountLedger::from(accounts);
    let plan =
        config.partitioner()?.plan(ledger.len(), config.num_workers, config.num_transactions)?;

    let setup = open_setup_client(&config)?;
    let chain_id = resolve_chain_id(&config, &setup).await?;
    let target = resolve_contract(&config, &setup, chain_id).await?;

    ledger.init_nonces(&setup).await.wrap_err("Failed to read account nonces")?;

    let settings = WorkerSettings {
        call: CallDefinition::add(target, ADD_ARGUMENT),
        params: TxParams { chain_id, gas_limit: config.gas_limit },
        private_for: config.private_for().to_vec(),
        confirm: config.confirm,
    };
    let report = Runner::new(HttpClientFactory, settings).run(&plan, ledger).await?;

    info!(unused_accounts = report.unused_accounts, summary = %report, "Load test complete");
    report.into_result()?;
    Ok(())
}

/// Sends one `add` call from the first configured account and confirms it.
async fn transact(config: LoadTestConfig) -> Result<()> {
    let accounts = AccountSource.load(&config.keys.from_keys, config.keys.generated)?;
    let sender = accounts
        .first()
        .ok_or_else(|| LoadTestError::Setup("no sending account configured".to_string()))?;

    let setup = open_setup_client(&config)?;
    let chain_id = resolve_chain_id(&config, &setup).await?;
    let target = resolve_contract(&config, &setup, chain_id).await?;

    let confirmation = transact_once(
        &setup,
        sender.signer(),
        &CallDefinition::add(target, ADD_ARGUMENT),
        TxParams { chain_id, gas_limit: config.gas_limit },
        &config.confirm.confirmer(),
    )
    .await?;

    if !confirmation.outcome.is_success() {
        eyre::bail!(
            "transaction {} ended {:?} after {} attempts",
            confirmation.tx_hash,
            confirmation.outcome,
            confirmation.attempts
        );
    }
    Ok(())
}

fn open_setup_client(config: &LoadTestConfig) -> Result<HttpNetworkClient> {
    let endpoint = Endpoint::new(config.node_endpoint.clone());
    HttpClientFactory.open(&endpoint, None).wrap_err("Failed to open setup client")
}

async fn resolve_chain_id(config: &LoadTestConfig, client: &HttpNetworkClient) -> Result<u64> {
    if let Some(chain_id) = config.chain_id {
        return Ok(chain_id);
    }
    let chain_id = client.chain_id().await.wrap_err("Failed to query chain id")?;
    info!(chain_id, "Using chain id reported by the node");
    Ok(chain_id)
}

async fn resolve_contract(
    config: &LoadTestConfig,
    client: &HttpNetworkClient,
    chain_id: u64,
) -> Result<Address> {
    if let Some(address) = config.contract {
        return Ok(address);
    }

    let key = config.keys.deploy_key.as_deref().ok_or_else(|| {
        LoadTestError::Setup("a deploy key or contract address is required".to_string())
    })?;
    let deployer = parse_private_key(key, 0)?;
    let confirmer = config.confirm.confirmer();
    let params = TxParams { chain_id, gas_limit: config.deploy_gas_limit };

    Ok(deploy(client, &deployer, params, &confirmer).await?)
}
