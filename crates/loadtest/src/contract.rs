//! Bindings for the `GetSetAdd` contract targeted by the load.

use alloy_primitives::{Address, Bytes, TxKind, U256, hex};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, sol};
use tracing::info;

use crate::{
    confirm::Confirmer,
    error::{LoadTestError, LoadTestResult},
    rpc::NetworkClient,
    tx::{TxParams, sign_public},
};

sol! {
    interface GetSetAdd {
        function add(uint256 x) external;
        function set(uint256 x) external;
        function get() external view returns (uint256 retVal);
    }
}

const GET_SET_ADD_BYTECODE_HEX: &str = include_str!("get_set_add_bytecode.hex");

/// Encodes a call to `GetSetAdd.add(x)`.
pub fn encode_add_call(x: u64) -> Bytes {
    Bytes::from(GetSetAdd::addCall { x: U256::from(x) }.abi_encode())
}

/// Returns the `GetSetAdd` creation bytecode.
pub fn deploy_bytecode() -> LoadTestResult<Bytes> {
    hex::decode(GET_SET_ADD_BYTECODE_HEX.trim())
        .map(Bytes::from)
        .map_err(|e| LoadTestError::Deploy(format!("invalid contract bytecode: {e}")))
}

/// The state-mutating call every worker submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDefinition {
    /// Contract receiving the call.
    pub target: Address,
    /// ABI encoded call data.
    pub input: Bytes,
}

impl CallDefinition {
    /// Calls `add(x)` on the contract at `target`.
    pub fn add(target: Address, x: u64) -> Self {
        Self { target, input: encode_add_call(x) }
    }
}

/// Deploys `GetSetAdd` from `deployer` and waits for the deployment to be confirmed.
pub async fn deploy<C>(
    client: &C,
    deployer: &PrivateKeySigner,
    params: TxParams,
    confirmer: &Confirmer,
) -> LoadTestResult<Address>
where
    C: NetworkClient + ?Sized,
{
    let nonce = client.pending_nonce(deployer.address()).await?;
    let call = sign_public(deployer, params, nonce, TxKind::Create, deploy_bytecode()?)?;

    client.send_raw_transaction(call.raw).await?;
    info!(tx_hash = %call.hash, deployer = %deployer.address(), nonce, "Deploying GetSetAdd");

    let confirmation = confirmer.confirm(client, call.hash).await;
    if !confirmation.outcome.is_success() {
        return Err(LoadTestError::Deploy(format!(
            "deployment {} ended {:?} after {} attempts",
            call.hash, confirmation.outcome, confirmation.attempts
        )));
    }

    let address = deployer.address().create(nonce);
    info!(%address, "GetSetAdd deployed");
    Ok(address)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{rpc::ReceiptStatus, test_utils::MockNetworkClient};

    const PARAMS: TxParams = TxParams { chain_id: 10, gas_limit: 500_000_000 };

    #[test]
    fn test_encode_add_call() {
        let calldata = encode_add_call(3);
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(&calldata[..4], GetSetAdd::addCall::SELECTOR.as_slice());
        assert_eq!(calldata[35], 3);
    }

    #[test]
    fn test_deploy_bytecode() {
        let bytecode = deploy_bytecode().unwrap();
        assert!(!bytecode.is_empty());
        assert_eq!(&bytecode[..4], &[0x60, 0x80, 0x60, 0x40]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_returns_create_address() {
        let deployer = PrivateKeySigner::random();
        let client = MockNetworkClient::with_chain_id(10);
        client.set_pending_nonce(deployer.address(), 4);
        client.set_default_receipt(Some(ReceiptStatus::Success));

        let confirmer = Confirmer::new(3, Duration::from_secs(1));
        let address = deploy(&client, &deployer, PARAMS, &confirmer).await.unwrap();

        assert_eq!(address, deployer.address().create(4));
        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, None);
        assert_eq!(sent[0].nonce, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_fails_when_reverted() {
        let deployer = PrivateKeySigner::random();
        let client = MockNetworkClient::with_chain_id(10);
        client.set_default_receipt(Some(ReceiptStatus::Failed));

        let confirmer = Confirmer::new(3, Duration::from_secs(1));
        let result = deploy(&client, &deployer, PARAMS, &confirmer).await;

        assert!(matches!(result, Err(LoadTestError::Deploy(_))));
    }
}
