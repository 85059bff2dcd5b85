//! Async trait definitions for the network clients used by the workers.

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use super::{error::RpcResult, types::ReceiptStatus};
use crate::endpoint::Endpoint;

/// Client bound to one node endpoint and, optionally, one private
/// transaction manager endpoint.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Gets the chain id reported by the node.
    async fn chain_id(&self) -> RpcResult<u64>;

    /// Gets the next nonce the node expects from `address`, including
    /// transactions still pending in its pool.
    async fn pending_nonce(&self, address: Address) -> RpcResult<u64>;

    /// Submits a signed, encoded transaction via `eth_sendRawTransaction`.
    async fn send_raw_transaction(&self, raw: Bytes) -> RpcResult<TxHash>;

    /// Submits a signed private transaction via `eth_sendRawPrivateTransaction`,
    /// restricting its payload to `private_for`.
    async fn send_raw_private_transaction(
        &self,
        raw: Bytes,
        private_for: &[String],
    ) -> RpcResult<TxHash>;

    /// Stores a call payload on the private transaction manager and returns
    /// the hash that replaces it as transaction input.
    async fn store_private_payload(&self, payload: Bytes) -> RpcResult<Bytes>;

    /// Gets the execution status of a transaction, `None` while no receipt exists.
    async fn receipt_status(&self, hash: TxHash) -> RpcResult<Option<ReceiptStatus>>;
}

/// Opens [`NetworkClient`]s. Each worker opens its own client.
pub trait ClientFactory: Send + Sync {
    /// The client type produced by this factory.
    type Client: NetworkClient + 'static;

    /// Opens a client for `endpoint` with an optional private transaction
    /// manager endpoint.
    fn open(&self, endpoint: &Endpoint, private: Option<&Endpoint>) -> RpcResult<Self::Client>;
}
