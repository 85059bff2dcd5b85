//! HTTP implementation of [`NetworkClient`] backed by an alloy provider.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_transport_http::Http;
use async_trait::async_trait;
use serde::Serialize;

use super::{
    error::{RpcError, RpcResult},
    private::PrivateManagerClient,
    traits::{ClientFactory, NetworkClient},
    types::ReceiptStatus,
};
use crate::{constants::HTTP_REQUEST_TIMEOUT, endpoint::Endpoint};

/// Shared type alias for the HTTP provider.
pub type HttpProvider = RootProvider<Ethereum>;

/// Second parameter of `eth_sendRawPrivateTransaction`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrivateArgs {
    private_for: Vec<String>,
}

/// [`NetworkClient`] talking JSON-RPC over HTTP to one node, plus an optional
/// private transaction manager.
#[derive(Debug, Clone)]
pub struct HttpNetworkClient {
    provider: HttpProvider,
    private: Option<PrivateManagerClient>,
}

impl HttpNetworkClient {
    /// Creates a client for `endpoint`, with `private` as the private
    /// transaction manager if given.
    pub fn new(endpoint: &Endpoint, private: Option<&Endpoint>) -> RpcResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RpcError::InvalidEndpoint(e.to_string()))?;

        let transport = Http::with_client(http.clone(), endpoint.url().clone());
        let provider = RootProvider::new(RpcClient::new(transport, false));
        let private = private.map(|p| PrivateManagerClient::new(http, p.url().clone()));

        Ok(Self { provider, private })
    }
}

#[async_trait]
impl NetworkClient for HttpNetworkClient {
    async fn chain_id(&self) -> RpcResult<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn pending_nonce(&self, address: Address) -> RpcResult<u64> {
        Ok(self.provider.get_transaction_count(address).pending().await?)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> RpcResult<TxHash> {
        let pending = self.provider.send_raw_transaction(&raw).await?;
        Ok(*pending.tx_hash())
    }

    async fn send_raw_private_transaction(
        &self,
        raw: Bytes,
        private_for: &[String],
    ) -> RpcResult<TxHash> {
        if self.private.is_none() {
            return Err(RpcError::NoPrivateEndpoint);
        }
        let args = PrivateArgs { private_for: private_for.to_vec() };
        Ok(self
            .provider
            .raw_request::<_, TxHash>("eth_sendRawPrivateTransaction".into(), (raw, args))
            .await?)
    }

    async fn store_private_payload(&self, payload: Bytes) -> RpcResult<Bytes> {
        let private = self.private.as_ref().ok_or(RpcError::NoPrivateEndpoint)?;
        private.store_raw(&payload).await
    }

    async fn receipt_status(&self, hash: TxHash) -> RpcResult<Option<ReceiptStatus>> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|r| ReceiptStatus::from_success(r.status())))
    }
}

/// Opens [`HttpNetworkClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    type Client = HttpNetworkClient;

    fn open(&self, endpoint: &Endpoint, private: Option<&Endpoint>) -> RpcResult<Self::Client> {
        HttpNetworkClient::new(endpoint, private)
    }
}
