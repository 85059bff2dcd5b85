//! Shared test utilities: an in-memory network and a factory handing it out.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy_consensus::{Transaction, TxEnvelope, transaction::SignerRecoverable};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Address, Bytes, TxHash, keccak256};
use async_trait::async_trait;

use crate::{
    endpoint::Endpoint,
    rpc::{ClientFactory, NetworkClient, ReceiptStatus, RpcError, RpcResult},
};

/// A transaction accepted by the mock network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SentTx {
    pub from: Address,
    pub nonce: u64,
    pub hash: TxHash,
    pub to: Option<Address>,
}

#[derive(Debug, Default)]
struct MockState {
    chain_id: u64,
    pending_nonces: HashMap<Address, u64>,
    sent: Vec<SentTx>,
    private_sent: Vec<(Bytes, Vec<String>)>,
    stored_payloads: Vec<Bytes>,
    receipts: HashMap<TxHash, VecDeque<RpcResult<Option<ReceiptStatus>>>>,
    default_receipt: Option<ReceiptStatus>,
    polls: HashMap<TxHash, u32>,
    receipt_delay: Duration,
    rejected_senders: Vec<Address>,
}

/// In-memory network enforcing per-sender nonce order.
///
/// Clones share state, so every worker of a run sees the same network.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockNetworkClient {
    state: Arc<Mutex<MockState>>,
}

impl MockNetworkClient {
    pub(crate) fn with_chain_id(chain_id: u64) -> Self {
        let client = Self::default();
        client.state.lock().unwrap().chain_id = chain_id;
        client
    }

    pub(crate) fn set_pending_nonce(&self, address: Address, nonce: u64) {
        self.state.lock().unwrap().pending_nonces.insert(address, nonce);
    }

    pub(crate) fn push_receipts(
        &self,
        hash: TxHash,
        receipts: impl IntoIterator<Item = RpcResult<Option<ReceiptStatus>>>,
    ) {
        self.state.lock().unwrap().receipts.entry(hash).or_default().extend(receipts);
    }

    /// Receipt returned for hashes without scripted receipts.
    pub(crate) fn set_default_receipt(&self, receipt: Option<ReceiptStatus>) {
        self.state.lock().unwrap().default_receipt = receipt;
    }

    pub(crate) fn set_receipt_delay(&self, delay: Duration) {
        self.state.lock().unwrap().receipt_delay = delay;
    }

    pub(crate) fn reject_sender(&self, address: Address) {
        self.state.lock().unwrap().rejected_senders.push(address);
    }

    pub(crate) fn receipt_polls(&self, hash: TxHash) -> u32 {
        self.state.lock().unwrap().polls.get(&hash).copied().unwrap_or_default()
    }

    pub(crate) fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub(crate) fn private_sent(&self) -> Vec<(Bytes, Vec<String>)> {
        self.state.lock().unwrap().private_sent.clone()
    }

    pub(crate) fn stored_payloads(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().stored_payloads.clone()
    }
}

#[async_trait]
impl NetworkClient for MockNetworkClient {
    async fn chain_id(&self) -> RpcResult<u64> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn pending_nonce(&self, address: Address) -> RpcResult<u64> {
        Ok(self.state.lock().unwrap().pending_nonces.get(&address).copied().unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> RpcResult<TxHash> {
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| RpcError::Rejected(format!("rlp: {e}")))?;
        let from = envelope
            .recover_signer()
            .map_err(|e| RpcError::Rejected(format!("invalid sender: {e}")))?;

        let mut state = self.state.lock().unwrap();
        if state.rejected_senders.contains(&from) {
            return Err(RpcError::Rejected("insufficient funds for gas * price + value".into()));
        }

        let expected = state.pending_nonces.get(&from).copied().unwrap_or_default();
        if envelope.nonce() != expected {
            return Err(RpcError::Rejected(format!(
                "invalid nonce: expected {expected}, got {}",
                envelope.nonce()
            )));
        }
        state.pending_nonces.insert(from, expected + 1);

        let hash = *envelope.tx_hash();
        state.sent.push(SentTx { from, nonce: expected, hash, to: envelope.to() });
        Ok(hash)
    }

    async fn send_raw_private_transaction(
        &self,
        raw: Bytes,
        private_for: &[String],
    ) -> RpcResult<TxHash> {
        let hash = keccak256(&raw);
        self.state.lock().unwrap().private_sent.push((raw, private_for.to_vec()));
        Ok(hash)
    }

    async fn store_private_payload(&self, payload: Bytes) -> RpcResult<Bytes> {
        let digest = keccak256(&payload);
        self.state.lock().unwrap().stored_payloads.push(payload);
        Ok(Bytes::from([digest.as_slice(), digest.as_slice()].concat()))
    }

    async fn receipt_status(&self, hash: TxHash) -> RpcResult<Option<ReceiptStatus>> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            *state.polls.entry(hash).or_default() += 1;
            state.receipt_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        let default = state.default_receipt;
        state.receipts.get_mut(&hash).and_then(VecDeque::pop_front).unwrap_or(Ok(default))
    }
}

/// Factory returning clones of one [`MockNetworkClient`] and recording what was opened.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockClientFactory {
    pub client: MockNetworkClient,
    opened: Arc<Mutex<Vec<(Endpoint, Option<Endpoint>)>>>,
}

impl MockClientFactory {
    pub(crate) fn new(client: MockNetworkClient) -> Self {
        Self { client, opened: Arc::default() }
    }

    pub(crate) fn opened(&self) -> Vec<(Endpoint, Option<Endpoint>)> {
        self.opened.lock().unwrap().clone()
    }
}

impl ClientFactory for MockClientFactory {
    type Client = MockNetworkClient;

    fn open(&self, endpoint: &Endpoint, private: Option<&Endpoint>) -> RpcResult<Self::Client> {
        self.opened.lock().unwrap().push((endpoint.clone(), private.cloned()));
        Ok(self.client.clone())
    }
}
