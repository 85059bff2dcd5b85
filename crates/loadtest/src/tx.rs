//! Construction and signing of the legacy, zero gas price transactions
//! accepted by permissioned networks.

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, TxHash, TxKind, U256, keccak256};
use alloy_rlp::RlpEncodable;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::constants::PRIVATE_TX_V_BASE;

/// A signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCall {
    /// Hash identifying the transaction on the network.
    pub hash: TxHash,
    /// Encoded transaction bytes.
    pub raw: Bytes,
}

/// Parameters shared by all transactions of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    /// Chain id used for replay protection of public transactions.
    pub chain_id: u64,
    /// Gas limit of every transaction.
    pub gas_limit: u64,
}

/// Signs a public transaction with EIP-155 replay protection.
pub fn sign_public(
    signer: &PrivateKeySigner,
    params: TxParams,
    nonce: u64,
    to: TxKind,
    input: Bytes,
) -> alloy_signer::Result<SignedCall> {
    let tx = TxLegacy {
        chain_id: Some(params.chain_id),
        nonce,
        gas_price: 0,
        gas_limit: params.gas_limit,
        to,
        value: U256::ZERO,
        input,
    };

    let signature = signer.sign_hash_sync(&tx.signature_hash())?;
    let signed = tx.into_signed(signature);
    let hash = *signed.hash();
    let raw: Bytes = TxEnvelope::from(signed).encoded_2718().into();

    Ok(SignedCall { hash, raw })
}

/// Wire layout of a Quorum private transaction.
#[derive(Debug, RlpEncodable)]
struct PrivateLegacyTx {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    input: Bytes,
    v: u64,
    r: U256,
    s: U256,
}

/// Signs a private transaction whose input is the payload hash returned by the
/// private transaction manager.
///
/// Private transactions carry no chain id and flag themselves with `v = 37/38`.
pub fn sign_private(
    signer: &PrivateKeySigner,
    gas_limit: u64,
    nonce: u64,
    to: Address,
    payload_hash: Bytes,
) -> alloy_signer::Result<SignedCall> {
    let tx = TxLegacy {
        chain_id: None,
        nonce,
        gas_price: 0,
        gas_limit,
        to: TxKind::Call(to),
        value: U256::ZERO,
        input: payload_hash,
    };

    let signature = signer.sign_hash_sync(&tx.signature_hash())?;
    let fields = PrivateLegacyTx {
        nonce,
        gas_price: 0,
        gas_limit,
        to,
        value: U256::ZERO,
        input: tx.input,
        v: PRIVATE_TX_V_BASE + u64::from(signature.v()),
        r: signature.r(),
        s: signature.s(),
    };

    let raw = Bytes::from(alloy_rlp::encode(&fields));
    Ok(SignedCall { hash: keccak256(&raw), raw })
}
