//! Client for the private transaction manager (Tessera) `storeraw` API.

use alloy_primitives::Bytes;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{RpcError, RpcResult};

#[derive(Debug, Serialize)]
struct StoreRawRequest {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct StoreRawResponse {
    key: String,
}

/// Stores private call payloads on a private transaction manager.
#[derive(Debug, Clone)]
pub struct PrivateManagerClient {
    http: reqwest::Client,
    base: Url,
}

impl PrivateManagerClient {
    /// Creates a client for the manager listening at `base`.
    pub const fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// Stores `payload` and returns the decoded hash the manager assigned to it.
    pub async fn store_raw(&self, payload: &[u8]) -> RpcResult<Bytes> {
        let url = self
            .base
            .join("storeraw")
            .map_err(|e| RpcError::InvalidEndpoint(format!("{}: {e}", self.base)))?;

        let resp = self
            .http
            .post(url)
            .json(&StoreRawRequest { payload: STANDARD.encode(payload) })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::PrivateManager(format!("storeraw returned {status}: {body}")));
        }

        let body: StoreRawResponse = resp.json().await?;
        decode_key(&body.key)
    }
}

fn decode_key(key: &str) -> RpcResult<Bytes> {
    STANDARD
        .decode(key)
        .map(Bytes::from)
        .map_err(|e| RpcError::InvalidResponse(format!("storeraw key is not base64: {e}")))
}
