//! RPC-specific error types.

use alloy_transport::TransportError;
use thiserror::Error;

/// RPC-specific error type.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport error from alloy.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error, e.g. a rejected transaction.
    #[error("Rejected by node: {0}")]
    Rejected(String),

    /// Request timeout.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Invalid response from RPC.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The private transaction manager refused or failed a request.
    #[error("Private transaction manager error: {0}")]
    PrivateManager(String),

    /// A private submission was requested on a client without a private endpoint.
    #[error("no private transaction manager endpoint configured")]
    NoPrivateEndpoint,

    /// The endpoint URL could not be used to build a client.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl RpcError {
    /// Returns true if this error is transient and the operation could be retried.
    ///
    /// Only transport-level failures and timeouts qualify. A node rejecting a
    /// request is a definitive answer.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

impl From<TransportError> for RpcError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::Rejected(payload.message.to_string()),
            None => Self::Transport(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::PrivateManager(err.to_string())
        }
    }
}

/// Result type alias for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(RpcError::Transport("reset".into()).is_retryable());
        assert!(RpcError::Timeout("3s".into()).is_retryable());
        assert!(!RpcError::Rejected("nonce too low".into()).is_retryable());
        assert!(!RpcError::NoPrivateEndpoint.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = RpcError::Rejected("nonce too low".to_string());
        assert_eq!(err.to_string(), "Rejected by node: nonce too low");
    }
}
