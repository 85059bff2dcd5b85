//! Types returned by the network clients.

/// Execution status recorded in a transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// The transaction executed successfully (`status == 1`).
    Success,
    /// The transaction was included but reverted.
    Failed,
}

impl ReceiptStatus {
    /// Maps the boolean receipt status onto a [`ReceiptStatus`].
    pub const fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failed }
    }
}
