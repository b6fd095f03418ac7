//! Notification port.
//!
//! Notifications are sent after a commit and are best-effort: a failing sink
//! never undoes or blocks a ledger change.

use crate::domain::TransactionNotice;

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Recipient rejected notice: {0}")]
    Rejected(String),
}

#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Tells the client about a committed transaction.
    async fn notify_transaction(&self, notice: &TransactionNotice) -> Result<(), NotifyError>;
}
