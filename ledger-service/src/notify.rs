//! Notification sinks.
//!
//! Notices are dispatched after a commit on a detached task; a failed
//! delivery is logged and never reaches the ledger.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use ledger_types::{NotificationSink, NotifyError, TransactionNotice};

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify_transaction(&self, notice: &TransactionNotice) -> Result<(), NotifyError> {
        info!(
            transaction_id = %notice.transaction_id,
            client_id = %notice.client_id,
            kind = %notice.kind,
            amount = %notice.amount,
            currency_id = %notice.currency_id,
            "Transaction notice"
        );
        Ok(())
    }
}

/// POSTs each notice as JSON to a fixed URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    target_url: String,
}

impl WebhookNotifier {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), target_url)
    }

    pub fn with_client(client: reqwest::Client, target_url: impl Into<String>) -> Self {
        Self {
            client,
            target_url: target_url.into(),
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    #[instrument(skip(self, notice), fields(transaction_id = %notice.transaction_id))]
    async fn notify_transaction(&self, notice: &TransactionNotice) -> Result<(), NotifyError> {
        debug!("Sending {} notice to {}", notice.kind, self.target_url);

        let resp = self
            .client
            .post(&self.target_url)
            .json(notice)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(NotifyError::Rejected(format!("HTTP {}", resp.status())));
        }

        Ok(())
    }
}

/// Runs `sink` for `notice` on a detached task.
///
/// The returned handle may be dropped; failures are only logged.
pub fn spawn_notification(
    sink: Arc<dyn NotificationSink>,
    notice: TransactionNotice,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match sink.notify_transaction(&notice).await {
            Ok(()) => debug!(transaction_id = %notice.transaction_id, "Notice delivered"),
            Err(e) => error!(
                transaction_id = %notice.transaction_id,
                "Failed to deliver notice: {}", e
            ),
        }
    })
}
