//! Transaction storage port.

use crate::domain::{ClientId, Transaction, TransactionId, TransactionStatus};
use crate::error::RepoError;

/// Storage for transaction records.
///
/// Records are written once; afterwards only the status may change, and
/// only through a conditional write.
#[async_trait::async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new transaction.
    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction, RepoError>;

    /// Gets a transaction by ID.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError>;

    /// Sets the status to `new_status` when the stored status and version
    /// equal the expected ones. Returns `false` and writes nothing otherwise.
    async fn compare_and_swap_status(
        &self,
        id: TransactionId,
        expected_status: TransactionStatus,
        new_status: TransactionStatus,
        expected_version: u64,
    ) -> Result<bool, RepoError>;

    /// Lists transactions for a client, newest first.
    async fn list_transactions_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Transaction>, RepoError>;

    /// Lists transactions in the given status, newest first.
    async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepoError>;
}
