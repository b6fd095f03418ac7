//! Atomic multi-record commit port.
//!
//! A [`LedgerCommit`] bundles every write of one ledger operation. Adapters
//! MUST apply it atomically: all preconditions are checked, then either every
//! write becomes visible or none does.

use crate::domain::{Transaction, TransactionId, TransactionStatus, Wallet};
use crate::error::RepoError;

/// A wallet replacement guarded by the version the caller read.
#[derive(Debug, Clone)]
pub struct WalletWrite {
    pub wallet: Wallet,
    pub expected_version: u64,
}

/// A transaction status flip guarded by the status and version the caller read.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub transaction_id: TransactionId,
    pub expected_status: TransactionStatus,
    pub new_status: TransactionStatus,
    pub expected_version: u64,
}

/// The writes of one unit of work.
#[derive(Debug, Clone, Default)]
pub struct LedgerCommit {
    pub wallet: Option<WalletWrite>,
    pub new_transaction: Option<Transaction>,
    pub status_change: Option<StatusChange>,
}

impl LedgerCommit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_wallet(mut self, wallet: Wallet, expected_version: u64) -> Self {
        self.wallet = Some(WalletWrite {
            wallet,
            expected_version,
        });
        self
    }

    pub fn insert_transaction(mut self, transaction: Transaction) -> Self {
        self.new_transaction = Some(transaction);
        self
    }

    pub fn change_status(
        mut self,
        transaction: &Transaction,
        expected_status: TransactionStatus,
        new_status: TransactionStatus,
    ) -> Self {
        self.status_change = Some(StatusChange {
            transaction_id: transaction.id,
            expected_status,
            new_status,
            expected_version: transaction.version,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.wallet.is_none() && self.new_transaction.is_none() && self.status_change.is_none()
    }
}

/// Rows as stored after a successful commit, versions included.
#[derive(Debug, Clone, Default)]
pub struct CommitReceipt {
    pub wallet: Option<Wallet>,
    pub transaction: Option<Transaction>,
}

#[async_trait::async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Applies every write in `commit` atomically.
    ///
    /// Returns `RepoError::Conflict` when any version or status precondition
    /// fails; nothing is written in that case.
    async fn commit(&self, commit: LedgerCommit) -> Result<CommitReceipt, RepoError>;
}
