//! In-memory repository adapter.
//!
//! Catalog rows live in `DashMap`s. Wallets and transactions share one
//! `RwLock`, so a [`LedgerCommit`] is validated and applied under a single
//! write guard and is therefore atomic.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use ledger_types::{
    Client, ClientId, ClientLookup, CommitReceipt, Currency, CurrencyId, CurrencyLookup, FundId,
    InvestmentFund, InvestmentFundLookup, LedgerCommit, RepoError, StatusChange, Transaction,
    TransactionId, TransactionStatus, TransactionStore, UnitOfWork, Wallet, WalletId, WalletStore,
    WalletWrite,
};

use crate::CatalogAdmin;

#[derive(Default)]
struct LedgerState {
    wallets: HashMap<WalletId, Wallet>,
    wallet_keys: HashMap<(ClientId, CurrencyId), WalletId>,
    transactions: HashMap<TransactionId, Transaction>,
}

impl LedgerState {
    fn check_wallet(&self, write: &WalletWrite) -> Result<(), RepoError> {
        let stored = self
            .wallets
            .get(&write.wallet.id)
            .ok_or(RepoError::NotFound)?;
        if stored.version != write.expected_version {
            return Err(RepoError::Conflict(format!(
                "wallet {} is at version {}, expected {}",
                stored.id, stored.version, write.expected_version
            )));
        }
        Ok(())
    }

    fn check_status(&self, change: &StatusChange) -> Result<(), RepoError> {
        let stored = self
            .transactions
            .get(&change.transaction_id)
            .ok_or(RepoError::NotFound)?;
        if stored.status != change.expected_status || stored.version != change.expected_version {
            return Err(RepoError::Conflict(format!(
                "transaction {} is {} at version {}, expected {} at version {}",
                stored.id,
                stored.status,
                stored.version,
                change.expected_status,
                change.expected_version
            )));
        }
        Ok(())
    }

    fn put_wallet(&mut self, mut wallet: Wallet, expected_version: u64) -> Wallet {
        wallet.version = expected_version + 1;
        self.wallets.insert(wallet.id, wallet.clone());
        wallet
    }

    fn put_status(&mut self, change: &StatusChange) -> Option<Transaction> {
        let stored = self.transactions.get_mut(&change.transaction_id)?;
        stored.status = change.new_status;
        stored.version = change.expected_version + 1;
        Some(stored.clone())
    }
}

/// Repository keeping every record in process memory.
#[derive(Default)]
pub struct MemoryRepo {
    clients: DashMap<ClientId, Client>,
    currencies: DashMap<CurrencyId, Currency>,
    funds: DashMap<FundId, InvestmentFund>,
    ledger: RwLock<LedgerState>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, RepoError> {
        self.ledger
            .read()
            .map_err(|_| RepoError::Database("ledger lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, RepoError> {
        self.ledger
            .write()
            .map_err(|_| RepoError::Database("ledger lock poisoned".into()))
    }
}

fn newest_first(mut rows: Vec<Transaction>) -> Vec<Transaction> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog lookups
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ClientLookup for MemoryRepo {
    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>, RepoError> {
        Ok(self.clients.get(id).map(|c| c.clone()))
    }
}

#[async_trait]
impl CurrencyLookup for MemoryRepo {
    async fn get_currency(&self, id: &CurrencyId) -> Result<Option<Currency>, RepoError> {
        Ok(self.currencies.get(id).map(|c| c.clone()))
    }
}

#[async_trait]
impl InvestmentFundLookup for MemoryRepo {
    async fn get_fund(&self, id: &FundId) -> Result<Option<InvestmentFund>, RepoError> {
        Ok(self.funds.get(id).map(|f| f.clone()))
    }
}

#[async_trait]
impl CatalogAdmin for MemoryRepo {
    async fn upsert_client(&self, client: Client) -> Result<(), RepoError> {
        self.clients.insert(client.id.clone(), client);
        Ok(())
    }

    async fn upsert_currency(&self, currency: Currency) -> Result<(), RepoError> {
        self.currencies.insert(currency.id.clone(), currency);
        Ok(())
    }

    async fn upsert_fund(&self, fund: InvestmentFund) -> Result<(), RepoError> {
        self.funds.insert(fund.id.clone(), fund);
        Ok(())
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool, RepoError> {
        let mut state = self.write()?;
        match state.wallets.remove(&id) {
            Some(wallet) => {
                state
                    .wallet_keys
                    .remove(&(wallet.client_id, wallet.currency_id));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl WalletStore for MemoryRepo {
    async fn get_wallet_by_client_and_currency(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
    ) -> Result<Option<Wallet>, RepoError> {
        let state = self.read()?;
        Ok(state
            .wallet_keys
            .get(&(client_id.clone(), currency_id.clone()))
            .and_then(|id| state.wallets.get(id))
            .cloned())
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, RepoError> {
        Ok(self.read()?.wallets.get(&id).cloned())
    }

    async fn create_wallet_if_absent(&self, wallet: Wallet) -> Result<Wallet, RepoError> {
        let mut state = self.write()?;
        let key = (wallet.client_id.clone(), wallet.currency_id.clone());

        if let Some(existing) = state.wallet_keys.get(&key).and_then(|id| state.wallets.get(id)) {
            debug!(wallet_id = %existing.id, "Wallet already exists for pair");
            return Ok(existing.clone());
        }

        state.wallet_keys.insert(key, wallet.id);
        state.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn compare_and_swap_wallet(
        &self,
        wallet: &Wallet,
        expected_version: u64,
    ) -> Result<bool, RepoError> {
        let mut state = self.write()?;
        let write = WalletWrite {
            wallet: wallet.clone(),
            expected_version,
        };
        match state.check_wallet(&write) {
            Ok(()) => {
                state.put_wallet(write.wallet, expected_version);
                Ok(true)
            }
            Err(RepoError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_wallets_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Wallet>, RepoError> {
        let state = self.read()?;
        let mut wallets: Vec<Wallet> = state
            .wallets
            .values()
            .filter(|w| &w.client_id == client_id)
            .cloned()
            .collect();
        wallets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(wallets)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transactions
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionStore for MemoryRepo {
    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction, RepoError> {
        let mut state = self.write()?;
        if state.transactions.contains_key(&transaction.id) {
            return Err(RepoError::Conflict(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        state
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        Ok(self.read()?.transactions.get(&id).cloned())
    }

    async fn compare_and_swap_status(
        &self,
        id: TransactionId,
        expected_status: TransactionStatus,
        new_status: TransactionStatus,
        expected_version: u64,
    ) -> Result<bool, RepoError> {
        let mut state = self.write()?;
        let change = StatusChange {
            transaction_id: id,
            expected_status,
            new_status,
            expected_version,
        };
        match state.check_status(&change) {
            Ok(()) => Ok(state.put_status(&change).is_some()),
            Err(RepoError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_transactions_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Transaction>, RepoError> {
        let state = self.read()?;
        Ok(newest_first(
            state
                .transactions
                .values()
                .filter(|t| &t.client_id == client_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepoError> {
        let state = self.read()?;
        Ok(newest_first(
            state
                .transactions
                .values()
                .filter(|t| t.status == status)
                .cloned()
                .collect(),
        ))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UnitOfWork for MemoryRepo {
    async fn commit(&self, commit: LedgerCommit) -> Result<CommitReceipt, RepoError> {
        let mut state = self.write()?;

        // Validate everything before touching anything.
        if let Some(write) = &commit.wallet {
            state.check_wallet(write)?;
        }
        if let Some(tx) = &commit.new_transaction {
            if state.transactions.contains_key(&tx.id) {
                return Err(RepoError::Conflict(format!(
                    "transaction {} already exists",
                    tx.id
                )));
            }
        }
        if let Some(change) = &commit.status_change {
            state.check_status(change)?;
        }

        let mut receipt = CommitReceipt::default();

        if let Some(write) = commit.wallet {
            receipt.wallet = Some(state.put_wallet(write.wallet, write.expected_version));
        }
        if let Some(tx) = commit.new_transaction {
            state.transactions.insert(tx.id, tx.clone());
            receipt.transaction = Some(tx);
        }
        if let Some(change) = commit.status_change {
            receipt.transaction = state.put_status(&change);
        }

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wallet() -> Wallet {
        Wallet::new(ClientId::new("c1"), CurrencyId::new("usd"))
    }

    fn transaction(wallet: &Wallet) -> Transaction {
        Transaction::new(
            wallet.client_id.clone(),
            wallet.currency_id.clone(),
            dec!(200),
            "invest",
            Some(wallet.id),
            Some(FundId::new("f1")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_wallet_if_absent_keeps_first() {
        let repo = MemoryRepo::new();
        let first = repo.create_wallet_if_absent(wallet()).await.unwrap();
        let second = repo.create_wallet_if_absent(wallet()).await.unwrap();

        assert_eq!(first.id, second.id);
        let all = repo
            .list_wallets_for_client(&ClientId::new("c1"))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_compare_and_swap_wallet() {
        let repo = MemoryRepo::new();
        let mut stored = repo.create_wallet_if_absent(wallet()).await.unwrap();
        stored.update_balance(dec!(10)).unwrap();

        assert!(repo.compare_and_swap_wallet(&stored, 0).await.unwrap());
        // Same expected version again is stale now.
        assert!(!repo.compare_and_swap_wallet(&stored, 0).await.unwrap());

        let fetched = repo.get_wallet(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.version, 1);
        assert_eq!(fetched.balance(), dec!(10));
    }

    #[tokio::test]
    async fn test_compare_and_swap_status() {
        let repo = MemoryRepo::new();
        let w = repo.create_wallet_if_absent(wallet()).await.unwrap();
        let tx = repo.create_transaction(transaction(&w)).await.unwrap();

        let flipped = repo
            .compare_and_swap_status(tx.id, TransactionStatus::Active, TransactionStatus::Inactive, 0)
            .await
            .unwrap();
        assert!(flipped);

        let again = repo
            .compare_and_swap_status(tx.id, TransactionStatus::Active, TransactionStatus::Inactive, 0)
            .await
            .unwrap();
        assert!(!again);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let repo = MemoryRepo::new();
        let mut w = repo.create_wallet_if_absent(wallet()).await.unwrap();
        w.update_balance(dec!(50)).unwrap();

        // Stale wallet version: the transaction must not be inserted either.
        let tx = transaction(&w);
        let result = repo
            .commit(LedgerCommit::new().update_wallet(w.clone(), 7).insert_transaction(tx.clone()))
            .await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
        assert!(repo.get_transaction(tx.id).await.unwrap().is_none());
        let stored = repo.get_wallet(w.id).await.unwrap().unwrap();
        assert_eq!(stored.balance(), dec!(0));
    }

    #[tokio::test]
    async fn test_commit_returns_bumped_versions() {
        let repo = MemoryRepo::new();
        let mut w = repo.create_wallet_if_absent(wallet()).await.unwrap();
        w.update_balance(dec!(50)).unwrap();
        let tx = transaction(&w);

        let receipt = repo
            .commit(LedgerCommit::new().update_wallet(w, 0).insert_transaction(tx.clone()))
            .await
            .unwrap();

        assert_eq!(receipt.wallet.unwrap().version, 1);
        assert_eq!(receipt.transaction.unwrap().id, tx.id);
    }

    #[tokio::test]
    async fn test_list_transactions_by_status() {
        let repo = MemoryRepo::new();
        let w = repo.create_wallet_if_absent(wallet()).await.unwrap();
        let a = repo.create_transaction(transaction(&w)).await.unwrap();
        repo.create_transaction(transaction(&w)).await.unwrap();
        repo.compare_and_swap_status(a.id, TransactionStatus::Active, TransactionStatus::Inactive, 0)
            .await
            .unwrap();

        let active = repo
            .list_transactions_by_status(TransactionStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_ne!(active[0].id, a.id);
    }

    #[tokio::test]
    async fn test_delete_wallet_frees_pair() {
        let repo = MemoryRepo::new();
        let w = repo.create_wallet_if_absent(wallet()).await.unwrap();
        assert!(repo.delete_wallet(w.id).await.unwrap());
        assert!(
            repo.get_wallet_by_client_and_currency(&w.client_id, &w.currency_id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
