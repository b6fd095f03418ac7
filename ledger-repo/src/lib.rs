//! # Ledger Repository
//!
//! Concrete repository implementations (adapters) for the wallet ledger.
//! Every adapter implements the port traits from `ledger-types`; `Repo`
//! picks one from a database URL.

use async_trait::async_trait;
use ledger_types::{
    Client, ClientId, ClientLookup, CommitReceipt, Currency, CurrencyId, CurrencyLookup, FundId,
    InvestmentFund, InvestmentFundLookup, LedgerCommit, RepoError, Transaction, TransactionId,
    TransactionStatus, TransactionStore, UnitOfWork, Wallet, WalletId, WalletStore,
};

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
mod types;

#[cfg(feature = "sqlite")]
#[cfg(test)]
mod sqlite_tests;

pub use memory::MemoryRepo;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// Administrative writes owned by the catalog collaborators.
///
/// The ledger service never calls these; they exist to seed catalogs and to
/// remove wallets out of band.
#[async_trait]
pub trait CatalogAdmin: Send + Sync {
    async fn upsert_client(&self, client: Client) -> Result<(), RepoError>;

    async fn upsert_currency(&self, currency: Currency) -> Result<(), RepoError>;

    async fn upsert_fund(&self, fund: InvestmentFund) -> Result<(), RepoError>;

    /// Removes a wallet row. Returns false when it did not exist.
    async fn delete_wallet(&self, id: WalletId) -> Result<bool, RepoError>;
}

/// Unified repository wrapper over the available adapters.
pub enum Repo {
    Memory(MemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteRepo),
}

/// Build and initialize a repository from a database URL.
///
/// `memory://` selects the in-memory adapter. `sqlite:` URLs (with the
/// `sqlite` feature) connect and run migrations before returning.
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://ledger.db?mode=rwc").await?;
/// let scratch = build_repo("memory://").await?;
/// ```
pub async fn build_repo(database_url: &str) -> anyhow::Result<Repo> {
    Repo::new(database_url).await
}

impl Repo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        if database_url.starts_with("memory:") {
            return Ok(Self::Memory(MemoryRepo::new()));
        }

        if database_url.starts_with("sqlite:") {
            return Self::connect_sqlite(database_url).await;
        }

        anyhow::bail!("Unsupported database URL: {}", database_url)
    }

    #[cfg(feature = "sqlite")]
    async fn connect_sqlite(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::Sqlite(SqliteRepo::new(database_url).await?))
    }

    #[cfg(not(feature = "sqlite"))]
    async fn connect_sqlite(database_url: &str) -> anyhow::Result<Self> {
        anyhow::bail!(
            "{} needs the `sqlite` feature of ledger-repo",
            database_url
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Port implementations for Repo (delegation)
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! delegate {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait]
impl ClientLookup for Repo {
    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>, RepoError> {
        delegate!(self, r => r.get_client(id).await)
    }
}

#[async_trait]
impl CurrencyLookup for Repo {
    async fn get_currency(&self, id: &CurrencyId) -> Result<Option<Currency>, RepoError> {
        delegate!(self, r => r.get_currency(id).await)
    }
}

#[async_trait]
impl InvestmentFundLookup for Repo {
    async fn get_fund(&self, id: &FundId) -> Result<Option<InvestmentFund>, RepoError> {
        delegate!(self, r => r.get_fund(id).await)
    }
}

#[async_trait]
impl CatalogAdmin for Repo {
    async fn upsert_client(&self, client: Client) -> Result<(), RepoError> {
        delegate!(self, r => r.upsert_client(client).await)
    }

    async fn upsert_currency(&self, currency: Currency) -> Result<(), RepoError> {
        delegate!(self, r => r.upsert_currency(currency).await)
    }

    async fn upsert_fund(&self, fund: InvestmentFund) -> Result<(), RepoError> {
        delegate!(self, r => r.upsert_fund(fund).await)
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool, RepoError> {
        delegate!(self, r => r.delete_wallet(id).await)
    }
}

#[async_trait]
impl WalletStore for Repo {
    async fn get_wallet_by_client_and_currency(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
    ) -> Result<Option<Wallet>, RepoError> {
        delegate!(self, r => r.get_wallet_by_client_and_currency(client_id, currency_id).await)
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, RepoError> {
        delegate!(self, r => r.get_wallet(id).await)
    }

    async fn create_wallet_if_absent(&self, wallet: Wallet) -> Result<Wallet, RepoError> {
        delegate!(self, r => r.create_wallet_if_absent(wallet).await)
    }

    async fn compare_and_swap_wallet(
        &self,
        wallet: &Wallet,
        expected_version: u64,
    ) -> Result<bool, RepoError> {
        delegate!(self, r => r.compare_and_swap_wallet(wallet, expected_version).await)
    }

    async fn list_wallets_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Wallet>, RepoError> {
        delegate!(self, r => r.list_wallets_for_client(client_id).await)
    }
}

#[async_trait]
impl TransactionStore for Repo {
    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction, RepoError> {
        delegate!(self, r => r.create_transaction(transaction).await)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        delegate!(self, r => r.get_transaction(id).await)
    }

    async fn compare_and_swap_status(
        &self,
        id: TransactionId,
        expected_status: TransactionStatus,
        new_status: TransactionStatus,
        expected_version: u64,
    ) -> Result<bool, RepoError> {
        delegate!(self, r => r
            .compare_and_swap_status(id, expected_status, new_status, expected_version)
            .await)
    }

    async fn list_transactions_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Transaction>, RepoError> {
        delegate!(self, r => r.list_transactions_for_client(client_id).await)
    }

    async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepoError> {
        delegate!(self, r => r.list_transactions_by_status(status).await)
    }
}

#[async_trait]
impl UnitOfWork for Repo {
    async fn commit(&self, commit: LedgerCommit) -> Result<CommitReceipt, RepoError> {
        delegate!(self, r => r.commit(commit).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_memory_repo() {
        let repo = build_repo("memory://").await.unwrap();
        assert!(matches!(repo, Repo::Memory(_)));
    }

    #[tokio::test]
    async fn test_unknown_scheme_rejected() {
        let result = build_repo("postgres://localhost/ledger").await;
        assert!(result.is_err());
    }
}
