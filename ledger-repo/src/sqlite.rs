//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use ledger_types::{
    Client, ClientId, ClientLookup, CommitReceipt, Currency, CurrencyId, CurrencyLookup, FundId,
    InvestmentFund, InvestmentFundLookup, LedgerCommit, RepoError, Transaction, TransactionId,
    TransactionStatus, TransactionStore, UnitOfWork, Wallet, WalletId, WalletStore,
};

use crate::CatalogAdmin;
use crate::types::{DbClient, DbCurrency, DbFund, DbTransaction, DbWallet, format_version};

const WALLET_COLUMNS: &str =
    "id, client_id, currency_id, balance, created_at, updated_at, version";
const TRANSACTION_COLUMNS: &str = "id, client_id, currency_id, amount, status, description, wallet_id, investment_fund_id, created_at, version";

fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Connects and provisions the schema.
    ///
    /// Migrations run here, once, so request paths never check for tables.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to an in-memory database sees its own copy, so
        // keep exactly one alive for the life of the pool.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::raw_sql(ddl).execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }

    async fn fetch_wallet_by_pair(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
    ) -> Result<Option<Wallet>, RepoError> {
        let row: Option<DbWallet> = sqlx::query_as(&format!(
            "SELECT {} FROM wallets WHERE client_id = ? AND currency_id = ?",
            WALLET_COLUMNS
        ))
        .bind(client_id.as_str())
        .bind(currency_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbWallet::into_domain).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ClientLookup for SqliteRepo {
    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>, RepoError> {
        let row: Option<DbClient> =
            sqlx::query_as(r#"SELECT id, name, email, active FROM clients WHERE id = ?"#)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(row.map(DbClient::into_domain))
    }
}

#[async_trait]
impl CurrencyLookup for SqliteRepo {
    async fn get_currency(&self, id: &CurrencyId) -> Result<Option<Currency>, RepoError> {
        let row: Option<DbCurrency> =
            sqlx::query_as(r#"SELECT id, name, code FROM currencies WHERE id = ?"#)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(row.map(DbCurrency::into_domain))
    }
}

#[async_trait]
impl InvestmentFundLookup for SqliteRepo {
    async fn get_fund(&self, id: &FundId) -> Result<Option<InvestmentFund>, RepoError> {
        let row: Option<DbFund> = sqlx::query_as(
            r#"SELECT id, name, category, currency_id, min_investment, active FROM investment_funds WHERE id = ?"#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbFund::into_domain).transpose()
    }
}

#[async_trait]
impl CatalogAdmin for SqliteRepo {
    async fn upsert_client(&self, client: Client) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO clients (id, name, email, active) VALUES (?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email, active = excluded.active"#,
        )
        .bind(client.id.as_str())
        .bind(&client.name)
        .bind(&client.email)
        .bind(client.active as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn upsert_currency(&self, currency: Currency) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO currencies (id, name, code) VALUES (?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET name = excluded.name, code = excluded.code"#,
        )
        .bind(currency.id.as_str())
        .bind(&currency.name)
        .bind(&currency.code)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn upsert_fund(&self, fund: InvestmentFund) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO investment_funds (id, name, category, currency_id, min_investment, active)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET name = excluded.name, category = excluded.category,
                   currency_id = excluded.currency_id, min_investment = excluded.min_investment,
                   active = excluded.active"#,
        )
        .bind(fund.id.as_str())
        .bind(&fund.name)
        .bind(&fund.category)
        .bind(fund.currency_id.as_str())
        .bind(fund.min_investment.to_string())
        .bind(fund.active as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_wallet(&self, id: WalletId) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM wallets WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl WalletStore for SqliteRepo {
    async fn get_wallet_by_client_and_currency(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
    ) -> Result<Option<Wallet>, RepoError> {
        self.fetch_wallet_by_pair(client_id, currency_id).await
    }

    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, RepoError> {
        let row: Option<DbWallet> = sqlx::query_as(&format!(
            "SELECT {} FROM wallets WHERE id = ?",
            WALLET_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbWallet::into_domain).transpose()
    }

    async fn create_wallet_if_absent(&self, wallet: Wallet) -> Result<Wallet, RepoError> {
        // The UNIQUE (client_id, currency_id) constraint arbitrates racing creators.
        sqlx::query(
            r#"INSERT INTO wallets (id, client_id, currency_id, balance, created_at, updated_at, version)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(client_id, currency_id) DO NOTHING"#,
        )
        .bind(wallet.id.to_string())
        .bind(wallet.client_id.as_str())
        .bind(wallet.currency_id.as_str())
        .bind(wallet.balance().to_string())
        .bind(wallet.created_at.to_rfc3339())
        .bind(wallet.updated_at.to_rfc3339())
        .bind(format_version(wallet.version)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.fetch_wallet_by_pair(&wallet.client_id, &wallet.currency_id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn compare_and_swap_wallet(
        &self,
        wallet: &Wallet,
        expected_version: u64,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE wallets SET balance = ?, updated_at = ?, version = version + 1
               WHERE id = ? AND version = ?"#,
        )
        .bind(wallet.balance().to_string())
        .bind(wallet.updated_at.to_rfc3339())
        .bind(wallet.id.to_string())
        .bind(format_version(expected_version)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_wallets_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Wallet>, RepoError> {
        let rows: Vec<DbWallet> = sqlx::query_as(&format!(
            "SELECT {} FROM wallets WHERE client_id = ? ORDER BY created_at ASC",
            WALLET_COLUMNS
        ))
        .bind(client_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbWallet::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transactions
// ─────────────────────────────────────────────────────────────────────────────

async fn insert_transaction<'e, E>(executor: E, tx: &Transaction) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"INSERT INTO transactions (id, client_id, currency_id, amount, status, description, wallet_id, investment_fund_id, created_at, version)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(tx.id.to_string())
    .bind(tx.client_id.as_str())
    .bind(tx.currency_id.as_str())
    .bind(tx.amount.to_string())
    .bind(tx.status.to_string())
    .bind(&tx.description)
    .bind(tx.wallet_id.map(|id| id.to_string()))
    .bind(tx.investment_fund_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(tx.created_at.to_rfc3339())
    .bind(format_version(tx.version)?)
    .execute(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RepoError::Conflict(format!("transaction {} already exists", tx.id))
        } else {
            db_err(e)
        }
    })?;

    Ok(())
}

#[async_trait]
impl TransactionStore for SqliteRepo {
    async fn create_transaction(&self, transaction: Transaction) -> Result<Transaction, RepoError> {
        insert_transaction(&self.pool, &transaction).await?;
        Ok(transaction)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn compare_and_swap_status(
        &self,
        id: TransactionId,
        expected_status: TransactionStatus,
        new_status: TransactionStatus,
        expected_version: u64,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE transactions SET status = ?, version = version + 1
               WHERE id = ? AND status = ? AND version = ?"#,
        )
        .bind(new_status.to_string())
        .bind(id.to_string())
        .bind(expected_status.to_string())
        .bind(format_version(expected_version)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_transactions_for_client(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE client_id = ? ORDER BY created_at DESC",
            TRANSACTION_COLUMNS
        ))
        .bind(client_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn list_transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE status = ? ORDER BY created_at DESC",
            TRANSACTION_COLUMNS
        ))
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UnitOfWork for SqliteRepo {
    async fn commit(&self, commit: LedgerCommit) -> Result<CommitReceipt, RepoError> {
        // Returning early drops `db_tx`, which rolls everything back.
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let mut receipt = CommitReceipt::default();

        if let Some(write) = commit.wallet {
            let result = sqlx::query(
                r#"UPDATE wallets SET balance = ?, updated_at = ?, version = version + 1
                   WHERE id = ? AND version = ?"#,
            )
            .bind(write.wallet.balance().to_string())
            .bind(write.wallet.updated_at.to_rfc3339())
            .bind(write.wallet.id.to_string())
            .bind(format_version(write.expected_version)?)
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

            if result.rows_affected() == 0 {
                return Err(RepoError::Conflict(format!(
                    "wallet {} changed since version {}",
                    write.wallet.id, write.expected_version
                )));
            }

            let mut wallet = write.wallet;
            wallet.version = write.expected_version + 1;
            receipt.wallet = Some(wallet);
        }

        if let Some(tx) = commit.new_transaction {
            insert_transaction(&mut *db_tx, &tx).await?;
            receipt.transaction = Some(tx);
        }

        if let Some(change) = commit.status_change {
            let result = sqlx::query(
                r#"UPDATE transactions SET status = ?, version = version + 1
                   WHERE id = ? AND status = ? AND version = ?"#,
            )
            .bind(change.new_status.to_string())
            .bind(change.transaction_id.to_string())
            .bind(change.expected_status.to_string())
            .bind(format_version(change.expected_version)?)
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

            if result.rows_affected() == 0 {
                return Err(RepoError::Conflict(format!(
                    "transaction {} is no longer {} at version {}",
                    change.transaction_id, change.expected_status, change.expected_version
                )));
            }

            let row: DbTransaction = sqlx::query_as(&format!(
                "SELECT {} FROM transactions WHERE id = ?",
                TRANSACTION_COLUMNS
            ))
            .bind(change.transaction_id.to_string())
            .fetch_one(&mut *db_tx)
            .await
            .map_err(db_err)?;
            receipt.transaction = Some(row.into_domain()?);
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(receipt)
    }
}
