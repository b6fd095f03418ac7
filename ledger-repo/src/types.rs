//! Database row types and their conversion into domain records.
//!
//! Ids, timestamps and decimals are stored as TEXT so the row format is
//! explicit and decimal amounts round-trip exactly.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use ledger_types::{
    Client, ClientId, Currency, CurrencyId, FundId, InvestmentFund, RepoError, Transaction,
    TransactionId, TransactionStatus, Wallet, WalletId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Client row from database.
#[derive(FromRow)]
pub struct DbClient {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub active: i64,
}

/// Currency row from database.
#[derive(FromRow)]
pub struct DbCurrency {
    pub id: String,
    pub name: String,
    pub code: String,
}

/// Investment fund row from database.
#[derive(FromRow)]
pub struct DbFund {
    pub id: String,
    pub name: String,
    pub category: String,
    pub currency_id: String,
    pub min_investment: String,
    pub active: i64,
}

/// Wallet row from database.
#[derive(FromRow)]
pub struct DbWallet {
    pub id: String,
    pub client_id: String,
    pub currency_id: String,
    pub balance: String,
    pub created_at: String,
    pub updated_at: String,
    pub version: i64,
}

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: String,
    pub client_id: String,
    pub currency_id: String,
    pub amount: String,
    pub status: String,
    pub description: String,
    pub wallet_id: Option<String>,
    pub investment_fund_id: Option<String>,
    pub created_at: String,
    pub version: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_decimal(s: &str) -> Result<Decimal, RepoError> {
    Decimal::from_str(s).map_err(|e| RepoError::Serialization(format!("{}: {}", s, e)))
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Serialization(e.to_string()))
}

pub fn parse_version(v: i64) -> Result<u64, RepoError> {
    u64::try_from(v).map_err(|_| RepoError::Serialization(format!("negative version {}", v)))
}

pub fn format_version(v: u64) -> Result<i64, RepoError> {
    i64::try_from(v).map_err(|_| RepoError::Serialization(format!("version {} overflows", v)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbClient {
    pub fn into_domain(self) -> Client {
        Client {
            id: ClientId::new(self.id),
            name: self.name,
            email: self.email,
            active: self.active != 0,
        }
    }
}

impl DbCurrency {
    pub fn into_domain(self) -> Currency {
        Currency::new(self.id, self.name, self.code)
    }
}

impl DbFund {
    pub fn into_domain(self) -> Result<InvestmentFund, RepoError> {
        Ok(InvestmentFund {
            id: FundId::new(self.id),
            name: self.name,
            category: self.category,
            currency_id: CurrencyId::new(self.currency_id),
            min_investment: parse_decimal(&self.min_investment)?,
            active: self.active != 0,
        })
    }
}

impl DbWallet {
    /// Convert database row to domain Wallet.
    pub fn into_domain(self) -> Result<Wallet, RepoError> {
        let id = WalletId::from_str(&self.id).map_err(|e| RepoError::Serialization(e.to_string()))?;

        Wallet::from_parts(
            id,
            ClientId::new(self.client_id),
            CurrencyId::new(self.currency_id),
            parse_decimal(&self.balance)?,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
            parse_version(self.version)?,
        )
        .map_err(|e| RepoError::Serialization(e.to_string()))
    }
}

impl DbTransaction {
    /// Convert database row to domain Transaction.
    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        let id = TransactionId::from_str(&self.id)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        let wallet_id = self
            .wallet_id
            .map(|s| WalletId::from_str(&s))
            .transpose()
            .map_err(|e| RepoError::Serialization(e.to_string()))?;

        let status = TransactionStatus::from_str(&self.status).map_err(RepoError::Serialization)?;

        Ok(Transaction {
            id,
            client_id: ClientId::new(self.client_id),
            currency_id: CurrencyId::new(self.currency_id),
            amount: parse_decimal(&self.amount)?,
            status,
            description: self.description,
            wallet_id,
            investment_fund_id: self.investment_fund_id.map(FundId::new),
            created_at: parse_timestamp(&self.created_at)?,
            version: parse_version(self.version)?,
        })
    }
}
