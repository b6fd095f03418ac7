//! Error types for the wallet ledger.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{ClientId, CurrencyId, FundId, TransactionId};

/// Stable classification of a [`LedgerError`], for callers mapping
/// failures onto their own response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ClientNotFound,
    CurrencyNotFound,
    FundNotFound,
    FundInactive,
    CurrencyMismatch,
    BelowMinimumInvestment,
    InsufficientFunds,
    InvalidAmount,
    TransactionNotFound,
    NotAssociatedWithFund,
    AlreadyReversed,
    ConcurrencyConflict,
    PersistenceFailure,
    Cancelled,
}

/// Failures returned by ledger operations.
///
/// Every variant means no wallet balance or transaction status was changed.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    #[error("Currency not found: {0}")]
    CurrencyNotFound(CurrencyId),

    #[error("Investment fund not found: {0}")]
    FundNotFound(FundId),

    #[error("Investment fund is not active: {0}")]
    FundInactive(FundId),

    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: CurrencyId, got: CurrencyId },

    #[error("Investment amount {amount} is below the fund minimum of {minimum}")]
    BelowMinimumInvestment { amount: Decimal, minimum: Decimal },

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: Decimal, requested: Decimal },

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Transaction {0} is not associated with an investment fund")]
    NotAssociatedWithFund(TransactionId),

    #[error("Transaction {0} is already inactive")]
    AlreadyReversed(TransactionId),

    #[error("Concurrent modification: {0}")]
    ConcurrencyConflict(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Operation cancelled before commit")]
    Cancelled,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClientNotFound(_) => ErrorKind::ClientNotFound,
            Self::CurrencyNotFound(_) => ErrorKind::CurrencyNotFound,
            Self::FundNotFound(_) => ErrorKind::FundNotFound,
            Self::FundInactive(_) => ErrorKind::FundInactive,
            Self::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            Self::BelowMinimumInvestment { .. } => ErrorKind::BelowMinimumInvestment,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::TransactionNotFound(_) => ErrorKind::TransactionNotFound,
            Self::NotAssociatedWithFund(_) => ErrorKind::NotAssociatedWithFund,
            Self::AlreadyReversed(_) => ErrorKind::AlreadyReversed,
            Self::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
            Self::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Storage I/O failures are the only ones worth retrying from outside.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_))
    }
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    /// A conditional write found a different version or status than expected.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<RepoError> for LedgerError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => LedgerError::ConcurrencyConflict(msg),
            RepoError::NotFound => LedgerError::PersistenceFailure("Entity not found".into()),
            RepoError::Database(e) | RepoError::Transaction(e) | RepoError::Serialization(e) => {
                LedgerError::PersistenceFailure(e)
            }
        }
    }
}
