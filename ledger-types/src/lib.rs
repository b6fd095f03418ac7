//! # Ledger Types
//!
//! Domain types, balance rules and port traits for the wallet ledger.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Wallet, Transaction, catalog records) and
//!   the balance validator
//! - `ports/` - Trait definitions that storage and notification adapters must implement
//! - `dto/` - Request and view types for callers of the ledger service
//! - `error/` - Domain and repository error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Client, ClientId, Currency, CurrencyId, FundId, InvestmentFund, Transaction, TransactionId,
    TransactionNotice, TransactionStatus, Wallet, WalletId, validator,
};
pub use dto::*;
pub use error::{ErrorKind, LedgerError, RepoError};
pub use ports::{
    ClientLookup, CommitReceipt, CurrencyLookup, InvestmentFundLookup, LedgerCommit,
    LedgerRepository, NotificationSink, NotifyError, StatusChange, TransactionStore, UnitOfWork,
    WalletStore, WalletWrite,
};
pub use rust_decimal::Decimal;
