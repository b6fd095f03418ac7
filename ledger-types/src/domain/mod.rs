//! Domain models for the wallet ledger.

pub mod catalog;
pub mod notice;
pub mod transaction;
pub mod validator;
pub mod wallet;

pub use catalog::{Client, ClientId, Currency, CurrencyId, FundId, InvestmentFund};
pub use notice::TransactionNotice;
pub use transaction::{Transaction, TransactionId, TransactionStatus};
pub use wallet::{Wallet, WalletId};
