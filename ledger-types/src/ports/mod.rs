//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The ledger service depends on these traits, not concrete implementations.

mod catalog;
mod notification;
mod transaction;
mod unit_of_work;
mod wallet;

pub use catalog::{ClientLookup, CurrencyLookup, InvestmentFundLookup};
pub use notification::{NotificationSink, NotifyError};
pub use transaction::TransactionStore;
pub use unit_of_work::{CommitReceipt, LedgerCommit, StatusChange, UnitOfWork, WalletWrite};
pub use wallet::WalletStore;

/// Everything the ledger service needs from storage, as one bound.
///
/// Implemented automatically for any type providing all the individual ports.
pub trait LedgerRepository:
    ClientLookup
    + CurrencyLookup
    + InvestmentFundLookup
    + WalletStore
    + TransactionStore
    + UnitOfWork
    + Send
    + Sync
    + 'static
{
}

impl<T> LedgerRepository for T where
    T: ClientLookup
        + CurrencyLookup
        + InvestmentFundLookup
        + WalletStore
        + TransactionStore
        + UnitOfWork
        + Send
        + Sync
        + 'static
{
}
