//! Read-only catalog lookups.
//!
//! Clients, currencies and funds are owned by catalog collaborators; the
//! ledger only resolves them by id.

use crate::domain::{Client, ClientId, Currency, CurrencyId, FundId, InvestmentFund};
use crate::error::RepoError;

#[async_trait::async_trait]
pub trait ClientLookup: Send + Sync {
    /// Gets a client by ID.
    async fn get_client(&self, id: &ClientId) -> Result<Option<Client>, RepoError>;
}

#[async_trait::async_trait]
pub trait CurrencyLookup: Send + Sync {
    /// Gets a currency by ID.
    async fn get_currency(&self, id: &CurrencyId) -> Result<Option<Currency>, RepoError>;
}

#[async_trait::async_trait]
pub trait InvestmentFundLookup: Send + Sync {
    /// Gets an investment fund by ID.
    async fn get_fund(&self, id: &FundId) -> Result<Option<InvestmentFund>, RepoError>;
}
