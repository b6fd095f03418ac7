//! Wallet storage port.

use crate::domain::{ClientId, CurrencyId, Wallet, WalletId};
use crate::error::RepoError;

/// Storage for wallet rows.
///
/// Writes are conditional: creation only succeeds when no wallet exists for
/// the `(client, currency)` pair, and updates only succeed when the stored
/// version equals the caller's expected version.
#[async_trait::async_trait]
pub trait WalletStore: Send + Sync {
    /// Gets the wallet for a client and currency.
    async fn get_wallet_by_client_and_currency(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
    ) -> Result<Option<Wallet>, RepoError>;

    /// Gets a wallet by ID.
    async fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, RepoError>;

    /// Inserts `wallet` unless one already exists for its client and currency.
    ///
    /// Returns the stored row: `wallet` itself when it was inserted, or the
    /// existing row when another writer got there first.
    async fn create_wallet_if_absent(&self, wallet: Wallet) -> Result<Wallet, RepoError>;

    /// Replaces the stored wallet when its version equals `expected_version`.
    ///
    /// On success the stored version becomes `expected_version + 1` and
    /// `true` is returned. A version mismatch returns `false` and writes nothing.
    async fn compare_and_swap_wallet(
        &self,
        wallet: &Wallet,
        expected_version: u64,
    ) -> Result<bool, RepoError>;

    /// Lists all wallets owned by a client.
    async fn list_wallets_for_client(&self, client_id: &ClientId)
    -> Result<Vec<Wallet>, RepoError>;
}
