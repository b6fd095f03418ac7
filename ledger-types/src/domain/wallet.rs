//! Wallet domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{ClientId, CurrencyId};
use crate::error::LedgerError;

/// Unique identifier for a Wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(Uuid);

impl WalletId {
    /// Creates a new random WalletId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a WalletId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WalletId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A per-currency cash balance held by one client.
///
/// There is at most one wallet per `(client_id, currency_id)` pair. The
/// balance never drops below zero; every mutation goes through the
/// [`validator`](super::validator) functions or [`Wallet::update_balance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier
    pub id: WalletId,
    /// Owning client
    pub client_id: ClientId,
    /// Currency the balance is denominated in
    pub currency_id: CurrencyId,
    /// Current balance, exact decimal
    pub(crate) balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every conditional write
    pub version: u64,
}

impl Wallet {
    /// Creates an empty wallet for the given client and currency.
    pub fn new(client_id: ClientId, currency_id: CurrencyId) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            client_id,
            currency_id,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Reconstructs a wallet from stored fields.
    ///
    /// # Errors
    /// Returns `InvalidAmount` for a negative stored balance.
    pub fn from_parts(
        id: WalletId,
        client_id: ClientId,
        currency_id: CurrencyId,
        balance: Decimal,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        version: u64,
    ) -> Result<Self, LedgerError> {
        if balance < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(balance));
        }
        Ok(Self {
            id,
            client_id,
            currency_id,
            balance,
            created_at,
            updated_at,
            version,
        })
    }

    /// Returns the current balance.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Overwrites the balance with an administrative value.
    pub fn update_balance(&mut self, new_balance: Decimal) -> Result<(), LedgerError> {
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(new_balance));
        }
        self.balance = new_balance;
        self.touch();
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn wallet() -> Wallet {
        Wallet::new(ClientId::new("client-1"), CurrencyId::new("usd"))
    }

    #[test]
    fn test_wallet_creation() {
        let wallet = wallet();
        assert_eq!(wallet.balance(), Decimal::ZERO);
        assert_eq!(wallet.version, 0);
        assert_eq!(wallet.created_at, wallet.updated_at);
    }

    #[test]
    fn test_update_balance() {
        let mut wallet = wallet();
        wallet.update_balance(dec!(1000.00)).unwrap();
        assert_eq!(wallet.balance(), dec!(1000.00));
    }

    #[test]
    fn test_update_balance_negative_fails() {
        let mut wallet = wallet();
        let result = wallet.update_balance(dec!(-0.01));
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
        assert_eq!(wallet.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_from_parts_rejects_negative_balance() {
        let now = Utc::now();
        let result = Wallet::from_parts(
            WalletId::new(),
            ClientId::new("c"),
            CurrencyId::new("usd"),
            dec!(-5),
            now,
            now,
            3,
        );
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }
}
