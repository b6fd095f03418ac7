//! Transaction domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{ClientId, CurrencyId, FundId};
use super::wallet::WalletId;
use crate::error::LedgerError;

/// Unique identifier for a Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle state of a transaction.
///
/// `Active` is the only initial state; the single allowed transition is
/// `Active -> Inactive`, performed by a fund reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Active,
    Inactive,
}

impl AsRef<str> for TransactionStatus {
    fn as_ref(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(format!("Unknown transaction status: {}", other)),
        }
    }
}

/// A recorded money movement.
///
/// Written once in the `Active` state. The only later change is the status
/// flip to `Inactive` when an investment is reversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    pub client_id: ClientId,
    pub currency_id: CurrencyId,
    /// Strictly positive amount
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub description: String,
    /// Wallet resolved for the transaction's client and currency
    pub wallet_id: Option<WalletId>,
    /// Fund the money was invested in, if any
    pub investment_fund_id: Option<FundId>,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency token guarding the status flip
    pub version: u64,
}

impl Transaction {
    /// Creates a new active transaction.
    ///
    /// # Validation
    /// - Amount must be strictly positive
    /// - A blank fund id is stored as no fund
    pub fn new(
        client_id: ClientId,
        currency_id: CurrencyId,
        amount: Decimal,
        description: impl Into<String>,
        wallet_id: Option<WalletId>,
        investment_fund_id: Option<FundId>,
    ) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        Ok(Self {
            id: TransactionId::new(),
            client_id,
            currency_id,
            amount,
            status: TransactionStatus::Active,
            description: description.into(),
            wallet_id,
            investment_fund_id: investment_fund_id.filter(|id| !id.is_blank()),
            created_at: Utc::now(),
            version: 0,
        })
    }

    /// Returns true while the transaction has not been reversed.
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Returns the fund this transaction invested in, ignoring blank ids.
    pub fn fund_id(&self) -> Option<&FundId> {
        self.investment_fund_id.as_ref().filter(|id| !id.is_blank())
    }

    /// Marks the transaction as reversed.
    pub fn deactivate(&mut self) {
        self.status = TransactionStatus::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_transaction_is_active() {
        let tx = Transaction::new(
            ClientId::new("c1"),
            CurrencyId::new("usd"),
            dec!(200.00),
            "Investment",
            Some(WalletId::new()),
            Some(FundId::new("f1")),
        )
        .unwrap();

        assert!(tx.is_active());
        assert_eq!(tx.fund_id(), Some(&FundId::new("f1")));
        assert_eq!(tx.version, 0);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let result = Transaction::new(
            ClientId::new("c1"),
            CurrencyId::new("usd"),
            Decimal::ZERO,
            "",
            None,
            None,
        );
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_blank_fund_id_is_dropped() {
        let tx = Transaction::new(
            ClientId::new("c1"),
            CurrencyId::new("usd"),
            dec!(1),
            "",
            None,
            Some(FundId::new("")),
        )
        .unwrap();
        assert!(tx.investment_fund_id.is_none());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!(
            "INACTIVE".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Inactive
        );
        assert!("DONE".parse::<TransactionStatus>().is_err());
    }
}
