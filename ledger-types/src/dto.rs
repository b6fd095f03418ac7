//! Request and view types exchanged with callers of the ledger service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ClientId, CurrencyId, FundId, Transaction, TransactionId, TransactionStatus, Wallet, WalletId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Transaction DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to record a transaction, optionally investing it in a fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTransactionRequest {
    pub client_id: ClientId,
    pub currency_id: CurrencyId,
    /// Exact decimal amount, must be positive
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    /// Fund to invest in; the wallet is only debited when this is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_fund_id: Option<FundId>,
}

impl ProcessTransactionRequest {
    pub fn new(
        client_id: impl Into<ClientId>,
        currency_id: impl Into<CurrencyId>,
        amount: Decimal,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            currency_id: currency_id.into(),
            amount,
            description: String::new(),
            investment_fund_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn into_fund(mut self, fund_id: impl Into<FundId>) -> Self {
        self.investment_fund_id = Some(fund_id.into());
        self
    }

    /// The fund id, ignoring blank values.
    pub fn fund_id(&self) -> Option<&FundId> {
        self.investment_fund_id.as_ref().filter(|id| !id.is_blank())
    }
}

/// Result of a fund reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalOutcome {
    /// The transaction, now inactive
    pub transaction: Transaction,
    /// The credited wallet, when it could be found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<Wallet>,
    /// Set when the transaction referenced a wallet that no longer exists and
    /// the credit was skipped
    pub wallet_missing: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Query views
// ─────────────────────────────────────────────────────────────────────────────

/// A wallet with its catalog names resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletView {
    pub id: WalletId,
    pub client_id: ClientId,
    pub currency_id: CurrencyId,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub client_name: Option<String>,
    pub currency_name: Option<String>,
    pub currency_code: Option<String>,
}

impl WalletView {
    pub fn from_wallet(wallet: &Wallet) -> Self {
        Self {
            id: wallet.id,
            client_id: wallet.client_id.clone(),
            currency_id: wallet.currency_id.clone(),
            balance: wallet.balance(),
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
            client_name: None,
            currency_name: None,
            currency_code: None,
        }
    }
}

/// A transaction with its catalog names resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub date: DateTime<Utc>,
    pub client_id: ClientId,
    pub client_name: Option<String>,
    pub currency_id: CurrencyId,
    pub currency_name: Option<String>,
    pub currency_code: Option<String>,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub wallet_id: Option<WalletId>,
    pub description: String,
    pub investment_fund_id: Option<FundId>,
    pub investment_fund_name: Option<String>,
}

impl TransactionView {
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            date: tx.created_at,
            client_id: tx.client_id.clone(),
            client_name: None,
            currency_id: tx.currency_id.clone(),
            currency_name: None,
            currency_code: None,
            amount: tx.amount,
            status: tx.status,
            wallet_id: tx.wallet_id,
            description: tx.description.clone(),
            investment_fund_id: tx.fund_id().cloned(),
            investment_fund_name: None,
        }
    }
}
