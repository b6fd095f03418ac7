//! Notification payload sent after a committed ledger change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{ClientId, CurrencyId, FundId};
use super::transaction::{Transaction, TransactionId};

/// What a client is told about a committed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionNotice {
    pub transaction_id: TransactionId,
    pub client_id: ClientId,
    /// "Investment", "Fund Unsubscription" or "Transaction"
    pub kind: String,
    pub amount: Decimal,
    pub currency_id: CurrencyId,
    pub investment_fund_id: Option<FundId>,
    pub date: DateTime<Utc>,
    pub description: String,
}

impl From<&Transaction> for TransactionNotice {
    fn from(tx: &Transaction) -> Self {
        let kind = match (tx.fund_id(), tx.is_active()) {
            (Some(_), true) => "Investment",
            (Some(_), false) => "Fund Unsubscription",
            (None, _) => "Transaction",
        };

        Self {
            transaction_id: tx.id,
            client_id: tx.client_id.clone(),
            kind: kind.to_string(),
            amount: tx.amount,
            currency_id: tx.currency_id.clone(),
            investment_fund_id: tx.fund_id().cloned(),
            date: tx.created_at,
            description: tx.description.clone(),
        }
    }
}
