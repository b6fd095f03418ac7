//! Ledger Application Service
//!
//! Orchestrates domain operations through the repository ports.
//! Contains NO infrastructure logic - pure business orchestration.

use std::collections::HashMap;
use std::future::Future;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use ledger_types::{
    ClientId, CurrencyId, LedgerCommit, LedgerError, LedgerRepository, ProcessTransactionRequest,
    ReversalOutcome, Transaction, TransactionId, TransactionStatus, TransactionView, Wallet,
    WalletView, validator,
};

use crate::resolver::get_or_create_wallet;
use crate::retry::{CancelSignal, RetryPolicy};

/// Application service for ledger operations.
///
/// Generic over `R: LedgerRepository` - the adapter is injected at compile time.
/// Every write goes through one [`LedgerCommit`]; a commit that loses an
/// optimistic concurrency race is retried from the read step according to
/// the [`RetryPolicy`].
pub struct LedgerService<R: LedgerRepository> {
    repo: R,
    retry: RetryPolicy,
}

impl<R: LedgerRepository> LedgerService<R> {
    /// Creates a new ledger service with the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transaction Coordinator
    // ─────────────────────────────────────────────────────────────────────────────

    /// Records a transaction and, when it names a fund, debits the client's
    /// wallet for the investment.
    pub async fn process_transaction(
        &self,
        req: ProcessTransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        self.process_transaction_cancellable(req, &CancelSignal::never())
            .await
    }

    #[instrument(
        skip(self, req, cancel),
        fields(
            client_id = %req.client_id,
            currency_id = %req.currency_id,
            amount = %req.amount,
            fund_id = ?req.fund_id()
        )
    )]
    pub async fn process_transaction_cancellable(
        &self,
        req: ProcessTransactionRequest,
        cancel: &CancelSignal,
    ) -> Result<Transaction, LedgerError> {
        if req.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(req.amount));
        }

        self.with_retry("process_transaction", || {
            self.try_process_transaction(&req, cancel)
        })
        .await
    }

    async fn try_process_transaction(
        &self,
        req: &ProcessTransactionRequest,
        cancel: &CancelSignal,
    ) -> Result<Transaction, LedgerError> {
        let client = self
            .repo
            .get_client(&req.client_id)
            .await?
            .ok_or_else(|| LedgerError::ClientNotFound(req.client_id.clone()))?;
        let currency = self
            .repo
            .get_currency(&req.currency_id)
            .await?
            .ok_or_else(|| LedgerError::CurrencyNotFound(req.currency_id.clone()))?;

        let mut wallet = get_or_create_wallet(&self.repo, &client.id, &currency.id).await?;
        let expected_version = wallet.version;

        let transaction = Transaction::new(
            client.id,
            currency.id,
            req.amount,
            req.description.clone(),
            Some(wallet.id),
            req.fund_id().cloned(),
        )?;

        let mut debited = false;
        if let Some(fund_id) = transaction.fund_id() {
            let fund = self.repo.get_fund(fund_id).await?;
            validator::validate_investment_eligibility(
                transaction.amount,
                &transaction.currency_id,
                fund_id,
                fund.as_ref(),
            )?;
            validator::debit(&mut wallet, transaction.amount)?;
            debited = true;
        }

        if wallet.currency_id != transaction.currency_id {
            return Err(LedgerError::CurrencyMismatch {
                expected: wallet.currency_id,
                got: transaction.currency_id,
            });
        }

        cancel.check()?;

        let mut commit = LedgerCommit::new().insert_transaction(transaction);
        if debited {
            commit = commit.update_wallet(wallet, expected_version);
        }

        let receipt = self.repo.commit(commit).await?;
        let transaction = receipt.transaction.ok_or_else(|| {
            LedgerError::PersistenceFailure("commit did not return the transaction".into())
        })?;

        info!(
            transaction_id = %transaction.id,
            balance = ?receipt.wallet.as_ref().map(Wallet::balance),
            "Transaction committed"
        );

        Ok(transaction)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reversal Processor
    // ─────────────────────────────────────────────────────────────────────────────

    /// Reverses a fund investment and credits the amount back to its wallet.
    pub async fn unsubscribe(&self, id: TransactionId) -> Result<ReversalOutcome, LedgerError> {
        self.unsubscribe_cancellable(id, &CancelSignal::never())
            .await
    }

    #[instrument(skip(self, cancel), fields(transaction_id = %id))]
    pub async fn unsubscribe_cancellable(
        &self,
        id: TransactionId,
        cancel: &CancelSignal,
    ) -> Result<ReversalOutcome, LedgerError> {
        self.with_retry("unsubscribe", || self.try_unsubscribe(id, cancel))
            .await
    }

    async fn try_unsubscribe(
        &self,
        id: TransactionId,
        cancel: &CancelSignal,
    ) -> Result<ReversalOutcome, LedgerError> {
        let mut transaction = self
            .repo
            .get_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))?;

        if transaction.fund_id().is_none() {
            return Err(LedgerError::NotAssociatedWithFund(id));
        }
        if !transaction.is_active() {
            return Err(LedgerError::AlreadyReversed(id));
        }

        let mut commit = LedgerCommit::new().change_status(
            &transaction,
            TransactionStatus::Active,
            TransactionStatus::Inactive,
        );
        transaction.deactivate();

        let wallet = match transaction.wallet_id {
            Some(wallet_id) => self.repo.get_wallet(wallet_id).await?,
            None => None,
        };

        let wallet_missing = wallet.is_none();
        match wallet {
            Some(mut wallet) => {
                let expected_version = wallet.version;
                validator::credit(&mut wallet, transaction.amount)?;
                commit = commit.update_wallet(wallet, expected_version);
            }
            None => warn!(
                wallet_id = ?transaction.wallet_id,
                amount = %transaction.amount,
                "Wallet not found, reversing without credit"
            ),
        }

        cancel.check()?;

        let receipt = self.repo.commit(commit).await?;
        let transaction = receipt.transaction.unwrap_or(transaction);

        info!(
            balance = ?receipt.wallet.as_ref().map(Wallet::balance),
            wallet_missing,
            "Transaction reversed"
        );

        Ok(ReversalOutcome {
            transaction,
            wallet: receipt.wallet,
            wallet_missing,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Wallet Administration
    // ─────────────────────────────────────────────────────────────────────────────

    /// Overwrites a wallet balance, creating the wallet if needed.
    #[instrument(skip(self))]
    pub async fn set_wallet_balance(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
        balance: Decimal,
    ) -> Result<Wallet, LedgerError> {
        if balance < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(balance));
        }

        self.with_retry("set_wallet_balance", || {
            self.try_set_wallet_balance(client_id, currency_id, balance)
        })
        .await
    }

    async fn try_set_wallet_balance(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
        balance: Decimal,
    ) -> Result<Wallet, LedgerError> {
        self.require_client(client_id).await?;
        self.require_currency(currency_id).await?;

        let mut wallet = get_or_create_wallet(&self.repo, client_id, currency_id).await?;
        let expected_version = wallet.version;
        wallet.update_balance(balance)?;

        if !self
            .repo
            .compare_and_swap_wallet(&wallet, expected_version)
            .await?
        {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "wallet {} moved past version {}",
                wallet.id, expected_version
            )));
        }

        wallet.version = expected_version + 1;
        info!(wallet_id = %wallet.id, %balance, "Wallet balance set");
        Ok(wallet)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────────

    /// Balance of the client's wallet in `currency_id`, zero when it has none.
    pub async fn get_wallet_balance(
        &self,
        client_id: &ClientId,
        currency_id: &CurrencyId,
    ) -> Result<Decimal, LedgerError> {
        let wallet = self
            .repo
            .get_wallet_by_client_and_currency(client_id, currency_id)
            .await?;
        Ok(wallet.map_or(Decimal::ZERO, |w| w.balance()))
    }

    /// All wallets of a client with catalog names filled in.
    pub async fn get_client_wallets(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<WalletView>, LedgerError> {
        let client = self.repo.get_client(client_id).await?;
        let wallets = self.repo.list_wallets_for_client(client_id).await?;

        let mut views = Vec::with_capacity(wallets.len());
        for wallet in &wallets {
            let currency = self.repo.get_currency(&wallet.currency_id).await?;
            let mut view = WalletView::from_wallet(wallet);
            view.client_name = client.as_ref().map(|c| c.name.clone());
            view.currency_name = currency.as_ref().map(|c| c.name.clone());
            view.currency_code = currency.map(|c| c.code);
            views.push(view);
        }

        Ok(views)
    }

    /// Gets a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.repo
            .get_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Transaction history of a client, newest first.
    pub async fn list_client_transactions(
        &self,
        client_id: &ClientId,
    ) -> Result<Vec<TransactionView>, LedgerError> {
        let transactions = self.repo.list_transactions_for_client(client_id).await?;
        self.describe(transactions).await
    }

    /// Every transaction that has not been reversed, newest first.
    pub async fn list_active_transactions(&self) -> Result<Vec<TransactionView>, LedgerError> {
        let transactions = self
            .repo
            .list_transactions_by_status(TransactionStatus::Active)
            .await?;
        self.describe(transactions).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────────

    async fn describe(
        &self,
        mut transactions: Vec<Transaction>,
    ) -> Result<Vec<TransactionView>, LedgerError> {
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut clients = HashMap::new();
        let mut currencies = HashMap::new();
        let mut funds = HashMap::new();
        let mut views = Vec::with_capacity(transactions.len());

        for tx in &transactions {
            if !clients.contains_key(&tx.client_id) {
                let client = self.repo.get_client(&tx.client_id).await?;
                clients.insert(tx.client_id.clone(), client);
            }
            if !currencies.contains_key(&tx.currency_id) {
                let currency = self.repo.get_currency(&tx.currency_id).await?;
                currencies.insert(tx.currency_id.clone(), currency);
            }

            let mut view = TransactionView::from_transaction(tx);
            if let Some(Some(client)) = clients.get(&tx.client_id) {
                view.client_name = Some(client.name.clone());
            }
            if let Some(Some(currency)) = currencies.get(&tx.currency_id) {
                view.currency_name = Some(currency.name.clone());
                view.currency_code = Some(currency.code.clone());
            }
            if let Some(fund_id) = tx.fund_id() {
                if !funds.contains_key(fund_id) {
                    let fund = self.repo.get_fund(fund_id).await?;
                    funds.insert(fund_id.clone(), fund);
                }
                if let Some(Some(fund)) = funds.get(fund_id) {
                    view.investment_fund_name = Some(fund.name.clone());
                }
            }
            views.push(view);
        }

        Ok(views)
    }

    async fn require_client(&self, id: &ClientId) -> Result<(), LedgerError> {
        match self.repo.get_client(id).await? {
            Some(_) => Ok(()),
            None => Err(LedgerError::ClientNotFound(id.clone())),
        }
    }

    async fn require_currency(&self, id: &CurrencyId) -> Result<(), LedgerError> {
        match self.repo.get_currency(id).await? {
            Some(_) => Ok(()),
            None => Err(LedgerError::CurrencyNotFound(id.clone())),
        }
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt_once: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_once().await {
                Err(LedgerError::ConcurrencyConflict(reason))
                    if attempt < self.retry.max_attempts =>
                {
                    warn!(operation, attempt, %reason, "Concurrency conflict, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
