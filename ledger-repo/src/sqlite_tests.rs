//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use ledger_types::{
        Client, ClientId, ClientLookup, Currency, CurrencyId, FundId, InvestmentFund,
        InvestmentFundLookup, LedgerCommit, RepoError, Transaction, TransactionStatus,
        TransactionStore, UnitOfWork, Wallet, WalletStore,
    };
    use rust_decimal_macros::dec;

    use crate::{CatalogAdmin, SqliteRepo};

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn usd_wallet() -> Wallet {
        Wallet::new(ClientId::new("alice"), CurrencyId::new("usd"))
    }

    fn investment(wallet: &Wallet) -> Transaction {
        Transaction::new(
            wallet.client_id.clone(),
            wallet.currency_id.clone(),
            dec!(200.00),
            "Growth fund",
            Some(wallet.id),
            Some(FundId::new("growth")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_catalog_round_trip() {
        let repo = setup_repo().await;

        repo.upsert_client(Client::new("alice", "Alice").with_email("alice@example.com"))
            .await
            .unwrap();
        repo.upsert_currency(Currency::new("usd", "US Dollar", "USD"))
            .await
            .unwrap();
        repo.upsert_fund(
            InvestmentFund::new("growth", "Growth", "usd", dec!(100.00)).with_category("FPV"),
        )
        .await
        .unwrap();

        let client = repo.get_client(&ClientId::new("alice")).await.unwrap().unwrap();
        assert_eq!(client.email.as_deref(), Some("alice@example.com"));

        let fund = repo.get_fund(&FundId::new("growth")).await.unwrap().unwrap();
        assert_eq!(fund.min_investment, dec!(100.00));
        assert_eq!(fund.category, "FPV");
        assert!(fund.active);
    }

    #[tokio::test]
    async fn test_get_client_not_found() {
        let repo = setup_repo().await;

        let result = repo.get_client(&ClientId::new("nobody")).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_wallet_if_absent_returns_existing_row() {
        let repo = setup_repo().await;

        let first = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();
        let second = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();

        assert_eq!(first.id, second.id);
        let wallets = repo
            .list_wallets_for_client(&ClientId::new("alice"))
            .await
            .unwrap();
        assert_eq!(wallets.len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_balance_is_decimal_exact() {
        let repo = setup_repo().await;
        let mut wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();

        wallet.update_balance(dec!(1000.10)).unwrap();
        assert!(repo.compare_and_swap_wallet(&wallet, 0).await.unwrap());

        let stored = repo.get_wallet(wallet.id).await.unwrap().unwrap();
        assert_eq!(stored.balance(), dec!(1000.10));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_compare_and_swap_wallet_rejects_stale_version() {
        let repo = setup_repo().await;
        let mut wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();

        wallet.update_balance(dec!(10)).unwrap();
        assert!(repo.compare_and_swap_wallet(&wallet, 0).await.unwrap());

        wallet.update_balance(dec!(99)).unwrap();
        assert!(!repo.compare_and_swap_wallet(&wallet, 0).await.unwrap());

        let stored = repo.get_wallet(wallet.id).await.unwrap().unwrap();
        assert_eq!(stored.balance(), dec!(10));
    }

    #[tokio::test]
    async fn test_commit_wallet_and_transaction() {
        let repo = setup_repo().await;
        let mut wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();
        wallet.update_balance(dec!(800.00)).unwrap();
        let tx = investment(&wallet);

        let receipt = repo
            .commit(
                LedgerCommit::new()
                    .update_wallet(wallet.clone(), 0)
                    .insert_transaction(tx.clone()),
            )
            .await
            .unwrap();

        assert_eq!(receipt.wallet.unwrap().version, 1);
        let stored = repo.get_transaction(tx.id).await.unwrap().unwrap();
        assert_eq!(stored.amount, dec!(200.00));
        assert_eq!(stored.status, TransactionStatus::Active);
        assert_eq!(stored.wallet_id, Some(wallet.id));
    }

    #[tokio::test]
    async fn test_commit_rolls_back_on_conflict() {
        let repo = setup_repo().await;
        let mut wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();
        wallet.update_balance(dec!(5)).unwrap();
        let tx = investment(&wallet);

        let result = repo
            .commit(
                LedgerCommit::new()
                    .insert_transaction(tx.clone())
                    .update_wallet(wallet.clone(), 42),
            )
            .await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
        assert!(repo.get_transaction(tx.id).await.unwrap().is_none());
        let stored = repo.get_wallet(wallet.id).await.unwrap().unwrap();
        assert_eq!(stored.balance(), dec!(0));
    }

    #[tokio::test]
    async fn test_commit_status_change_once() {
        let repo = setup_repo().await;
        let wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();
        let tx = repo.create_transaction(investment(&wallet)).await.unwrap();

        let change = LedgerCommit::new().change_status(
            &tx,
            TransactionStatus::Active,
            TransactionStatus::Inactive,
        );

        let receipt = repo.commit(change.clone()).await.unwrap();
        let flipped = receipt.transaction.unwrap();
        assert_eq!(flipped.status, TransactionStatus::Inactive);
        assert_eq!(flipped.version, 1);

        let again = repo.commit(change).await;
        assert!(matches!(again, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_compare_and_swap_status() {
        let repo = setup_repo().await;
        let wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();
        let tx = repo.create_transaction(investment(&wallet)).await.unwrap();

        assert!(
            repo.compare_and_swap_status(
                tx.id,
                TransactionStatus::Active,
                TransactionStatus::Inactive,
                0
            )
            .await
            .unwrap()
        );
        assert!(
            !repo
                .compare_and_swap_status(
                    tx.id,
                    TransactionStatus::Active,
                    TransactionStatus::Inactive,
                    1
                )
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_duplicate_transaction_is_conflict() {
        let repo = setup_repo().await;
        let wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();
        let tx = investment(&wallet);

        repo.create_transaction(tx.clone()).await.unwrap();
        let result = repo.create_transaction(tx).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_transactions() {
        let repo = setup_repo().await;
        let wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();
        let first = repo.create_transaction(investment(&wallet)).await.unwrap();
        repo.create_transaction(investment(&wallet)).await.unwrap();

        repo.compare_and_swap_status(
            first.id,
            TransactionStatus::Active,
            TransactionStatus::Inactive,
            0,
        )
        .await
        .unwrap();

        let all = repo
            .list_transactions_for_client(&ClientId::new("alice"))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let active = repo
            .list_transactions_by_status(TransactionStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_wallet() {
        let repo = setup_repo().await;
        let wallet = repo.create_wallet_if_absent(usd_wallet()).await.unwrap();

        assert!(repo.delete_wallet(wallet.id).await.unwrap());
        assert!(!repo.delete_wallet(wallet.id).await.unwrap());
        assert!(repo.get_wallet(wallet.id).await.unwrap().is_none());
    }
}
