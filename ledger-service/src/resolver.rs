//! Wallet resolution.

use tracing::debug;

use ledger_types::{ClientId, CurrencyId, LedgerError, Wallet, WalletStore};

/// Returns the wallet for `(client_id, currency_id)`, creating an empty one
/// when none exists.
///
/// Creation goes through the store's conditional insert, so concurrent
/// callers for the same pair all end up with the same wallet.
pub async fn get_or_create_wallet<S>(
    store: &S,
    client_id: &ClientId,
    currency_id: &CurrencyId,
) -> Result<Wallet, LedgerError>
where
    S: WalletStore + ?Sized,
{
    if let Some(wallet) = store
        .get_wallet_by_client_and_currency(client_id, currency_id)
        .await?
    {
        return Ok(wallet);
    }

    let wallet = store
        .create_wallet_if_absent(Wallet::new(client_id.clone(), currency_id.clone()))
        .await?;

    debug!(
        wallet_id = %wallet.id,
        client_id = %client_id,
        currency_id = %currency_id,
        "Resolved new wallet"
    );

    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger_repo::MemoryRepo;
    use rust_decimal::Decimal;

    use super::*;

    #[tokio::test]
    async fn test_existing_wallet_is_returned() {
        let repo = MemoryRepo::new();
        let client = ClientId::new("alice");
        let currency = CurrencyId::new("usd");

        let first = get_or_create_wallet(&repo, &client, &currency).await.unwrap();
        let second = get_or_create_wallet(&repo, &client, &currency).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.balance(), Decimal::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolution_creates_one_wallet() {
        let repo = Arc::new(MemoryRepo::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    get_or_create_wallet(
                        repo.as_ref(),
                        &ClientId::new("alice"),
                        &CurrencyId::new("usd"),
                    )
                    .await
                    .unwrap()
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let wallets = repo
            .list_wallets_for_client(&ClientId::new("alice"))
            .await
            .unwrap();
        assert_eq!(wallets.len(), 1);
    }
}
