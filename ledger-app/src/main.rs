//! # Ledger
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Create the ledger service and notification sink
//! - Run one command and print the result as JSON

mod config;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ledger_repo::{CatalogAdmin, Repo, build_repo};
use ledger_service::{
    CancelSignal, LedgerService, LogNotifier, WebhookNotifier, spawn_notification,
};
use ledger_types::{
    Client, ClientId, Currency, CurrencyId, InvestmentFund, NotificationSink,
    ProcessTransactionRequest, TransactionId, TransactionNotice,
};

use config::{Config, LogFormat};

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author, version, about = "Wallet ledger and fund investments", long_about = None)]
struct Cli {
    /// Database URL (`sqlite://...` or `memory://`)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a client
    SeedClient {
        id: String,
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Create or update a currency
    SeedCurrency { id: String, name: String, code: String },
    /// Create or update an investment fund
    SeedFund {
        id: String,
        name: String,
        /// Currency the fund is denominated in
        #[arg(long)]
        currency: String,
        /// Minimum amount per investment
        #[arg(long)]
        min: Decimal,
        #[arg(long, default_value = "")]
        category: String,
        /// Register the fund as closed to new investments
        #[arg(long)]
        inactive: bool,
    },
    /// Overwrite a wallet balance
    SetBalance {
        #[arg(long)]
        client: String,
        #[arg(long)]
        currency: String,
        amount: Decimal,
    },
    /// Record a transaction, investing it when a fund is given
    Process {
        #[arg(long)]
        client: String,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        fund: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Reverse a fund investment
    Unsubscribe {
        /// Transaction ID (UUID)
        id: TransactionId,
    },
    /// Show a wallet balance
    Balance {
        #[arg(long)]
        client: String,
        #[arg(long)]
        currency: String,
    },
    /// List the wallets of a client
    Wallets { client: String },
    /// List the transactions of a client
    Transactions { client: String },
    /// List every active transaction
    Active,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,ledger_service=debug,ledger_app=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the JSON result.
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn notification_sink(config: &Config) -> Arc<dyn NotificationSink> {
    match &config.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    }
}

/// A signal raised on Ctrl-C.
fn ctrl_c_signal() -> CancelSignal {
    let (handle, signal) = CancelSignal::pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling before commit");
            handle.cancel();
        }
    });
    signal
}

async fn notify(sink: Arc<dyn NotificationSink>, notice: TransactionNotice) {
    if let Err(e) = spawn_notification(sink, notice).await {
        warn!("Notification task failed: {}", e);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    init_tracing(config.log_format);
    info!("Using database: {}", config.database_url);

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;
    let service = LedgerService::new(repo).with_retry_policy(config.retry);
    let sink = notification_sink(&config);

    run(cli.command, &service, sink).await
}

async fn run(
    command: Commands,
    service: &LedgerService<Repo>,
    sink: Arc<dyn NotificationSink>,
) -> Result<()> {
    match command {
        Commands::SeedClient { id, name, email } => {
            let mut client = Client::new(id, name);
            client.email = email;
            service.repo().upsert_client(client.clone()).await?;
            print_json(&client)
        }
        Commands::SeedCurrency { id, name, code } => {
            let currency = Currency::new(id, name, code);
            service.repo().upsert_currency(currency.clone()).await?;
            print_json(&currency)
        }
        Commands::SeedFund {
            id,
            name,
            currency,
            min,
            category,
            inactive,
        } => {
            let mut fund = InvestmentFund::new(id, name, currency, min).with_category(category);
            if inactive {
                fund = fund.deactivated();
            }
            service.repo().upsert_fund(fund.clone()).await?;
            print_json(&fund)
        }
        Commands::SetBalance {
            client,
            currency,
            amount,
        } => {
            let wallet = service
                .set_wallet_balance(&ClientId::new(client), &CurrencyId::new(currency), amount)
                .await?;
            print_json(&wallet)
        }
        Commands::Process {
            client,
            currency,
            amount,
            fund,
            description,
        } => {
            let mut req =
                ProcessTransactionRequest::new(client, currency, amount).with_description(description);
            if let Some(fund) = fund {
                req = req.into_fund(fund);
            }

            let tx = service
                .process_transaction_cancellable(req, &ctrl_c_signal())
                .await?;
            print_json(&tx)?;
            notify(sink, TransactionNotice::from(&tx)).await;
            Ok(())
        }
        Commands::Unsubscribe { id } => {
            let outcome = service
                .unsubscribe_cancellable(id, &ctrl_c_signal())
                .await?;
            print_json(&outcome)?;
            notify(sink, TransactionNotice::from(&outcome.transaction)).await;
            Ok(())
        }
        Commands::Balance { client, currency } => {
            let client = ClientId::new(client);
            let currency = CurrencyId::new(currency);
            let balance = service.get_wallet_balance(&client, &currency).await?;
            print_json(&serde_json::json!({
                "client_id": client,
                "currency_id": currency,
                "balance": balance,
            }))
        }
        Commands::Wallets { client } => {
            print_json(&service.get_client_wallets(&ClientId::new(client)).await?)
        }
        Commands::Transactions { client } => {
            print_json(&service.list_client_transactions(&ClientId::new(client)).await?)
        }
        Commands::Active => print_json(&service.list_active_transactions().await?),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "ledger",
            "--database-url",
            "memory://",
            "process",
            "--client",
            "alice",
            "--currency",
            "usd",
            "--amount",
            "200.50",
            "--fund",
            "growth",
        ])
        .unwrap();

        assert_eq!(cli.database_url.as_deref(), Some("memory://"));
        match cli.command {
            Commands::Process { amount, fund, .. } => {
                assert_eq!(amount, Decimal::new(20050, 2));
                assert_eq!(fund.as_deref(), Some("growth"));
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_transaction_id() {
        assert!(Cli::try_parse_from(["ledger", "unsubscribe", "not-a-uuid"]).is_err());
    }

    #[tokio::test]
    async fn test_run_against_memory_repo() {
        let repo = build_repo("memory://").await.unwrap();
        let service = LedgerService::new(repo);
        let sink: Arc<dyn NotificationSink> = Arc::new(LogNotifier);

        for command in [
            Commands::SeedClient {
                id: "alice".into(),
                name: "Alice".into(),
                email: None,
            },
            Commands::SeedCurrency {
                id: "usd".into(),
                name: "US Dollar".into(),
                code: "USD".into(),
            },
            Commands::SeedFund {
                id: "growth".into(),
                name: "Growth".into(),
                currency: "usd".into(),
                min: Decimal::new(100, 0),
                category: String::new(),
                inactive: false,
            },
            Commands::SetBalance {
                client: "alice".into(),
                currency: "usd".into(),
                amount: Decimal::new(1000, 0),
            },
            Commands::Process {
                client: "alice".into(),
                currency: "usd".into(),
                amount: Decimal::new(250, 0),
                fund: Some("growth".into()),
                description: "first".into(),
            },
        ] {
            run(command, &service, sink.clone()).await.unwrap();
        }

        let balance = service
            .get_wallet_balance(&ClientId::new("alice"), &CurrencyId::new("usd"))
            .await
            .unwrap();
        assert_eq!(balance, Decimal::new(750, 0));
    }
}
