use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{AccountClient, AccountService, ClientError};
use crate::application::Ledger;
use crate::domain::{format_amount, Amount, TransactionId};

mod watch;

pub use watch::Panel;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Demo Bank - a single-account banking service
#[derive(Parser)]
#[command(name = "demo-bank")]
#[command(about = "Runs a single-account banking service and talks to it over HTTP")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the banking service for one account
    Serve {
        /// Name of the account holder
        #[arg(short, long, env = "BANK_NAME", default_value = "Tom")]
        name: String,

        /// Port to listen on
        #[arg(short, long, env = "BANK_PORT", default_value_t = 8888)]
        port: u16,

        /// Address to bind
        #[arg(long, env = "BANK_BIND", default_value = "0.0.0.0")]
        host: String,

        /// Directory holding the balance file (defaults to the working directory)
        #[arg(long, env = "BANK_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Show the account holder's name
    Name {
        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Show the current balance
    Balance {
        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Deposit money into the account
    Deposit {
        /// Whole amount to deposit
        amount: Amount,

        #[command(flatten)]
        request: MutationArgs,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Withdraw money from the account
    Withdraw {
        /// Whole amount to withdraw
        amount: Amount,

        #[command(flatten)]
        request: MutationArgs,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Report whether the service is reachable
    Status {
        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Continuously show name, balance and status of one or more services
    Watch {
        /// Services to watch as host:port (defaults to the sender and recipient banks)
        #[arg(default_values = ["localhost:8888", "localhost:8889"])]
        services: Vec<String>,

        /// Polling interval in milliseconds
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,

        /// Stop after this many refreshes (runs until Ctrl-C otherwise)
        #[arg(long)]
        ticks: Option<u64>,

        /// Per-request timeout in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
}

/// Where to find the banking service
#[derive(Args)]
pub struct ServiceArgs {
    /// Service host
    #[arg(long, env = "BANK_HOST", default_value = "localhost")]
    pub host: String,

    /// Service port
    #[arg(short, long, env = "BANK_PORT", default_value_t = 8888)]
    pub port: u16,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
}

impl ServiceArgs {
    fn client(&self) -> Result<AccountClient> {
        AccountClient::with_timeout(
            &self.host,
            self.port,
            Duration::from_millis(self.timeout_ms),
        )
        .context("Failed to create banking client")
    }
}

#[derive(Args)]
pub struct MutationArgs {
    /// Key identifying this request; generated when omitted
    #[arg(short = 'k', long)]
    pub idempotency_key: Option<String>,

    /// Retry this many times on failures other than insufficient funds
    #[arg(short, long, default_value_t = 0)]
    pub retries: u32,
}

impl MutationArgs {
    fn key(&self) -> String {
        self.idempotency_key
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve {
                name,
                port,
                host,
                data_dir,
            } => run_serve_command(&name, &host, port, data_dir).await,
            Commands::Name { service } => {
                let name = service.client()?.get_name().await?;
                println!("{}", name);
                Ok(())
            }
            Commands::Balance { service } => {
                let balance = service.client()?.get_balance().await?;
                println!("Balance: {}", format_amount(balance));
                Ok(())
            }
            Commands::Deposit {
                amount,
                request,
                service,
            } => {
                let client = service.client()?;
                let key = request.key();
                let tx_id = with_retries(request.retries, || client.deposit(amount, &key)).await?;
                println!("Deposited {} (transaction {})", format_amount(amount), tx_id);
                Ok(())
            }
            Commands::Withdraw {
                amount,
                request,
                service,
            } => {
                let client = service.client()?;
                let key = request.key();
                let tx_id = with_retries(request.retries, || client.withdraw(amount, &key)).await?;
                println!("Withdrew {} (transaction {})", format_amount(amount), tx_id);
                Ok(())
            }
            Commands::Status { service } => {
                let client = service.client()?;
                if client.is_service_running().await {
                    println!("Service Status: Online ({})", client.base_url());
                } else {
                    println!("Service Status: Offline ({})", client.base_url());
                }
                Ok(())
            }
            Commands::Watch {
                services,
                interval_ms,
                ticks,
                timeout_ms,
            } => {
                let timeout = Duration::from_millis(timeout_ms);
                let panels = services
                    .iter()
                    .map(|service| Panel::connect(service, timeout))
                    .collect::<Result<Vec<_>>>()?;
                watch::run(panels, Duration::from_millis(interval_ms), ticks).await
            }
        }
    }
}

async fn run_serve_command(
    name: &str,
    host: &str,
    port: u16,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let ledger = match data_dir {
        Some(dir) => Ledger::open_in(name, dir)?,
        None => Ledger::open(name)?,
    };
    let ledger = Arc::new(ledger);

    info!("Starting the banking service");
    info!("   Name: {}", ledger.name());
    info!("   Data: {}", ledger.data_path().display());
    info!("   Port: {}", port);

    let service = AccountService::bind(ledger, (host, port)).await?;
    service.run_until(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shut down requested");
}

/// Run `op`, repeating it up to `retries` more times while it fails with a retryable error.
/// The same idempotency key is reused on every attempt, so a retry never applies twice.
async fn with_retries<F, Fut>(retries: u32, mut op: F) -> Result<TransactionId, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TransactionId, ClientError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(tx_id) => return Ok(tx_id),
            Err(err) if err.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!(error = %err, attempt, retries, "request failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(err) => return Err(err),
        }
    }
}
