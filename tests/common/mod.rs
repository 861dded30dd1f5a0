// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use demo_bank::api::{AccountClient, AccountService};
use demo_bank::application::Ledger;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A banking service running on an ephemeral port with its data in a temporary directory.
pub struct TestBank {
    pub ledger: Arc<Ledger>,
    pub client: AccountClient,
    pub addr: SocketAddr,
    pub dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<()>>>,
}

impl TestBank {
    /// Start a service for `name` with a fresh data directory.
    pub async fn start(name: &str) -> Result<Self> {
        Self::start_in(name, TempDir::new()?).await
    }

    /// Start a service for `name` whose balance file lives in `dir`.
    pub async fn start_in(name: &str, dir: TempDir) -> Result<Self> {
        let ledger = Arc::new(Ledger::open_in(name, dir.path())?);
        let service = AccountService::bind(Arc::clone(&ledger), "127.0.0.1:0").await?;
        let addr = service.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(service.run_until(async move {
            let _ = rx.await;
        }));
        let client = AccountClient::new("127.0.0.1", addr.port())?;

        Ok(Self {
            ledger,
            client,
            addr,
            dir,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// Stop the service and hand back its data directory.
    pub async fn stop(mut self) -> Result<TempDir> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await??;
        }
        Ok(self.dir)
    }
}

/// A port nothing is listening on.
pub async fn unused_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.port())
}
