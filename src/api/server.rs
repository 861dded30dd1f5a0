use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{info, warn};

use crate::application::{AppError, Ledger};
use crate::domain::{parse_amount, Amount};

use super::protocol::{
    ErrorKind, Failure, Success, AMOUNT_PARAM, BALANCE_PATH, DEPOSIT_PATH, ERROR_KIND_HEADER,
    IDEMPOTENCY_KEY_PARAM, NAME_PATH, WITHDRAW_PATH,
};

type Params = Query<Vec<(String, String)>>;

/// Exposes a [`Ledger`] over HTTP. Each request runs on its own task; mutations run on
/// the blocking pool since they write to disk before responding.
pub struct AccountService {
    ledger: Arc<Ledger>,
    listener: TcpListener,
}

impl AccountService {
    /// Bind the service to `addr`. Use port 0 to pick any free port.
    pub async fn bind(ledger: Arc<Ledger>, addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("Failed to bind banking service")?;
        Ok(Self { ledger, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read banking service address")
    }

    /// Routes for the four account operations, sharing `ledger`.
    pub fn router(ledger: Arc<Ledger>) -> Router {
        Router::new()
            .route(BALANCE_PATH, any(balance))
            .route(NAME_PATH, any(name))
            .route(DEPOSIT_PATH, any(deposit))
            .route(WITHDRAW_PATH, any(withdraw))
            .with_state(ledger)
    }

    /// Serve requests until `shutdown` completes, then finish in-flight requests and return.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = self.ledger.name().to_string();
        let addr = self.local_addr()?;
        info!(account = %name, %addr, "banking service listening");

        axum::serve(self.listener, Self::router(self.ledger))
            .with_graceful_shutdown(shutdown)
            .await
            .context("Banking service failed")?;

        info!(account = %name, "banking service shut down");
        Ok(())
    }
}

// The balance shares the ledger lock with mutations, which hold it across an fsync,
// so reads go to the blocking pool as well.
async fn balance(State(ledger): State<Arc<Ledger>>) -> Response {
    match run_blocking(move || Ok(ledger.balance())).await {
        Ok(balance) => success(Success::Balance(balance)),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("ERROR: {err}\n"),
        )
            .into_response(),
    }
}

async fn name(State(ledger): State<Arc<Ledger>>) -> Response {
    success(Success::Name(ledger.name().to_string()))
}

async fn deposit(State(ledger): State<Arc<Ledger>>, Query(params): Params) -> Response {
    let (amount, idempotency_key) = match mutation_params(&params) {
        Ok(parsed) => parsed,
        Err(failure) => return error(failure),
    };

    match run_blocking(move || ledger.deposit(amount, &idempotency_key)).await {
        Ok(tx_id) => success(Success::DepositComplete(tx_id)),
        Err(err) => error(Failure::with_detail(ErrorKind::DepositFail, err.to_string())),
    }
}

async fn withdraw(State(ledger): State<Arc<Ledger>>, Query(params): Params) -> Response {
    let (amount, idempotency_key) = match mutation_params(&params) {
        Ok(parsed) => parsed,
        Err(failure) => return error(failure),
    };

    match run_blocking(move || ledger.withdraw(amount, &idempotency_key)).await {
        Ok(tx_id) => success(Success::WithdrawComplete(tx_id)),
        Err(AppError::InsufficientFunds(details)) => error(Failure::with_detail(
            ErrorKind::InsufficientFunds,
            details.to_string(),
        )),
        Err(err) => error(Failure::with_detail(ErrorKind::WithdrawFail, err.to_string())),
    }
}

/// Validate `amount` and extract `idempotency-key` (empty when absent).
fn mutation_params(params: &[(String, String)]) -> Result<(Amount, String), Failure> {
    let amount = first_param(params, AMOUNT_PARAM)
        .ok_or_else(|| Failure::new(ErrorKind::MissingAmountParam))?;
    let amount = parse_amount(amount).map_err(|_| Failure::new(ErrorKind::InvalidAmount))?;
    let idempotency_key = first_param(params, IDEMPOTENCY_KEY_PARAM)
        .unwrap_or_default()
        .to_string();

    Ok((amount, idempotency_key))
}

fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

async fn run_blocking<F, T>(op: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|err| AppError::Persistence(anyhow::anyhow!("ledger task failed: {err}")))?
}

fn success(body: Success) -> Response {
    (StatusCode::OK, body.to_body()).into_response()
}

fn error(failure: Failure) -> Response {
    warn!(
        kind = %failure.kind,
        detail = failure.detail.as_deref().unwrap_or(""),
        "request rejected"
    );
    (
        StatusCode::BAD_REQUEST,
        [(ERROR_KIND_HEADER, failure.kind.as_str())],
        failure.to_body(),
    )
        .into_response()
}
