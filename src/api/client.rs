use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::domain::{Amount, TransactionId};

use super::protocol::{
    success_value, ErrorKind, Failure, AMOUNT_PARAM, BALANCE_PATH, DEPOSIT_PATH,
    ERROR_KIND_HEADER, IDEMPOTENCY_KEY_PARAM, NAME_PATH, WITHDRAW_PATH,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ClientError {
    /// The withdrawal was rejected by the bank's funds check. Retrying won't help.
    #[error("insufficient funds: {detail}")]
    InsufficientFunds { detail: String },

    /// Any other error response, such as a malformed request or a failed write.
    #[error("HTTP Error {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected service response: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Whether repeating the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ClientError::InsufficientFunds { .. })
    }
}

/// Calls the account operations of a banking service over the network.
#[derive(Debug, Clone)]
pub struct AccountClient {
    base_url: String,
    http: reqwest::Client,
}

impl AccountClient {
    pub fn new(host: &str, port: u16) -> Result<Self, ClientError> {
        Self::with_timeout(host, port, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(host: &str, port: u16, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: format!("http://{}:{}", host, port),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the account the service manages.
    pub async fn get_name(&self) -> Result<String, ClientError> {
        let body = self.call(NAME_PATH, &[]).await?;
        let name = success_value(&body)
            .ok_or_else(|| ClientError::Protocol(format!("failed to parse name from: {body}")))?;
        Ok(name.to_string())
    }

    pub async fn get_balance(&self) -> Result<Amount, ClientError> {
        let body = self.call(BALANCE_PATH, &[]).await?;
        success_value(&body)
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| ClientError::Protocol(format!("failed to parse balance from: {body}")))
    }

    /// Deposit `amount`. Reusing an `idempotency_key` returns the original transaction.
    pub async fn deposit(
        &self,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<TransactionId, ClientError> {
        self.mutate(DEPOSIT_PATH, amount, idempotency_key).await
    }

    /// Withdraw `amount`. Fails with [`ClientError::InsufficientFunds`] if the
    /// balance is too low.
    pub async fn withdraw(
        &self,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<TransactionId, ClientError> {
        self.mutate(WITHDRAW_PATH, amount, idempotency_key).await
    }

    /// True if the service answered at all, whatever the status.
    pub async fn is_service_running(&self) -> bool {
        self.http
            .get(format!("{}{}", self.base_url, BALANCE_PATH))
            .send()
            .await
            .is_ok()
    }

    async fn mutate(
        &self,
        path: &str,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<TransactionId, ClientError> {
        let amount = amount.to_string();
        let body = self
            .call(
                path,
                &[
                    (AMOUNT_PARAM, amount.as_str()),
                    (IDEMPOTENCY_KEY_PARAM, idempotency_key),
                ],
            )
            .await?;

        success_value(&body)
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| ClientError::Protocol(format!("failed to parse ID from: {body}")))
    }

    async fn call(&self, path: &str, query: &[(&str, &str)]) -> Result<String, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "calling banking service");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let kind = response
            .headers()
            .get(ERROR_KIND_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(ErrorKind::from_label);
        let body = response.text().await?;

        if status.is_client_error() || status.is_server_error() {
            return Err(classify_error(status.as_u16(), kind, body));
        }

        Ok(body)
    }
}

/// Rebuild a typed error from an error response. The `x-error-kind` header is
/// authoritative; services that don't send it are classified by the body's label.
fn classify_error(status: u16, kind: Option<ErrorKind>, body: String) -> ClientError {
    let failure = Failure::parse(&body);
    let kind = kind.or_else(|| failure.as_ref().map(|f| f.kind));

    match kind {
        Some(ErrorKind::InsufficientFunds) => ClientError::InsufficientFunds {
            detail: failure
                .and_then(|f| f.detail)
                .unwrap_or_else(|| body.trim_end().to_string()),
        },
        _ => ClientError::Service { status, body },
    }
}
