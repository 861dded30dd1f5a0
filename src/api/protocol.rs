use std::fmt;

use crate::domain::{Amount, TransactionId};

pub const BALANCE_PATH: &str = "/balance";
pub const NAME_PATH: &str = "/name";
pub const DEPOSIT_PATH: &str = "/deposit";
pub const WITHDRAW_PATH: &str = "/withdraw";

pub const AMOUNT_PARAM: &str = "amount";
pub const IDEMPOTENCY_KEY_PARAM: &str = "idempotency-key";

/// Header carried by every error response. Its value is the [`ErrorKind`] label,
/// so clients can classify a failure without reading the body.
pub const ERROR_KIND_HEADER: &str = "x-error-kind";

const SUCCESS_PREFIX: &str = "SUCCESS: ";
const ERROR_PREFIX: &str = "ERROR: ";

/// Successful response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Success {
    Balance(Amount),
    Name(String),
    DepositComplete(TransactionId),
    WithdrawComplete(TransactionId),
}

impl Success {
    pub fn to_body(&self) -> String {
        match self {
            Success::Balance(balance) => format!("{SUCCESS_PREFIX}balance={balance}"),
            Success::Name(name) => format!("{SUCCESS_PREFIX}name={name}"),
            Success::DepositComplete(tx_id) => {
                format!("{SUCCESS_PREFIX}DEPOSIT_COMPLETE: transaction-id={tx_id}")
            }
            Success::WithdrawComplete(tx_id) => {
                format!("{SUCCESS_PREFIX}WITHDRAW_COMPLETE: transaction-id={tx_id}")
            }
        }
    }
}

/// The value following the first `=` of a success body, e.g. `1000` in
/// `SUCCESS: balance=1000`.
pub fn success_value(body: &str) -> Option<&str> {
    body.split_once('=').map(|(_, value)| value.trim_end_matches(['\r', '\n']))
}

/// Classification of an error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingAmountParam,
    InvalidAmount,
    InsufficientFunds,
    DepositFail,
    WithdrawFail,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingAmountParam => "MISSING_AMOUNT_PARAM",
            ErrorKind::InvalidAmount => "INVALID_AMOUNT",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::DepositFail => "DEPOSIT_FAIL",
            ErrorKind::WithdrawFail => "WITHDRAW_FAIL",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "MISSING_AMOUNT_PARAM" => Some(ErrorKind::MissingAmountParam),
            "INVALID_AMOUNT" => Some(ErrorKind::InvalidAmount),
            "INSUFFICIENT_FUNDS" => Some(ErrorKind::InsufficientFunds),
            "DEPOSIT_FAIL" => Some(ErrorKind::DepositFail),
            "WITHDRAW_FAIL" => Some(ErrorKind::WithdrawFail),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error response: `ERROR: <LABEL>` or `ERROR: <LABEL>: <detail>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// Error bodies end with a newline.
    pub fn to_body(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{ERROR_PREFIX}{}: {}\n", self.kind, detail),
            None => format!("{ERROR_PREFIX}{}\n", self.kind),
        }
    }

    /// Parse an error body. Returns `None` for anything not shaped like one of ours.
    pub fn parse(body: &str) -> Option<Self> {
        let rest = body.trim_end_matches(['\r', '\n']).strip_prefix(ERROR_PREFIX)?;
        let (label, detail) = match rest.split_once(':') {
            Some((label, detail)) => (label, Some(detail.strip_prefix(' ').unwrap_or(detail))),
            None => (rest, None),
        };
        let kind = ErrorKind::from_label(label)?;

        Some(Self {
            kind,
            detail: detail.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: &str) -> TransactionId {
        id.parse().unwrap()
    }

    #[test]
    fn test_success_bodies() {
        assert_eq!(Success::Balance(1000).to_body(), "SUCCESS: balance=1000");
        assert_eq!(Success::Name("Tom".into()).to_body(), "SUCCESS: name=Tom");
        assert_eq!(
            Success::DepositComplete(tx("D0123456789")).to_body(),
            "SUCCESS: DEPOSIT_COMPLETE: transaction-id=D0123456789"
        );
        assert_eq!(
            Success::WithdrawComplete(tx("W0123456789")).to_body(),
            "SUCCESS: WITHDRAW_COMPLETE: transaction-id=W0123456789"
        );
    }

    #[test]
    fn test_success_value() {
        assert_eq!(success_value("SUCCESS: balance=1000"), Some("1000"));
        assert_eq!(
            success_value("SUCCESS: DEPOSIT_COMPLETE: transaction-id=D42"),
            Some("D42")
        );
        assert_eq!(success_value("SUCCESS: name=Ted\n"), Some("Ted"));
        assert_eq!(success_value("SUCCESS"), None);
    }

    #[test]
    fn test_error_bodies() {
        assert_eq!(
            Failure::new(ErrorKind::MissingAmountParam).to_body(),
            "ERROR: MISSING_AMOUNT_PARAM\n"
        );
        assert_eq!(
            Failure::with_detail(
                ErrorKind::InsufficientFunds,
                "withdrawal amount $5000 exceeds balance $1000"
            )
            .to_body(),
            "ERROR: INSUFFICIENT_FUNDS: withdrawal amount $5000 exceeds balance $1000\n"
        );
    }

    #[test]
    fn test_parse_error_with_detail() {
        let failure =
            Failure::parse("ERROR: INSUFFICIENT_FUNDS: withdrawal amount $5 exceeds balance $1\n")
                .unwrap();
        assert_eq!(failure.kind, ErrorKind::InsufficientFunds);
        assert_eq!(
            failure.detail.as_deref(),
            Some("withdrawal amount $5 exceeds balance $1")
        );
    }

    #[test]
    fn test_parse_error_detail_keeps_inner_colons() {
        let failure = Failure::parse("ERROR: DEPOSIT_FAIL: Persistence error: disk full").unwrap();
        assert_eq!(failure.kind, ErrorKind::DepositFail);
        assert_eq!(failure.detail.as_deref(), Some("Persistence error: disk full"));
    }

    #[test]
    fn test_parse_error_without_detail() {
        let failure = Failure::parse("ERROR: INVALID_AMOUNT\n").unwrap();
        assert_eq!(failure, Failure::new(ErrorKind::InvalidAmount));
    }

    #[test]
    fn test_parse_rejects_foreign_bodies() {
        assert_eq!(Failure::parse("404 page not found"), None);
        assert_eq!(Failure::parse("ERROR: SOMETHING_ELSE: x"), None);
        // a marker buried in prose is not a structured error
        assert_eq!(Failure::parse("note: ERROR: INSUFFICIENT_FUNDS: x"), None);
    }

    #[test]
    fn test_error_kind_labels() {
        for kind in [
            ErrorKind::MissingAmountParam,
            ErrorKind::InvalidAmount,
            ErrorKind::InsufficientFunds,
            ErrorKind::DepositFail,
            ErrorKind::WithdrawFail,
        ] {
            assert_eq!(ErrorKind::from_label(kind.as_str()), Some(kind));
        }
    }
}
