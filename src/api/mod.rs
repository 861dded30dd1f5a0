//! The account service's request/response protocol, the HTTP service that
//! exposes a [`Ledger`](crate::application::Ledger), and the client used to call it.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{AccountClient, ClientError};
pub use protocol::{ErrorKind, Failure, Success, ERROR_KIND_HEADER};
pub use server::AccountService;
