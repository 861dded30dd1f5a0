pub mod api;
pub mod application;
pub mod cli;
pub mod domain;
pub mod storage;

pub use application::{AppError, Ledger};
pub use domain::*;
