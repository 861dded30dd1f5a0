// Application layer - the ledger that owns an account and its durable state.
// Network exposure lives in `api`; this layer knows nothing about the wire.

pub mod error;
pub mod ledger;

pub use error::*;
pub use ledger::*;
