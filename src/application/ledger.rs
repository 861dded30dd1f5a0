use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{error, info};

use crate::domain::{validate_account_name, Account, Amount, TransactionId, TransactionKind};
use crate::storage::BalanceFile;

use super::AppError;

/// The exclusive owner of one account's balance and its durable record.
///
/// One `Ledger` exists per running service. Deposits and withdrawals run entirely
/// inside a single critical section (balance check, mutation, transaction ID, idempotency
/// cache update and the write to disk), so concurrent requests never lose updates and
/// two requests carrying the same idempotency key never both apply.
///
/// Idempotency keys are only remembered for the lifetime of the process. After a
/// restart, a retry of a request whose response was lost will be applied again.
pub struct Ledger {
    name: String,
    store: BalanceFile,
    state: Mutex<LedgerState>,
}

struct LedgerState {
    account: Account,
    /// idempotency key -> transaction ID it produced
    requests: HashMap<String, TransactionId>,
}

impl Ledger {
    /// Open the ledger for `name` in the current working directory.
    pub fn open(name: &str) -> Result<Self, AppError> {
        Self::open_in(name, ".")
    }

    /// Open the ledger for `name`, keeping its record in `dir`.
    /// The balance is restored from the previous session, or starts at zero.
    pub fn open_in(name: &str, dir: impl AsRef<Path>) -> Result<Self, AppError> {
        validate_account_name(name)?;
        Self::with_store(name, BalanceFile::for_account(dir, name))
    }

    pub fn with_store(name: &str, store: BalanceFile) -> Result<Self, AppError> {
        let balance = store.load()?.unwrap_or(0);
        info!(account = name, balance, path = %store.path().display(), "opened ledger");

        Ok(Self {
            name: name.to_string(),
            store,
            state: Mutex::new(LedgerState {
                account: Account::new(balance),
                requests: HashMap::new(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Amount {
        self.lock().account.balance
    }

    /// Path of the file where the balance is persisted.
    pub fn data_path(&self) -> &Path {
        self.store.path()
    }

    /// Add `amount` to the balance. A non-empty `idempotency_key` that was already used
    /// (by a deposit or a withdrawal) returns the original transaction ID without
    /// touching the balance.
    pub fn deposit(
        &self,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<TransactionId, AppError> {
        if amount < 1 {
            return Err(AppError::InvalidAmount(amount));
        }

        let mut state = self.lock();
        if let Some(tx_id) = state.previous(idempotency_key) {
            return Ok(tx_id);
        }

        state
            .account
            .credit(amount)
            .ok_or(AppError::InvalidAmount(amount))?;
        let tx_id = self.commit(&mut state, TransactionKind::Deposit, idempotency_key)?;

        info!(account = %self.name, amount, tx_id = %tx_id, "deposit complete");
        Ok(tx_id)
    }

    /// Remove `amount` from the balance.
    ///
    /// The funds check happens before the idempotency lookup, so replaying a key after
    /// the balance has dropped below `amount` reports insufficient funds.
    pub fn withdraw(
        &self,
        amount: Amount,
        idempotency_key: &str,
    ) -> Result<TransactionId, AppError> {
        if amount < 1 {
            return Err(AppError::InvalidAmount(amount));
        }

        let mut state = self.lock();
        state.account.ensure_funds(amount)?;
        if let Some(tx_id) = state.previous(idempotency_key) {
            return Ok(tx_id);
        }

        state.account.debit(amount)?;
        let tx_id = self.commit(&mut state, TransactionKind::Withdrawal, idempotency_key)?;

        info!(account = %self.name, amount, tx_id = %tx_id, "withdrawal complete");
        Ok(tx_id)
    }

    // The in-memory balance has already changed when this runs. A failed write is
    // reported to the caller but not rolled back; the next successful write catches up.
    fn commit(
        &self,
        state: &mut LedgerState,
        kind: TransactionKind,
        idempotency_key: &str,
    ) -> Result<TransactionId, AppError> {
        let tx_id = TransactionId::generate(kind);
        if !idempotency_key.is_empty() {
            state
                .requests
                .insert(idempotency_key.to_string(), tx_id.clone());
        }

        if let Err(err) = self.store.save(state.account.balance) {
            error!(
                account = %self.name,
                %kind,
                error = %format!("{err:#}"),
                "could not save account data"
            );
            return Err(err.into());
        }

        Ok(tx_id)
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerState {
    fn previous(&self, idempotency_key: &str) -> Option<TransactionId> {
        if idempotency_key.is_empty() {
            return None;
        }
        let tx_id = self.requests.get(idempotency_key)?;
        info!(
            idempotency_key,
            tx_id = %tx_id,
            "duplicate request, returning original transaction"
        );
        Some(tx_id.clone())
    }
}
