use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::domain::{data_file_name, Amount};

/// Durable record of one account's balance: a JSON-encoded integer in a single file.
#[derive(Debug, Clone)]
pub struct BalanceFile {
    path: PathBuf,
}

impl BalanceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The record for `account_name` inside `dir`.
    /// The directory is made absolute when possible so that logged paths are unambiguous.
    pub fn for_account(dir: impl AsRef<Path>, account_name: &str) -> Self {
        let dir = dir.as_ref();
        let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        Self::new(dir.join(data_file_name(account_name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the balance stored by a previous session.
    /// Returns `None` if no record exists, and an error if one exists but cannot be read.
    pub fn load(&self) -> Result<Option<Amount>> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read '{}'", self.path.display()));
            }
        };

        info!(path = %self.path.display(), "loading account data");
        let balance: Amount = serde_json::from_slice(&data)
            .with_context(|| format!("Corrupt account data in '{}'", self.path.display()))?;
        if balance < 0 {
            bail!(
                "Corrupt account data in '{}': negative balance {}",
                self.path.display(),
                balance
            );
        }

        Ok(Some(balance))
    }

    /// Overwrite the record with `balance` and sync it to disk.
    pub fn save(&self, balance: Amount) -> Result<()> {
        debug!(path = %self.path.display(), balance, "writing account data");

        let data = serde_json::to_vec_pretty(&balance).context("Failed to encode balance")?;
        let mut file = File::create(&self.path)
            .with_context(|| format!("Failed to create '{}'", self.path.display()))?;
        file.write_all(&data)
            .with_context(|| format!("Failed to write '{}'", self.path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync '{}'", self.path.display()))?;

        Ok(())
    }
}
