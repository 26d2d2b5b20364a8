//! JSON-file implementation of the storage collaborator.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Account;

use super::{AccountStore, StorageError};

/// Stores the account table as one pretty-printed JSON array on disk.
///
/// Saves go through a sibling temp file followed by a rename, so a failed
/// write never truncates the existing data file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl AccountStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Account>, StorageError> {
        let bytes = fs::read(&self.path)?;
        let accounts = serde_json::from_slice(&bytes)?;
        tracing::info!(path = %self.path.display(), "loaded account table");
        Ok(accounts)
    }

    fn save(&self, accounts: &[Account]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(accounts)?;
        let temp = self.temp_path();
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            accounts = accounts.len(),
            "saved account table"
        );
        Ok(())
    }
}
