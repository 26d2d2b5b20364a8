//! Full-table persistence collaborator.
//!
//! The directory treats storage as a single-unit mirror of the account
//! table: load everything at startup, overwrite everything after each
//! successful mutation. Implementations only need those two operations;
//! [`json::JsonFileStore`] is the shipped one.

pub mod json;

use thiserror::Error;

use crate::models::Account;

pub use json::JsonFileStore;

/// Errors from loading or saving the account table.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying filesystem operation failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored account data could not be (de)serialized.
    #[error("malformed account data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Reader/writer for the account table as a single unit.
pub trait AccountStore: Send + Sync {
    /// Load the full account table.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the table cannot be read or parsed.
    /// Startup cannot proceed without it; the directory constructor
    /// propagates this as fatal.
    fn load(&self) -> Result<Vec<Account>, StorageError>;

    /// Overwrite the stored table with `accounts`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails. The directory rolls its
    /// in-memory mutation back when this happens, so stored and in-memory
    /// state never diverge silently.
    fn save(&self, accounts: &[Account]) -> Result<(), StorageError>;
}
