//! Error taxonomy for the session and cart subsystem.
//!
//! Validation failures (conflict, not-found, unauthorized, duplicate session)
//! are typed outcomes the boundary layer translates into responses; they are
//! never panics. Storage failures are the only I/O-shaped variant and carry
//! the underlying cause.

use thiserror::Error;

use crate::session::DuplicateSession;
use crate::storage::StorageError;

/// Errors returned by [`crate::directory::AccountDirectory`] operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Username or email already taken by another account.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No account (or no live session) matches the request.
    #[error("not found")]
    NotFound,

    /// The caller's session does not pass the admin-or-self check, or the
    /// supplied credentials do not match any account.
    #[error("unauthorized")]
    Unauthorized,

    /// The account already has a live session.
    #[error(transparent)]
    DuplicateSession(#[from] DuplicateSession),

    /// Persisting or loading the account table failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;
