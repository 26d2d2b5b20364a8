//! The live-session registry.
//!
//! One entry per logged-in account, at most one per account at any time.
//! Session IDs come from a process-lifetime monotonic counter starting at 1
//! and are never reused. The registry is plain data; the directory wraps it
//! in its own lock (accounts first, then sessions - see `directory`).

use thiserror::Error;

use gearshop_core::{AccountId, SessionId};

use crate::models::Account;

/// Rejection for a second login attempt while a session is already live.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("account {0} already has a live session")]
pub struct DuplicateSession(pub AccountId);

/// A live login binding between a session ID and one account.
///
/// The account itself stays in the directory's table; a session carries only
/// the account's ID as its non-owning back-reference, so renames are visible
/// wherever the account is resolved through the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    account_id: AccountId,
}

impl Session {
    /// The session's ID.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// ID of the account that opened this session.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }
}

/// Set of currently live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
    last_id: i32,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `account`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateSession`] if the account already has a live
    /// session.
    pub fn open(&mut self, account: &Account) -> Result<Session, DuplicateSession> {
        if self.sessions.iter().any(|s| s.account_id == account.id) {
            return Err(DuplicateSession(account.id));
        }

        self.last_id += 1;
        let session = Session {
            id: SessionId::new(self.last_id),
            account_id: account.id,
        };
        self.sessions.push(session);
        Ok(session)
    }

    /// Close the session with the given ID, returning it if it was live.
    pub fn close(&mut self, id: SessionId) -> Option<Session> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(index))
    }

    /// Re-register a session closed by a mutation whose persistence write
    /// failed. Compensation only; never allocates an ID.
    pub(crate) fn restore(&mut self, session: Session) {
        if self.sessions.iter().all(|s| s.id != session.id) {
            self.sessions.push(session);
        }
    }

    /// Lazily iterate the sessions matching `predicate`.
    ///
    /// The iterator borrows current registry contents, not a snapshot;
    /// callers hold the registry's lock for the duration of the walk.
    pub fn find<P>(&self, predicate: P) -> impl Iterator<Item = &Session>
    where
        P: Fn(&Session) -> bool,
    {
        self.sessions.iter().filter(move |s| predicate(s))
    }

    /// The live session for an account, if any.
    #[must_use]
    pub fn by_account(&self, account_id: AccountId) -> Option<&Session> {
        self.find(|s| s.account_id() == account_id).next()
    }

    /// Look up a live session by its ID.
    #[must_use]
    pub fn by_id(&self, id: SessionId) -> Option<&Session> {
        self.find(|s| s.id() == id).next()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
