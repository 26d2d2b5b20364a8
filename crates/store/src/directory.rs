//! The account directory: the facade external collaborators consume.
//!
//! Owns the account table, the ID allocator, the session registry, and the
//! storage collaborator. Every mutating operation runs under the account
//! lock for its full duration, including the persistence write, and the
//! session lock is always taken after the account lock - never the other way
//! around.
//!
//! # Persistence contract
//!
//! The stored table is a full mirror of the in-memory one. A mutation that
//! fails to persist is rolled back in memory before the error is returned,
//! so the two never diverge silently.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use gearshop_core::{AccountId, Product, SessionId, Variant};

use crate::auth;
use crate::cart::Cart;
use crate::config::StoreConfig;
use crate::error::{DirectoryError, Result};
use crate::models::{Account, Address, NewAccount, Payment};
use crate::session::{Session, SessionRegistry};
use crate::storage::{AccountStore, JsonFileStore, StorageError};

/// Allocates account IDs, seeded from the highest ID present at load time.
/// IDs are monotonic and never reused, even when an allocation is abandoned
/// by a failed persist.
#[derive(Debug)]
struct IdAllocator {
    next: i32,
}

impl IdAllocator {
    fn seeded_from<'a>(accounts: impl Iterator<Item = &'a Account>) -> Self {
        let max = accounts.map(|a| a.id.as_i32()).max().unwrap_or(0);
        Self { next: max + 1 }
    }

    fn allocate(&mut self) -> AccountId {
        let id = AccountId::new(self.next);
        self.next += 1;
        id
    }
}

/// The account table plus its ID allocator; guarded by one mutex.
#[derive(Debug)]
struct AccountTable {
    accounts: BTreeMap<AccountId, Account>,
    ids: IdAllocator,
}

/// Recover the guard from a poisoned lock; the table is left consistent by
/// every operation's rollback path, so a panic elsewhere does not invalidate
/// the data.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session, cart, and account operations over one storage collaborator.
pub struct AccountDirectory<S> {
    // Lock order: `table` first, then `sessions`.
    table: Mutex<AccountTable>,
    sessions: Mutex<SessionRegistry>,
    store: S,
    admin_username: String,
}

impl AccountDirectory<JsonFileStore> {
    /// Build a directory over a JSON file store from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the account table cannot be
    /// loaded; the subsystem cannot start without it.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(
            JsonFileStore::new(config.data_file.clone()),
            config.admin_username.clone(),
        )
    }
}

impl<S: AccountStore> AccountDirectory<S> {
    /// Build a directory over `store`, loading the full account table.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the initial load fails; this
    /// is fatal for the subsystem.
    pub fn new(store: S, admin_username: impl Into<String>) -> Result<Self> {
        let mut accounts = BTreeMap::new();
        for account in store.load()? {
            accounts.insert(account.id, account);
        }
        let ids = IdAllocator::seeded_from(accounts.values());
        tracing::info!(accounts = accounts.len(), "account directory ready");

        Ok(Self {
            table: Mutex::new(AccountTable { accounts, ids }),
            sessions: Mutex::new(SessionRegistry::new()),
            store,
            admin_username: admin_username.into(),
        })
    }

    /// The storage collaborator this directory persists through.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn persist(&self, table: &AccountTable) -> std::result::Result<(), StorageError> {
        let accounts: Vec<Account> = table.accounts.values().cloned().collect();
        self.store.save(&accounts)
    }

    // =========================================================================
    // Account lifecycle
    // =========================================================================

    /// Register a new account and immediately log it in.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Conflict`] if the username or email is
    /// already taken, or [`DirectoryError::Storage`] if the table cannot be
    /// persisted (the registration is rolled back).
    pub fn register(&self, candidate: NewAccount) -> Result<Account> {
        let mut table = lock(&self.table);

        for existing in table.accounts.values() {
            if existing.username == candidate.username {
                return Err(DirectoryError::Conflict("username already taken".to_owned()));
            }
            if existing.email == candidate.email {
                return Err(DirectoryError::Conflict("email already registered".to_owned()));
            }
        }

        let id = table.ids.allocate();
        let mut account = Account::create(id, candidate, Utc::now());

        let session = lock(&self.sessions).open(&account)?;
        account.authenticated = true;
        account.session_id = Some(session.id());

        let stored = account.clone();
        table.accounts.insert(id, account);

        if let Err(err) = self.persist(&table) {
            table.accounts.remove(&id);
            lock(&self.sessions).close(session.id());
            return Err(err.into());
        }

        tracing::info!(account = %id, username = %stored.username, "account registered");
        Ok(stored)
    }

    /// Log an account in by exact username and password match.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unauthorized`] when the credentials match no
    /// account, [`DirectoryError::DuplicateSession`] when the account is
    /// already logged in, or [`DirectoryError::Storage`] on a failed persist
    /// (the login is rolled back).
    pub fn login(&self, username: &str, password: &str) -> Result<Account> {
        let mut table = lock(&self.table);

        let account_id = table
            .accounts
            .values()
            .find(|a| a.username == username && a.password == password)
            .map(|a| a.id)
            .ok_or(DirectoryError::Unauthorized)?;

        let session = {
            let account = table.accounts.get(&account_id).ok_or(DirectoryError::NotFound)?;
            lock(&self.sessions).open(account)?
        };

        let stored = {
            let account = table
                .accounts
                .get_mut(&account_id)
                .ok_or(DirectoryError::NotFound)?;
            account.authenticated = true;
            account.session_id = Some(session.id());
            account.clone()
        };

        if let Err(err) = self.persist(&table) {
            if let Some(account) = table.accounts.get_mut(&account_id) {
                account.authenticated = false;
                account.session_id = None;
            }
            lock(&self.sessions).close(session.id());
            return Err(err.into());
        }

        tracing::info!(account = %account_id, %username, session = %session.id(), "logged in");
        Ok(stored)
    }

    /// Log an account out, closing its live session.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when no such account exists or no
    /// authorized session is live for it, or [`DirectoryError::Storage`] on a
    /// failed persist (the logout is rolled back).
    pub fn logout(&self, username: &str) -> Result<Account> {
        let mut table = lock(&self.table);

        let account_id = table
            .accounts
            .values()
            .find(|a| a.username == username)
            .map(|a| a.id)
            .ok_or(DirectoryError::NotFound)?;

        let closed = {
            let mut sessions = lock(&self.sessions);
            // The target's own session always passes the admin-or-self gate.
            let session_id = sessions
                .by_account(account_id)
                .map(Session::id)
                .ok_or(DirectoryError::NotFound)?;
            sessions.close(session_id).ok_or(DirectoryError::NotFound)?
        };

        let stored = {
            let account = table
                .accounts
                .get_mut(&account_id)
                .ok_or(DirectoryError::NotFound)?;
            account.authenticated = false;
            account.session_id = None;
            account.clone()
        };

        if let Err(err) = self.persist(&table) {
            if let Some(account) = table.accounts.get_mut(&account_id) {
                account.authenticated = true;
                account.session_id = Some(closed.id());
            }
            lock(&self.sessions).restore(closed);
            return Err(err.into());
        }

        tracing::info!(account = %account_id, %username, "logged out");
        Ok(stored)
    }

    /// Fetch an account by ID.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if no account has this ID.
    pub fn get(&self, id: AccountId) -> Result<Account> {
        lock(&self.table)
            .accounts
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// All accounts, ordered by ID.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        lock(&self.table).accounts.values().cloned().collect()
    }

    /// The account bound to a live session.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if the session is not live or its
    /// account no longer exists.
    pub fn current_account(&self, session_id: SessionId) -> Result<Account> {
        let table = lock(&self.table);
        let sessions = lock(&self.sessions);
        let session = sessions.by_id(session_id).ok_or(DirectoryError::NotFound)?;
        table
            .accounts
            .get(&session.account_id())
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// Delete an account, closing its session.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] for an unknown ID,
    /// [`DirectoryError::Unauthorized`] when no live session passes the
    /// admin-or-self check for the target, or [`DirectoryError::Storage`] on
    /// a failed persist (the deletion is rolled back).
    pub fn delete(&self, id: AccountId) -> Result<()> {
        let mut table = lock(&self.table);

        let removed_session = {
            let account = table.accounts.get(&id).ok_or(DirectoryError::NotFound)?;
            let mut sessions = lock(&self.sessions);

            if sessions
                .find(|s| {
                    table
                        .accounts
                        .get(&s.account_id())
                        .is_some_and(|actor| auth::authorize(actor, account, &self.admin_username))
                })
                .next()
                .is_none()
            {
                return Err(DirectoryError::Unauthorized);
            }

            let own = sessions.by_account(id).map(Session::id);
            own.and_then(|session_id| sessions.close(session_id))
        };

        let removed = table.accounts.remove(&id).ok_or(DirectoryError::NotFound)?;

        if let Err(err) = self.persist(&table) {
            table.accounts.insert(id, removed);
            if let Some(session) = removed_session {
                lock(&self.sessions).restore(session);
            }
            return Err(err.into());
        }

        tracing::info!(account = %id, "account deleted");
        Ok(())
    }

    /// Replace a stored account record wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] for an unknown ID,
    /// [`DirectoryError::Conflict`] when the new username or email collides
    /// with another account, [`DirectoryError::Unauthorized`] when no live
    /// session passes the admin-or-self check, or [`DirectoryError::Storage`]
    /// on a failed persist (the update is rolled back).
    pub fn update(&self, account: Account) -> Result<Account> {
        let mut table = lock(&self.table);

        if !table.accounts.contains_key(&account.id) {
            return Err(DirectoryError::NotFound);
        }

        if table.accounts.values().any(|a| {
            a.id != account.id && (a.username == account.username || a.email == account.email)
        }) {
            return Err(DirectoryError::Conflict(
                "username or email already taken".to_owned(),
            ));
        }

        let authorized = lock(&self.sessions)
            .find(|s| {
                table
                    .accounts
                    .get(&s.account_id())
                    .is_some_and(|actor| auth::authorize(actor, &account, &self.admin_username))
            })
            .next()
            .is_some();
        if !authorized {
            return Err(DirectoryError::Unauthorized);
        }

        let mut incoming = account;
        incoming.updated_at = Utc::now();
        let previous = table.accounts.insert(incoming.id, incoming.clone());

        if let Err(err) = self.persist(&table) {
            match previous {
                Some(prev) => {
                    table.accounts.insert(prev.id, prev);
                }
                None => {
                    table.accounts.remove(&incoming.id);
                }
            }
            return Err(err.into());
        }

        Ok(incoming)
    }

    // =========================================================================
    // Cart operations (keyed by account ID)
    // =========================================================================

    /// The cart of the given account's live session, or an empty cart when no
    /// session is live. The empty cart is a defensive fallback for stale
    /// clients, not an error.
    #[must_use]
    pub fn cart(&self, account_id: AccountId) -> Cart {
        let table = lock(&self.table);
        if lock(&self.sessions).by_account(account_id).is_none() {
            tracing::warn!(account = %account_id, "cart read without a live session");
            return Cart::default();
        }
        table
            .accounts
            .get(&account_id)
            .map(|a| a.cart.clone())
            .unwrap_or_default()
    }

    /// Apply one cart mutation under the session gate, persist, and hand back
    /// the resulting cart. No live session yields an untouched empty cart.
    fn mutate_cart<F>(&self, account_id: AccountId, mutate: F) -> Result<Cart>
    where
        F: FnOnce(&mut Cart),
    {
        let mut table = lock(&self.table);

        if lock(&self.sessions).by_account(account_id).is_none() {
            tracing::warn!(account = %account_id, "cart mutation without a live session");
            return Ok(Cart::default());
        }

        let Some(account) = table.accounts.get_mut(&account_id) else {
            return Ok(Cart::default());
        };

        let snapshot = account.cart.clone();
        mutate(&mut account.cart);
        let result = account.cart.clone();

        if let Err(err) = self.persist(&table) {
            if let Some(account) = table.accounts.get_mut(&account_id) {
                account.cart = snapshot;
            }
            return Err(err.into());
        }

        Ok(result)
    }

    /// Put an item in the account's cart (first half of the two-step add).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] on a failed persist.
    pub fn add_item(&self, account_id: AccountId, item: Product) -> Result<Cart> {
        self.mutate_cart(account_id, |cart| cart.add_item(item))
    }

    /// Choose a variant (second half of the two-step add).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] on a failed persist.
    pub fn add_variant(&self, account_id: AccountId, variant: Variant) -> Result<Cart> {
        self.mutate_cart(account_id, |cart| cart.add_variant(variant))
    }

    /// Remove the cart line at `index`; out-of-range is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] on a failed persist.
    pub fn remove_line(&self, account_id: AccountId, index: usize) -> Result<Cart> {
        self.mutate_cart(account_id, |cart| cart.remove_line(index))
    }

    /// Raise the quantity of the line at `index` by 1.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] on a failed persist.
    pub fn increment(&self, account_id: AccountId, index: usize) -> Result<Cart> {
        self.mutate_cart(account_id, |cart| cart.increment(index))
    }

    /// Lower the quantity of the line at `index` by 1, removing it at 1.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] on a failed persist.
    pub fn decrement(&self, account_id: AccountId, index: usize) -> Result<Cart> {
        self.mutate_cart(account_id, |cart| cart.decrement(index))
    }

    /// Check the cart out, moving its lines into the purchase history.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] on a failed persist.
    pub fn checkout(&self, account_id: AccountId) -> Result<Cart> {
        self.mutate_cart(account_id, Cart::checkout)
    }

    /// Replace the account's cart wholesale (client cart sync).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] on a failed persist.
    pub fn replace_cart(&self, account_id: AccountId, cart: Cart) -> Result<Cart> {
        self.mutate_cart(account_id, |current| current.replace(cart))
    }

    /// The account's purchase history as two index-aligned sequences of
    /// items and quantities. No live session yields two empty sequences.
    #[must_use]
    pub fn purchase_history(&self, account_id: AccountId) -> (Vec<Product>, Vec<u32>) {
        let table = lock(&self.table);
        if lock(&self.sessions).by_account(account_id).is_none() {
            return (Vec::new(), Vec::new());
        }
        table.accounts.get(&account_id).map_or_else(
            || (Vec::new(), Vec::new()),
            |account| {
                let items = account.cart.history_items().into_iter().cloned().collect();
                (items, account.cart.history_quantities())
            },
        )
    }

    // =========================================================================
    // Profile sub-resources
    // =========================================================================

    /// Apply one profile mutation under the session gate and persist.
    fn update_profile<F>(&self, account_id: AccountId, apply: F) -> Result<Account>
    where
        F: FnOnce(&mut Account),
    {
        let mut table = lock(&self.table);

        if lock(&self.sessions).by_account(account_id).is_none() {
            return Err(DirectoryError::NotFound);
        }

        let snapshot = {
            let account = table
                .accounts
                .get_mut(&account_id)
                .ok_or(DirectoryError::NotFound)?;
            let snapshot = account.clone();
            apply(account);
            account.updated_at = Utc::now();
            snapshot
        };

        let result = table
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(DirectoryError::NotFound)?;

        if let Err(err) = self.persist(&table) {
            table.accounts.insert(account_id, snapshot);
            return Err(err.into());
        }

        Ok(result)
    }

    /// The shipping address of the session-bound account.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when no session is live for the
    /// account.
    pub fn address(&self, account_id: AccountId) -> Result<Address> {
        let table = lock(&self.table);
        if lock(&self.sessions).by_account(account_id).is_none() {
            return Err(DirectoryError::NotFound);
        }
        table
            .accounts
            .get(&account_id)
            .map(|a| a.address.clone())
            .ok_or(DirectoryError::NotFound)
    }

    /// Replace the shipping address of the session-bound account.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when no session is live, or
    /// [`DirectoryError::Storage`] on a failed persist.
    pub fn set_address(&self, account_id: AccountId, address: Address) -> Result<Address> {
        self.update_profile(account_id, |account| account.address = address)
            .map(|account| account.address)
    }

    /// The payment details of the session-bound account.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when no session is live for the
    /// account.
    pub fn payment(&self, account_id: AccountId) -> Result<Payment> {
        let table = lock(&self.table);
        if lock(&self.sessions).by_account(account_id).is_none() {
            return Err(DirectoryError::NotFound);
        }
        table
            .accounts
            .get(&account_id)
            .map(|a| a.payment.clone())
            .ok_or(DirectoryError::NotFound)
    }

    /// Replace the payment details of the session-bound account.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] when no session is live, or
    /// [`DirectoryError::Storage`] on a failed persist.
    pub fn set_payment(&self, account_id: AccountId, payment: Payment) -> Result<Payment> {
        self.update_profile(account_id, |account| account.payment = payment)
            .map(|account| account.payment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gearshop_core::Email;

    use super::*;

    /// In-memory store: an empty table that accepts every save.
    struct NullStore;

    impl AccountStore for NullStore {
        fn load(&self) -> std::result::Result<Vec<Account>, StorageError> {
            Ok(Vec::new())
        }

        fn save(&self, _accounts: &[Account]) -> std::result::Result<(), StorageError> {
            Ok(())
        }
    }

    fn candidate(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_owned(),
            email: Email::parse(&format!("{username}@gearshop.dev")).unwrap(),
            password: "pw".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            profile_picture: String::new(),
        }
    }

    #[test]
    fn ids_are_seeded_past_the_loaded_maximum() {
        struct Seeded;
        impl AccountStore for Seeded {
            fn load(&self) -> std::result::Result<Vec<Account>, StorageError> {
                Ok(vec![Account::create(
                    AccountId::new(4),
                    candidate("old"),
                    Utc::now(),
                )])
            }
            fn save(&self, _: &[Account]) -> std::result::Result<(), StorageError> {
                Ok(())
            }
        }

        let directory = AccountDirectory::new(Seeded, auth::DEFAULT_ADMIN_USERNAME).unwrap();
        let account = directory.register(candidate("ana")).unwrap();
        assert_eq!(account.id, AccountId::new(5));
    }

    #[test]
    fn register_rejects_duplicate_username_and_email() {
        let directory = AccountDirectory::new(NullStore, auth::DEFAULT_ADMIN_USERNAME).unwrap();
        directory.register(candidate("ana")).unwrap();

        assert!(matches!(
            directory.register(candidate("ana")),
            Err(DirectoryError::Conflict(_))
        ));

        let mut same_email = candidate("other");
        same_email.email = Email::parse("ana@gearshop.dev").unwrap();
        assert!(matches!(
            directory.register(same_email),
            Err(DirectoryError::Conflict(_))
        ));
    }

    #[test]
    fn register_logs_the_account_in() {
        let directory = AccountDirectory::new(NullStore, auth::DEFAULT_ADMIN_USERNAME).unwrap();
        let account = directory.register(candidate("ana")).unwrap();

        assert!(account.authenticated);
        assert_eq!(account.session_id, Some(SessionId::new(1)));
        assert_eq!(
            directory.current_account(SessionId::new(1)).unwrap().id,
            account.id
        );
    }

    #[test]
    fn cart_ops_without_a_session_return_an_empty_cart() {
        let directory = AccountDirectory::new(NullStore, auth::DEFAULT_ADMIN_USERNAME).unwrap();
        let ghost = AccountId::new(99);

        assert!(directory.cart(ghost).is_empty());
        assert!(directory.remove_line(ghost, 0).unwrap().is_empty());
        let (items, quantities) = directory.purchase_history(ghost);
        assert!(items.is_empty());
        assert!(quantities.is_empty());
    }

    #[test]
    fn startup_fails_without_a_loadable_table() {
        struct Broken;
        impl AccountStore for Broken {
            fn load(&self) -> std::result::Result<Vec<Account>, StorageError> {
                Err(StorageError::Io(std::io::Error::other("disk gone")))
            }
            fn save(&self, _: &[Account]) -> std::result::Result<(), StorageError> {
                Ok(())
            }
        }

        assert!(matches!(
            AccountDirectory::new(Broken, auth::DEFAULT_ADMIN_USERNAME),
            Err(DirectoryError::Storage(_))
        ));
    }
}
