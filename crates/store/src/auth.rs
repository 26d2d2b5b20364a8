//! The admin-or-self authorization rule.

use crate::models::Account;

/// Username that marks the superuser account unless overridden in config.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Decide whether `actor` may mutate `target`.
///
/// True when the actor is the superuser (its current username equals
/// `admin_username`) or the target account itself. Callers resolve the actor
/// from the account table at check time, so a rename takes effect for the
/// actor's live session immediately. Pure; this is the sole gate for update,
/// delete, and logout operations on an account.
#[must_use]
pub fn authorize(actor: &Account, target: &Account, admin_username: &str) -> bool {
    actor.username == admin_username || actor.id == target.id
}
