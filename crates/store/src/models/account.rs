//! Account record and its profile sub-resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gearshop_core::{AccountId, Email, SessionId};

use crate::cart::Cart;

/// Registration candidate: everything an account needs except its identity.
///
/// The directory assigns the ID and owns the uniqueness checks; callers only
/// supply profile data. The password is carried as an opaque string - the
/// storefront does not hash credentials (an explicit non-goal of this
/// subsystem).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Desired username; must be unique across the table.
    pub username: String,
    /// Contact email; must be unique across the table.
    pub email: Email,
    /// Login password.
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Profile picture URL.
    pub profile_picture: String,
}

/// A registered storefront account.
///
/// Each account exclusively owns its [`Cart`]. The `authenticated` flag and
/// `session_id` mirror the session registry for the benefit of the boundary
/// layer; the registry remains the source of truth for which sessions are
/// live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Table-unique ID, assigned at registration and never reused.
    pub id: AccountId,
    /// Unique username.
    pub username: String,
    /// Unique contact email.
    pub email: Email,
    /// Login password (plaintext by explicit non-goal).
    pub password: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Profile picture URL.
    pub profile_picture: String,
    /// Shipping address.
    pub address: Address,
    /// Payment details.
    pub payment: Payment,
    /// Whether a live session currently exists for this account.
    pub authenticated: bool,
    /// ID of the live session, if any.
    pub session_id: Option<SessionId>,
    /// The account's cart and purchase history.
    pub cart: Cart,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
    /// When the record was last replaced.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Materialize a registration candidate into a full record.
    #[must_use]
    pub fn create(id: AccountId, candidate: NewAccount, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: candidate.username,
            email: candidate.email,
            password: candidate.password,
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            profile_picture: candidate.profile_picture,
            address: Address::default(),
            payment: Payment::default(),
            authenticated: false,
            session_id: None,
            cart: Cart::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Shipping address for an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Card details for an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub card_holder: String,
    pub card_number: String,
    pub cvv: u16,
    pub exp_date: String,
}
