//! Gearshop session and shopping-cart subsystem.
//!
//! This crate is the stateful core of the storefront: it tracks which
//! accounts are logged in, enforces at-most-one live session per account,
//! authorizes session-bound mutations, and keeps each account's cart
//! consistent across add/remove/adjust/checkout operations.
//!
//! The boundary layer (HTTP controllers, DTO mapping) lives elsewhere and
//! consumes only [`directory::AccountDirectory`]; everything below it is an
//! implementation detail of this crate.
//!
//! # Modules
//!
//! - [`cart`] - Cart lines, the two-step add flow, and purchase history
//! - [`session`] - The live-session registry
//! - [`auth`] - The admin-or-self authorization rule
//! - [`directory`] - The account table and the operations facade
//! - [`storage`] - Full-table persistence collaborator (JSON file)
//! - [`config`] - Environment-based configuration
//! - [`error`] - The error taxonomy returned to the boundary layer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

pub use cart::Cart;
pub use directory::AccountDirectory;
pub use error::{DirectoryError, Result};
pub use models::{Account, Address, NewAccount, Payment};
pub use session::{Session, SessionRegistry};
