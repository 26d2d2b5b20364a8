//! Domain records owned by the account directory.

pub mod account;

pub use account::{Account, Address, NewAccount, Payment};
