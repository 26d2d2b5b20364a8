//! Gearshop Core - Shared types library.
//!
//! This crate provides common types used across all Gearshop components:
//! - `store` - The session and shopping-cart subsystem
//! - the boundary layer (HTTP controllers) that consumes it
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no locking, no persistence.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, validated emails, prices, and the product model

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
