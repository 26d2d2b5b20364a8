//! Shared fixtures for the scenario tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;

use gearshop_core::{CurrencyCode, Email, Price, Product, ProductCategory, ProductId, Variant};
use gearshop_store::models::{Account, NewAccount};
use gearshop_store::storage::{AccountStore, StorageError};

/// Registration candidate with a deterministic email.
pub fn candidate(username: &str) -> NewAccount {
    NewAccount {
        username: username.to_owned(),
        email: Email::parse(&format!("{username}@gearshop.dev")).expect("fixture email"),
        password: "pw".to_owned(),
        first_name: "Test".to_owned(),
        last_name: "Account".to_owned(),
        profile_picture: String::new(),
    }
}

/// Catalog product fixture.
pub fn product(id: i32, name: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        category: ProductCategory::Headset,
        price: Price::new(Decimal::new(12_900, 2), CurrencyCode::Usd),
        stock: 3,
        description: String::new(),
        image_url: String::new(),
        variants: vec![Variant::new("Black"), Variant::new("Crimson")],
    }
}

/// Store that keeps nothing and accepts every save.
pub struct NullStore;

impl AccountStore for NullStore {
    fn load(&self) -> Result<Vec<Account>, StorageError> {
        Ok(Vec::new())
    }

    fn save(&self, _accounts: &[Account]) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Store whose saves can be made to fail on demand, for exercising the
/// rollback-on-failed-persist contract.
#[derive(Default)]
pub struct FlakyStore {
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn fail_next_saves(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }
}

impl AccountStore for FlakyStore {
    fn load(&self) -> Result<Vec<Account>, StorageError> {
        Ok(Vec::new())
    }

    fn save(&self, _accounts: &[Account]) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other(
                "injected save failure",
            )));
        }
        Ok(())
    }
}
