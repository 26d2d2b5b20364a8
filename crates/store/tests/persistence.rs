//! Persistence contract tests: the stored table mirrors the in-memory one,
//! a failed save rolls the mutation back, and a reload sees everything a
//! prior process persisted.

#![allow(clippy::unwrap_used)]

mod common;

use gearshop_core::Variant;
use gearshop_store::auth::DEFAULT_ADMIN_USERNAME;
use gearshop_store::config::StoreConfig;
use gearshop_store::storage::JsonFileStore;
use gearshop_store::{AccountDirectory, DirectoryError};

use common::{FlakyStore, candidate, product};

#[test]
fn reload_sees_registered_accounts_and_their_carts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.json");
    std::fs::write(&path, b"[]").unwrap();

    let alice_id = {
        let directory =
            AccountDirectory::new(JsonFileStore::new(&path), DEFAULT_ADMIN_USERNAME).unwrap();
        let alice = directory.register(candidate("alice")).unwrap();
        directory.add_item(alice.id, product(1, "Nova Headset")).unwrap();
        directory.add_variant(alice.id, Variant::new("Black")).unwrap();
        alice.id
    };

    let reloaded =
        AccountDirectory::new(JsonFileStore::new(&path), DEFAULT_ADMIN_USERNAME).unwrap();
    let alice = reloaded.get(alice_id).unwrap();
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.cart.len(), 1);
    assert_eq!(alice.cart.quantities(), vec![1]);

    // Sessions are process-local; the reloaded directory has none, so the
    // account must log in again before mutating its cart.
    assert!(matches!(
        reloaded.logout("alice"),
        Err(DirectoryError::NotFound)
    ));
    reloaded.login("alice", "pw").unwrap();

    // ID allocation continues past the persisted maximum.
    let ben = reloaded.register(candidate("ben")).unwrap();
    assert!(ben.id > alice_id);
}

#[test]
fn startup_without_a_data_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("missing.json"));

    assert!(matches!(
        AccountDirectory::new(store, DEFAULT_ADMIN_USERNAME),
        Err(DirectoryError::Storage(_))
    ));
}

#[test]
#[allow(unsafe_code)]
fn directory_builds_from_environment_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.json");
    std::fs::write(&path, b"[]").unwrap();

    unsafe {
        std::env::set_var("GEARSHOP_DATA_FILE", &path);
        std::env::set_var("GEARSHOP_ADMIN_USERNAME", "root");
    }
    let config = StoreConfig::from_env().unwrap();
    let directory = AccountDirectory::from_config(&config).unwrap();
    unsafe {
        std::env::remove_var("GEARSHOP_DATA_FILE");
        std::env::remove_var("GEARSHOP_ADMIN_USERNAME");
    }

    directory.register(candidate("root")).unwrap();
    let ana = directory.register(candidate("ana")).unwrap();
    directory.logout("ana").unwrap();

    // "root" is the configured superuser marker, so its session authorizes
    // deleting the logged-out account.
    directory.delete(ana.id).unwrap();
}

#[test]
fn failed_persist_rolls_back_a_registration() {
    let directory = AccountDirectory::new(FlakyStore::default(), DEFAULT_ADMIN_USERNAME).unwrap();

    directory.store().fail_next_saves(true);
    assert!(matches!(
        directory.register(candidate("alice")),
        Err(DirectoryError::Storage(_))
    ));

    directory.store().fail_next_saves(false);
    assert!(directory.accounts().is_empty());
    assert!(matches!(
        directory.login("alice", "pw"),
        Err(DirectoryError::Unauthorized)
    ));

    // The table is clean, so the same registration succeeds now.
    directory.register(candidate("alice")).unwrap();
}

#[test]
fn failed_persist_rolls_back_a_cart_mutation() {
    let directory = AccountDirectory::new(FlakyStore::default(), DEFAULT_ADMIN_USERNAME).unwrap();
    let alice = directory.register(candidate("alice")).unwrap();

    directory.store().fail_next_saves(true);
    assert!(matches!(
        directory.add_item(alice.id, product(1, "Nova Headset")),
        Err(DirectoryError::Storage(_))
    ));

    directory.store().fail_next_saves(false);
    assert!(directory.cart(alice.id).is_empty());
}

#[test]
fn failed_persist_rolls_back_a_logout() {
    let directory = AccountDirectory::new(FlakyStore::default(), DEFAULT_ADMIN_USERNAME).unwrap();
    directory.register(candidate("alice")).unwrap();

    directory.store().fail_next_saves(true);
    assert!(matches!(
        directory.logout("alice"),
        Err(DirectoryError::Storage(_))
    ));

    directory.store().fail_next_saves(false);
    // The session was restored: a fresh login is still a duplicate, and the
    // logout completes normally once saves succeed again.
    assert!(matches!(
        directory.login("alice", "pw"),
        Err(DirectoryError::DuplicateSession(_))
    ));
    let alice = directory.logout("alice").unwrap();
    assert!(!alice.authenticated);
}
