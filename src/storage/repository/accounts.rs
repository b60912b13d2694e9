// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account repository.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/accounts/{lowercase_address}.json
//! ```
//!
//! One account per address. The platform password is stored only as an
//! Argon2 PHC string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{FileStorage, StorageError, StorageResult};
use crate::models::UserProfile;

/// Account record stored on disk.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    /// EIP-55 checksummed address
    pub address: String,
    /// Argon2 PHC hash of the platform password
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("user_id", &self.user_id)
            .field("address", &self.address)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("last_login_at", &self.last_login_at)
            .finish()
    }
}

impl From<&Account> for UserProfile {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.user_id.clone(),
            address: account.address.clone(),
            created_at: account.created_at,
        }
    }
}

/// Normalized storage key for an address.
pub fn address_key(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Repository for account records.
pub struct AccountRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> AccountRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if an account is bound to `address`.
    pub fn exists(&self, address: &str) -> bool {
        self.storage
            .exists(self.storage.paths().account(&address_key(address)))
    }

    /// Get the account bound to `address`.
    pub fn get_by_address(&self, address: &str) -> StorageResult<Account> {
        let path = self.storage.paths().account(&address_key(address));
        self.storage.read_json(path).map_err(|e| match e {
            StorageError::NotFound(_) => StorageError::NotFound(format!("Account {address}")),
            other => other,
        })
    }

    /// Create an account.
    ///
    /// Returns [`StorageError::AlreadyExists`] if the address is already bound.
    pub fn create(&self, account: &Account) -> StorageResult<()> {
        let path = self.storage.paths().account(&address_key(&account.address));
        self.storage.create_json(path, account).map_err(|e| match e {
            StorageError::AlreadyExists(_) => {
                StorageError::AlreadyExists(format!("Account {}", account.address))
            }
            other => other,
        })
    }

    /// Record a successful sign-in.
    pub fn record_login(&self, address: &str, at: DateTime<Utc>) -> StorageResult<Account> {
        let mut account = self.get_by_address(address)?;
        account.last_login_at = Some(at);
        self.storage
            .write_json(self.storage.paths().account(&address_key(address)), &account)?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    fn account(address: &str) -> Account {
        Account {
            user_id: uuid::Uuid::new_v4().to_string(),
            address: address.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn create_and_lookup_is_case_insensitive() {
        let (_temp, storage) = setup();
        let repo = AccountRepository::new(&storage);

        let acc = account("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        repo.create(&acc).unwrap();

        let found = repo
            .get_by_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
            .unwrap();
        assert_eq!(found.user_id, acc.user_id);
        assert!(repo.exists("0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266"));
    }

    #[test]
    fn duplicate_address_is_rejected() {
        let (_temp, storage) = setup();
        let repo = AccountRepository::new(&storage);

        repo.create(&account("0xabc")).unwrap();
        let err = repo.create(&account("0xABC")).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn record_login_updates_timestamp() {
        let (_temp, storage) = setup();
        let repo = AccountRepository::new(&storage);
        repo.create(&account("0xabc")).unwrap();

        let now = Utc::now();
        let updated = repo.record_login("0xabc", now).unwrap();
        assert_eq!(updated.last_login_at, Some(now));
        assert_eq!(repo.get_by_address("0xabc").unwrap().last_login_at, Some(now));
    }

    #[test]
    fn missing_account_is_not_found() {
        let (_temp, storage) = setup();
        let repo = AccountRepository::new(&storage);
        assert!(matches!(
            repo.get_by_address("0xdead"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn debug_redacts_password_hash() {
        let acc = account("0xabc");
        assert!(!format!("{acc:?}").contains("argon2id"));
    }
}
