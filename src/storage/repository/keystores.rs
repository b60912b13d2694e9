// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodied keystore repository.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/keystores/{user_id}.json
//! ```
//!
//! The server stores keystores as opaque ciphertext and never decrypts them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{FileStorage, StorageError, StorageResult};
use crate::wallet::EncryptedKeystore;

/// Keystore record stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredKeystore {
    pub user_id: String,
    /// Address recorded in the keystore (checksummed)
    pub address: String,
    pub keystore: EncryptedKeystore,
    pub updated_at: DateTime<Utc>,
}

/// Repository for custodied keystores.
pub struct KeystoreRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> KeystoreRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, user_id: &str) -> bool {
        self.storage.exists(self.storage.paths().keystore(user_id))
    }

    /// Get the keystore for `user_id`.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredKeystore> {
        self.storage
            .read_json(self.storage.paths().keystore(user_id))
            .map_err(|e| match e {
                StorageError::NotFound(_) => StorageError::NotFound(format!("Keystore for {user_id}")),
                other => other,
            })
    }

    /// Insert or replace the keystore for `record.user_id`.
    pub fn put(&self, record: &StoredKeystore) -> StorageResult<()> {
        self.storage
            .write_json(self.storage.paths().keystore(&record.user_id), record)
    }

    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        self.storage.delete(self.storage.paths().keystore(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use crate::wallet::{encrypt_with_params, import_from_private_key, keystore::tests::test_params};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    fn record(user_id: &str) -> StoredKeystore {
        let key = import_from_private_key(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let keystore = encrypt_with_params(&key, "hunter22", &test_params()).unwrap();
        StoredKeystore {
            user_id: user_id.to_string(),
            address: keystore.address.clone(),
            keystore,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn put_get_replace_delete() {
        let (_temp, storage) = setup();
        let repo = KeystoreRepository::new(&storage);

        assert!(matches!(repo.get("user-1"), Err(StorageError::NotFound(_))));

        let first = record("user-1");
        repo.put(&first).unwrap();
        let fetched = repo.get("user-1").unwrap();
        assert_eq!(fetched.keystore, first.keystore);

        let second = record("user-1");
        repo.put(&second).unwrap();
        assert_eq!(repo.get("user-1").unwrap().keystore, second.keystore);

        repo.delete("user-1").unwrap();
        assert!(!repo.exists("user-1"));
    }
}
