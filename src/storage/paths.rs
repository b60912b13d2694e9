// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for persistent storage.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Account Paths ==========

    /// Directory containing all accounts.
    pub fn accounts_dir(&self) -> PathBuf {
        self.root.join("accounts")
    }

    /// Path to an account record, keyed by lowercase address.
    pub fn account(&self, address_key: &str) -> PathBuf {
        self.accounts_dir().join(format!("{address_key}.json"))
    }

    // ========== Keystore Paths ==========

    /// Directory containing custodied keystores.
    pub fn keystores_dir(&self) -> PathBuf {
        self.root.join("keystores")
    }

    /// Path to a user's keystore.
    pub fn keystore(&self, user_id: &str) -> PathBuf {
        self.keystores_dir().join(format!("{user_id}.json"))
    }

    // ========== Client Session ==========

    /// Persisted client session (client-side data directory only).
    pub fn session_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("/data"));
    }

    #[test]
    fn account_and_keystore_paths_are_correct() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(
            paths.account("0xabc"),
            PathBuf::from("/tmp/test-data/accounts/0xabc.json")
        );
        assert_eq!(
            paths.keystore("user-1"),
            PathBuf::from("/tmp/test-data/keystores/user-1.json")
        );
        assert_eq!(
            paths.session_file(),
            PathBuf::from("/tmp/test-data/session.json")
        );
    }

    #[test]
    fn audit_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(paths.audit_dir(), PathBuf::from("/data/audit"));
        assert_eq!(
            paths.audit_events_file("2026-01-28"),
            PathBuf::from("/data/audit/2026-01-28/events.jsonl")
        );
    }
}
