// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! File-backed persistence for the reference backend (accounts, custodied
//! keystores, audit trail) and for the client's persisted session.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   accounts/
//!     {lowercase_address}.json   # user id, checksummed address, password hash
//!   keystores/
//!     {user_id}.json             # encrypted keystore (opaque to the server)
//!   audit/
//!     {date}/events.jsonl        # daily audit logs
//!   session.json                 # client side only
//! ```

pub mod audit;
pub mod file_store;
pub mod paths;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use file_store::{FileStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{address_key, Account, AccountRepository, KeystoreRepository, StoredKeystore};
