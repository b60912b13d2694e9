// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to file storage.

pub mod accounts;
pub mod keystores;

pub use accounts::{address_key, Account, AccountRepository};
pub use keystores::{KeystoreRepository, StoredKeystore};
