// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Key Manager
//!
//! Produces or imports secp256k1 key pairs and wraps private keys in
//! password-encrypted keystores for server-side custody.
//!
//! ## Key Sources
//!
//! - [`generate`] - fresh 12-word BIP-39 mnemonic, derived at `m/44'/60'/0'/0/0`
//! - [`import_from_private_key`] - 32-byte hex key, `0x` prefix optional
//! - [`import_from_mnemonic`] - 12 or 24 word English BIP-39 phrase
//!
//! ## Security
//!
//! - This module performs no I/O
//! - Private keys and mnemonics are zeroized when dropped
//! - Keystores use Argon2id + XChaCha20-Poly1305; the password is never stored

pub mod error;
pub mod keys;
pub mod keystore;

pub use error::WalletError;
pub use keys::{generate, import_from_mnemonic, import_from_private_key, KeyPair, MNEMONIC_WORD_COUNTS};
pub use keystore::{
    decrypt_with_password, encrypt_with_params, encrypt_with_password, EncryptedKeystore,
    KdfParams, KeystoreCrypto, StoredKdfParams, KEYSTORE_VERSION, MIN_PASSWORD_LEN,
};
