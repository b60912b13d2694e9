// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key pair generation and import.
//!
//! Ethereum addresses are derived by alloy's signer from the secp256k1
//! public key (keccak256 of the uncompressed point, last 20 bytes).
//! Mnemonic wallets use the standard Ethereum path `m/44'/60'/0'/0/0`.

use alloy::{
    primitives::{Address, Signature},
    signers::{
        local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
        SignerSync,
    },
};
use k256::elliptic_curve::rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use super::WalletError;

/// Word counts accepted by [`import_from_mnemonic`].
pub const MNEMONIC_WORD_COUNTS: [usize; 2] = [12, 24];

/// Entropy for a freshly generated 12-word mnemonic (128 bits).
const GENERATED_ENTROPY_LEN: usize = 16;

/// Hex characters in a raw secp256k1 private key.
const PRIVATE_KEY_HEX_LEN: usize = 64;

/// An in-memory key pair.
///
/// Lives only in volatile memory; the signing key and mnemonic are zeroized
/// on drop. Deliberately not `Serialize` and not `Clone`.
pub struct KeyPair {
    signer: PrivateKeySigner,
    mnemonic: Option<Zeroizing<String>>,
}

impl KeyPair {
    pub(crate) fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            mnemonic: None,
        }
    }

    /// Public address derived from the key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-55 checksummed address string.
    pub fn address_string(&self) -> String {
        self.address().to_checksum(None)
    }

    /// The mnemonic this key was derived from, if any.
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_ref().map(|m| m.as_str())
    }

    /// Raw 32-byte private key.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signer.to_bytes().0)
    }

    /// `0x`-prefixed hex private key, for the export screen.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!(
            "0x{}",
            alloy::hex::encode(self.private_key_bytes().as_slice())
        ))
    }

    /// Borrow the underlying alloy signer (transactions, typed data).
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// Sign `message` as an EIP-191 `personal_sign` payload.
    pub fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        self.signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| WalletError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .field("private_key", &"<redacted>")
            .field("has_mnemonic", &self.mnemonic.is_some())
            .finish()
    }
}

/// Generate a new random key pair backed by a 12-word mnemonic.
///
/// # Errors
/// Only [`WalletError::EntropyUnavailable`], which is fatal.
pub fn generate() -> Result<KeyPair, WalletError> {
    let mut entropy = Zeroizing::new([0u8; GENERATED_ENTROPY_LEN]);
    OsRng
        .try_fill_bytes(entropy.as_mut_slice())
        .map_err(|e| WalletError::EntropyUnavailable(e.to_string()))?;

    let mnemonic = bip39::Mnemonic::from_entropy(entropy.as_slice())
        .map_err(|e| WalletError::EntropyUnavailable(e.to_string()))?;
    let phrase = Zeroizing::new(mnemonic.to_string());

    let signer = signer_from_phrase(&phrase)?;
    Ok(KeyPair {
        signer,
        mnemonic: Some(phrase),
    })
}

/// Import a raw private key given as hex, with or without `0x`.
///
/// # Errors
/// [`WalletError::InvalidKeyFormat`] if the input is not 32 bytes of hex or
/// is not a valid secp256k1 scalar.
pub fn import_from_private_key(raw_key: &str) -> Result<KeyPair, WalletError> {
    let trimmed = raw_key.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_part.len() != PRIVATE_KEY_HEX_LEN {
        return Err(WalletError::InvalidKeyFormat(format!(
            "expected {PRIVATE_KEY_HEX_LEN} hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = Zeroizing::new(
        alloy::hex::decode(hex_part).map_err(|e| WalletError::InvalidKeyFormat(e.to_string()))?,
    );

    let signing_key = k256::ecdsa::SigningKey::from_slice(&bytes)
        .map_err(|_| WalletError::InvalidKeyFormat("not a valid secp256k1 scalar".to_string()))?;

    Ok(KeyPair::from_signer(PrivateKeySigner::from_signing_key(
        signing_key,
    )))
}

/// Import a BIP-39 English mnemonic of exactly 12 or 24 words.
///
/// Surrounding whitespace, repeated spaces and letter case are ignored.
///
/// # Errors
/// [`WalletError::InvalidMnemonic`] on a wrong word count, unknown word or
/// checksum failure. The word count is checked first.
pub fn import_from_mnemonic(phrase: &str) -> Result<KeyPair, WalletError> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if !MNEMONIC_WORD_COUNTS.contains(&words.len()) {
        return Err(WalletError::InvalidMnemonic(format!(
            "expected 12 or 24 words, got {}",
            words.len()
        )));
    }

    let normalized = Zeroizing::new(words.join(" ").to_lowercase());
    bip39::Mnemonic::parse_in_normalized(bip39::Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;

    let signer = signer_from_phrase(&normalized)?;
    Ok(KeyPair {
        signer,
        mnemonic: Some(normalized),
    })
}

fn signer_from_phrase(phrase: &str) -> Result<PrivateKeySigner, WalletError> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .build()
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}
