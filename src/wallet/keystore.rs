// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password-encrypted keystores.
//!
//! ## Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "address": "0x…",
//!   "crypto": {
//!     "kdf": "argon2id",
//!     "kdfparams": { "m_cost": 65536, "t_cost": 3, "p_cost": 1, "salt": "<base64>" },
//!     "cipher": "xchacha20-poly1305",
//!     "nonce": "<base64, 24 bytes>",
//!     "ciphertext": "<base64, 32 byte key + 16 byte tag>"
//!   }
//! }
//! ```
//!
//! The password is NFKD-normalized before derivation. A failed AEAD tag
//! check means the password is wrong; every other defect is reported as a
//! corrupt keystore.

use alloy::primitives::Address;
use base64ct::{Base64, Encoding};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use k256::elliptic_curve::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::{KeyPair, WalletError};

/// Minimum platform password length for keystore encryption.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Current keystore format version.
pub const KEYSTORE_VERSION: u32 = 1;

const KDF_ARGON2ID: &str = "argon2id";
const CIPHER_XCHACHA20: &str = "xchacha20-poly1305";

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// Upper bounds accepted when reading a keystore (1 GiB of memory).
const MAX_M_COST_KIB: u32 = 1_048_576;
const MAX_T_COST: u32 = 16;
const MAX_P_COST: u32 = 8;

/// Argon2id cost parameters.
///
/// | Parameter | Default | Meaning |
/// |-----------|---------|---------|
/// | `m_cost`  | 65 536  | Memory in KiB (64 MiB) |
/// | `t_cost`  | 3       | Passes |
/// | `p_cost`  | 1       | Lanes |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65_536,
            t_cost: 3,
            p_cost: 1,
        }
    }
}

/// Serialized KDF parameters including the salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredKdfParams {
    #[serde(flatten)]
    pub cost: KdfParams,
    /// Base64 salt.
    pub salt: String,
}

/// Cipher section of the keystore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct KeystoreCrypto {
    pub kdf: String,
    pub kdfparams: StoredKdfParams,
    pub cipher: String,
    /// Base64 XChaCha20 nonce.
    pub nonce: String,
    /// Base64 ciphertext with the Poly1305 tag appended.
    pub ciphertext: String,
}

/// A private key encrypted under a user password.
///
/// Safe to hand to the backend: it contains neither the key nor the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EncryptedKeystore {
    pub version: u32,
    /// Checksummed address of the wrapped key.
    pub address: String,
    pub crypto: KeystoreCrypto,
}

impl EncryptedKeystore {
    /// Parse the recorded address.
    pub fn parsed_address(&self) -> Result<Address, WalletError> {
        self.address
            .parse()
            .map_err(|e| WalletError::CorruptKeystore(format!("bad address: {e}")))
    }

    /// Structural validation without a password.
    ///
    /// The backend runs this before persisting a keystore it cannot decrypt.
    pub fn validate(&self) -> Result<(), WalletError> {
        self.decode_parts().map(|_| ())
    }

    fn decode_parts(&self) -> Result<DecodedParts, WalletError> {
        if self.version != KEYSTORE_VERSION {
            return Err(WalletError::CorruptKeystore(format!(
                "unsupported version {}",
                self.version
            )));
        }
        let address = self.parsed_address()?;

        let crypto = &self.crypto;
        if crypto.kdf != KDF_ARGON2ID {
            return Err(WalletError::CorruptKeystore(format!(
                "unsupported kdf {}",
                crypto.kdf
            )));
        }
        if crypto.cipher != CIPHER_XCHACHA20 {
            return Err(WalletError::CorruptKeystore(format!(
                "unsupported cipher {}",
                crypto.cipher
            )));
        }

        let salt = decode_field("salt", &crypto.kdfparams.salt)?;
        if salt.len() < SALT_LEN {
            return Err(WalletError::CorruptKeystore(format!(
                "salt must be at least {SALT_LEN} bytes"
            )));
        }

        let nonce = decode_field("nonce", &crypto.nonce)?;
        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| WalletError::CorruptKeystore(format!("nonce must be {NONCE_LEN} bytes")))?;

        let ciphertext = decode_field("ciphertext", &crypto.ciphertext)?;
        if ciphertext.len() != KEY_LEN + TAG_LEN {
            return Err(WalletError::CorruptKeystore(format!(
                "ciphertext must be {} bytes",
                KEY_LEN + TAG_LEN
            )));
        }

        let cost = &crypto.kdfparams.cost;
        if cost.m_cost > MAX_M_COST_KIB || cost.t_cost > MAX_T_COST || cost.p_cost > MAX_P_COST {
            return Err(WalletError::CorruptKeystore(format!(
                "kdf parameters exceed limits (m_cost <= {MAX_M_COST_KIB}, t_cost <= {MAX_T_COST}, p_cost <= {MAX_P_COST})"
            )));
        }
        argon2_params(cost)?;

        Ok(DecodedParts {
            address,
            cost: crypto.kdfparams.cost,
            salt,
            nonce,
            ciphertext,
        })
    }
}

struct DecodedParts {
    address: Address,
    cost: KdfParams,
    salt: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

/// Encrypt a key pair's private key with default Argon2id costs.
///
/// # Errors
/// [`WalletError::WeakPassword`] if the password has fewer than
/// [`MIN_PASSWORD_LEN`] characters.
pub fn encrypt_with_password(key: &KeyPair, password: &str) -> Result<EncryptedKeystore, WalletError> {
    encrypt_with_params(key, password, &KdfParams::default())
}

/// Encrypt with explicit KDF costs.
pub fn encrypt_with_params(
    key: &KeyPair,
    password: &str,
    params: &KdfParams,
) -> Result<EncryptedKeystore, WalletError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(WalletError::WeakPassword {
            min_len: MIN_PASSWORD_LEN,
        });
    }

    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .and_then(|_| OsRng.try_fill_bytes(&mut nonce))
        .map_err(|e| WalletError::EntropyUnavailable(e.to_string()))?;

    let derived = derive_key(password, &salt, params)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(derived.as_slice()));
    let plaintext = key.private_key_bytes();
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|e| WalletError::CorruptKeystore(format!("encryption failed: {e}")))?;

    Ok(EncryptedKeystore {
        version: KEYSTORE_VERSION,
        address: key.address_string(),
        crypto: KeystoreCrypto {
            kdf: KDF_ARGON2ID.to_string(),
            kdfparams: StoredKdfParams {
                cost: *params,
                salt: Base64::encode_string(&salt),
            },
            cipher: CIPHER_XCHACHA20.to_string(),
            nonce: Base64::encode_string(&nonce),
            ciphertext: Base64::encode_string(&ciphertext),
        },
    })
}

/// Decrypt a keystore back into a key pair.
///
/// # Errors
/// - [`WalletError::InvalidPassword`] when the authentication tag does not verify
/// - [`WalletError::CorruptKeystore`] for any structural defect, or when the
///   decrypted key does not match the recorded address
pub fn decrypt_with_password(
    keystore: &EncryptedKeystore,
    password: &str,
) -> Result<KeyPair, WalletError> {
    let parts = keystore.decode_parts()?;

    let derived = derive_key(password, &parts.salt, &parts.cost)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(derived.as_slice()));
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(XNonce::from_slice(&parts.nonce), parts.ciphertext.as_slice())
            .map_err(|_| WalletError::InvalidPassword)?,
    );

    let signing_key = k256::ecdsa::SigningKey::from_slice(&plaintext)
        .map_err(|_| WalletError::CorruptKeystore("decrypted key is not a valid scalar".into()))?;
    let pair = KeyPair::from_signer(alloy::signers::local::PrivateKeySigner::from_signing_key(
        signing_key,
    ));

    if pair.address() != parts.address {
        return Err(WalletError::CorruptKeystore(
            "decrypted key does not match keystore address".to_string(),
        ));
    }

    Ok(pair)
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, WalletError> {
    Base64::decode_vec(value)
        .map_err(|e| WalletError::CorruptKeystore(format!("invalid base64 in {name}: {e}")))
}

fn argon2_params(cost: &KdfParams) -> Result<argon2::Params, WalletError> {
    argon2::Params::new(cost.m_cost, cost.t_cost, cost.p_cost, Some(KEY_LEN))
        .map_err(|e| WalletError::CorruptKeystore(format!("invalid kdf parameters: {e}")))
}

fn derive_key(
    password: &str,
    salt: &[u8],
    cost: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, WalletError> {
    let normalized: Zeroizing<String> = Zeroizing::new(password.nfkd().collect());
    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2_params(cost)?,
    );

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(normalized.as_bytes(), salt, output.as_mut_slice())
        .map_err(|e| WalletError::CorruptKeystore(format!("key derivation failed: {e}")))?;
    Ok(output)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::wallet::{generate, import_from_private_key};

    /// Light parameters suitable for fast unit tests.
    pub(crate) fn test_params() -> KdfParams {
        KdfParams {
            m_cost: 256,
            t_cost: 1,
            p_cost: 1,
        }
    }

    fn sample_key() -> KeyPair {
        import_from_private_key("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap()
    }

    #[test]
    fn round_trip_recovers_same_key() {
        let key = sample_key();
        let keystore = encrypt_with_params(&key, "hunter22", &test_params()).unwrap();
        let restored = decrypt_with_password(&keystore, "hunter22").unwrap();
        assert_eq!(
            restored.private_key_bytes().as_slice(),
            key.private_key_bytes().as_slice()
        );
        assert_eq!(keystore.address, key.address_string());
    }

    #[test]
    fn round_trip_with_generated_keys_and_various_passwords() {
        for password in ["123456", "correct horse battery staple", "pässwörd", "密码密码密码"] {
            let key = generate().unwrap();
            let keystore = encrypt_with_params(&key, password, &test_params()).unwrap();
            let restored = decrypt_with_password(&keystore, password).unwrap();
            assert_eq!(restored.address(), key.address());
        }
    }

    #[test]
    fn wrong_password_is_invalid_password() {
        let keystore = encrypt_with_params(&sample_key(), "hunter22", &test_params()).unwrap();
        for wrong in ["hunter23", "Hunter22", "hunter2", ""] {
            assert!(matches!(
                decrypt_with_password(&keystore, wrong),
                Err(WalletError::InvalidPassword)
            ));
        }
    }

    #[test]
    fn short_password_is_weak() {
        let err = encrypt_with_params(&sample_key(), "12345", &test_params()).unwrap_err();
        assert!(matches!(err, WalletError::WeakPassword { min_len: 6 }));
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // Five multi-byte characters are still too short.
        assert!(matches!(
            encrypt_with_params(&sample_key(), "ééééé", &test_params()),
            Err(WalletError::WeakPassword { .. })
        ));
    }

    #[test]
    fn composed_and_decomposed_passwords_unlock_the_same_keystore() {
        let composed = "caf\u{e9}123";
        let decomposed = "cafe\u{301}123";
        let keystore = encrypt_with_params(&sample_key(), composed, &test_params()).unwrap();
        assert!(decrypt_with_password(&keystore, decomposed).is_ok());
    }

    #[test]
    fn fresh_salt_and_nonce_per_encryption() {
        let key = sample_key();
        let a = encrypt_with_params(&key, "hunter22", &test_params()).unwrap();
        let b = encrypt_with_params(&key, "hunter22", &test_params()).unwrap();
        assert_ne!(a.crypto.kdfparams.salt, b.crypto.kdfparams.salt);
        assert_ne!(a.crypto.nonce, b.crypto.nonce);
        assert_ne!(a.crypto.ciphertext, b.crypto.ciphertext);
    }

    #[test]
    fn structural_defects_are_corrupt_keystore() {
        let good = encrypt_with_params(&sample_key(), "hunter22", &test_params()).unwrap();

        let mut bad_version = good.clone();
        bad_version.version = 9;

        let mut bad_kdf = good.clone();
        bad_kdf.crypto.kdf = "scrypt".to_string();

        let mut bad_nonce = good.clone();
        bad_nonce.crypto.nonce = Base64::encode_string(&[0u8; 12]);

        let mut bad_b64 = good.clone();
        bad_b64.crypto.ciphertext = "!!not base64!!".to_string();

        let mut truncated = good.clone();
        truncated.crypto.ciphertext = Base64::encode_string(&[1u8; 20]);

        let mut bad_cost = good.clone();
        bad_cost.crypto.kdfparams.cost.t_cost = 0;

        for keystore in [bad_version, bad_kdf, bad_nonce, bad_b64, truncated, bad_cost] {
            assert!(matches!(
                decrypt_with_password(&keystore, "hunter22"),
                Err(WalletError::CorruptKeystore(_))
            ));
            assert!(keystore.validate().is_err());
        }
        assert!(good.validate().is_ok());
    }

    #[test]
    fn oversized_kdf_costs_are_rejected_before_derivation() {
        let good = encrypt_with_params(&sample_key(), "hunter22", &test_params()).unwrap();

        let mut huge_memory = good.clone();
        huge_memory.crypto.kdfparams.cost.m_cost = u32::MAX;

        let mut many_passes = good.clone();
        many_passes.crypto.kdfparams.cost.t_cost = MAX_T_COST + 1;

        let mut many_lanes = good.clone();
        many_lanes.crypto.kdfparams.cost.p_cost = MAX_P_COST + 1;

        for keystore in [huge_memory, many_passes, many_lanes] {
            assert!(matches!(keystore.validate(), Err(WalletError::CorruptKeystore(_))));
            assert!(matches!(
                decrypt_with_password(&keystore, "hunter22"),
                Err(WalletError::CorruptKeystore(_))
            ));
        }

        let mut at_limit = good;
        at_limit.crypto.kdfparams.cost.m_cost = MAX_M_COST_KIB;
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn swapped_address_is_detected_after_decryption() {
        let mut keystore = encrypt_with_params(&sample_key(), "hunter22", &test_params()).unwrap();
        keystore.address = generate().unwrap().address_string();
        assert!(matches!(
            decrypt_with_password(&keystore, "hunter22"),
            Err(WalletError::CorruptKeystore(_))
        ));
    }

    #[test]
    fn keystore_json_carries_no_plaintext_key() {
        let key = sample_key();
        let keystore = encrypt_with_params(&key, "hunter22", &test_params()).unwrap();
        let json = serde_json::to_string(&keystore).unwrap();
        assert!(!json.contains("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"));
        assert!(json.contains("\"kdf\":\"argon2id\""));
        assert!(json.contains("\"m_cost\":256"));

        let parsed: EncryptedKeystore = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, keystore);
    }
}
