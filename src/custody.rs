// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encrypted Keystore Custody
//!
//! The backend holds only ciphertext. Keys are generated and encrypted on
//! this side of the boundary, and a custodied key exists in plaintext only
//! for the duration of one [`KeystoreCustody::with_unlocked_key`] call.
//!
//! Argon2id runs on the blocking pool; with default costs it takes tens of
//! megabytes and a noticeable fraction of a second.

use std::future::Future;
use std::sync::Arc;

use alloy::primitives::{Signature, U256};
use zeroize::Zeroizing;

use crate::{
    backend::{AuthBackend, BackendError},
    blockchain::{ChainClientError, NetworkConfig, SendResult, TxBuilder},
    context::Session,
    models::PersistKeystoreRequest,
    wallet::{
        decrypt_with_password, encrypt_with_params, generate, KdfParams, KeyPair, WalletError,
    },
};

/// Custody failures.
#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    /// The backend has no keystore for this user.
    #[error("No keystore stored for this account")]
    KeystoreNotFound,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Backend(BackendError),

    #[error(transparent)]
    Chain(#[from] ChainClientError),

    /// The session was rejected; sign in again.
    #[error("Session rejected: {0}")]
    Session(String),

    #[error("Key derivation task failed: {0}")]
    Task(String),
}

impl CustodyError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CustodyError::KeystoreNotFound => "keystore_not_found",
            CustodyError::Wallet(e) => e.error_code(),
            CustodyError::Backend(_) => "backend_error",
            CustodyError::Chain(_) => "chain_error",
            CustodyError::Session(_) => "session_rejected",
            CustodyError::Task(_) => "internal_error",
        }
    }
}

impl From<BackendError> for CustodyError {
    fn from(e: BackendError) -> Self {
        match e.status() {
            Some(401) => CustodyError::Session(e.to_string()),
            _ => CustodyError::Backend(e),
        }
    }
}

/// Result of [`KeystoreCustody::create_custodied_wallet`].
///
/// The mnemonic is shown to the user once for backup and never stored.
pub struct CustodiedWallet {
    pub address: String,
    pub mnemonic: Zeroizing<String>,
}

impl std::fmt::Debug for CustodiedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodiedWallet")
            .field("address", &self.address)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}

/// Client-side custody operations against an [`AuthBackend`].
pub struct KeystoreCustody<B> {
    backend: Arc<B>,
    kdf: KdfParams,
    network: Option<NetworkConfig>,
}

impl<B: AuthBackend> KeystoreCustody<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            kdf: KdfParams::default(),
            network: None,
        }
    }

    /// Override the Argon2id costs used for new keystores.
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Network used by [`Self::transfer_native`].
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    /// Generate a wallet, encrypt it under `password` and hand the ciphertext
    /// to the backend.
    pub async fn create_custodied_wallet(
        &self,
        session: &Session,
        password: &str,
    ) -> Result<CustodiedWallet, CustodyError> {
        let key = generate()?;
        let mnemonic = Zeroizing::new(
            key.mnemonic()
                .ok_or_else(|| WalletError::InvalidMnemonic("generated key has no mnemonic".into()))?
                .to_string(),
        );

        let kdf = self.kdf;
        let password = Zeroizing::new(password.to_string());
        let address = key.address_string();
        let keystore = blocking(move || encrypt_with_params(&key, &password, &kdf)).await?;

        self.backend
            .persist_keystore(
                &session.token,
                &PersistKeystoreRequest {
                    address: address.clone(),
                    keystore,
                },
            )
            .await?;

        tracing::info!(address = %address, user_id = %session.user.user_id, "Custodied wallet created");
        Ok(CustodiedWallet { address, mnemonic })
    }

    /// Fetch and decrypt the session user's key, then run `op` with it.
    ///
    /// The key is moved into `op` and zeroized when `op` drops it.
    pub async fn with_unlocked_key<T, F, Fut>(
        &self,
        session: &Session,
        password: &str,
        op: F,
    ) -> Result<T, CustodyError>
    where
        F: FnOnce(KeyPair) -> Fut,
        Fut: Future<Output = Result<T, CustodyError>>,
    {
        let stored = self
            .backend
            .fetch_keystore(&session.token)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CustodyError::KeystoreNotFound
                } else {
                    CustodyError::from(e)
                }
            })?;

        let password = Zeroizing::new(password.to_string());
        let keystore = stored.keystore;
        let key = blocking(move || decrypt_with_password(&keystore, &password)).await?;
        tracing::debug!(address = %key.address_string(), "Custodied key unlocked");
        op(key).await
    }

    /// Sign `message` (EIP-191) with the custodied key.
    pub async fn sign_with_custodied(
        &self,
        session: &Session,
        password: &str,
        message: &str,
    ) -> Result<Signature, CustodyError> {
        self.with_unlocked_key(session, password, |key| async move {
            Ok(key.sign_message(message)?)
        })
        .await
    }

    /// Send `amount_wei` of the native asset from the custodied key to `to`.
    pub async fn transfer_native(
        &self,
        session: &Session,
        password: &str,
        to: &str,
        amount_wei: U256,
    ) -> Result<SendResult, CustodyError> {
        let network = self
            .network
            .clone()
            .ok_or_else(|| ChainClientError::InvalidRpcUrl("no network configured".to_string()))?;

        self.with_unlocked_key(session, password, |key| async move {
            let builder = TxBuilder::new(network, key.signer().clone())?;
            drop(key);
            Ok(builder.send_native(to, amount_wei).await?)
        })
        .await
    }
}

/// Run an Argon2id-bound wallet operation on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, CustodyError>
where
    F: FnOnce() -> Result<T, WalletError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CustodyError::Task(e.to_string()))?
        .map_err(CustodyError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::test_support::spawn_test_server,
        backend::HttpBackend,
        handshake::{AuthMode, Authenticator, WalletSigner},
        wallet::{import_from_mnemonic, keystore::tests::test_params},
    };
    use std::time::Duration;

    async fn signed_in() -> (crate::api::test_support::TestServer, KeystoreCustody<HttpBackend>, Session) {
        let server = spawn_test_server().await;
        let backend =
            Arc::new(HttpBackend::new(server.base_url.parse().unwrap(), Duration::from_secs(10)).unwrap());

        let login_key = generate().unwrap();
        let address = login_key.address_string();
        let grant = Authenticator::new(backend.clone())
            .authenticate(&address, &WalletSigner::from(login_key), "platform-pass", AuthMode::Register)
            .await
            .unwrap();

        let custody = KeystoreCustody::new(backend).with_kdf_params(test_params());
        (server, custody, Session::from(grant))
    }

    #[tokio::test]
    async fn created_wallet_unlocks_with_its_password() {
        let (_server, custody, session) = signed_in().await;

        let wallet = custody
            .create_custodied_wallet(&session, "vault-pass")
            .await
            .unwrap();
        assert_eq!(wallet.mnemonic.split_whitespace().count(), 12);

        // The backup phrase recreates the custodied key
        let restored = import_from_mnemonic(&wallet.mnemonic).unwrap();
        assert_eq!(restored.address_string(), wallet.address);

        let unlocked = custody
            .with_unlocked_key(&session, "vault-pass", |key| async move { Ok(key.address_string()) })
            .await
            .unwrap();
        assert_eq!(unlocked, wallet.address);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_password() {
        let (_server, custody, session) = signed_in().await;
        custody
            .create_custodied_wallet(&session, "vault-pass")
            .await
            .unwrap();

        let err = custody
            .sign_with_custodied(&session, "not-vault-pass", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, CustodyError::Wallet(WalletError::InvalidPassword)));
        assert_eq!(err.error_code(), "invalid_password");
    }

    #[tokio::test]
    async fn missing_keystore_is_reported() {
        let (_server, custody, session) = signed_in().await;
        let err = custody
            .sign_with_custodied(&session, "vault-pass", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, CustodyError::KeystoreNotFound));
    }

    #[tokio::test]
    async fn custodied_signature_recovers_to_wallet_address() {
        let (_server, custody, session) = signed_in().await;
        let wallet = custody
            .create_custodied_wallet(&session, "vault-pass")
            .await
            .unwrap();

        let signature = custody
            .sign_with_custodied(&session, "vault-pass", "pay order 42")
            .await
            .unwrap();
        let recovered = signature.recover_address_from_msg("pay order 42").unwrap();
        assert_eq!(recovered.to_checksum(None), wallet.address);
    }

    #[tokio::test]
    async fn weak_password_never_reaches_backend() {
        let (_server, custody, session) = signed_in().await;
        let err = custody
            .create_custodied_wallet(&session, "abc")
            .await
            .unwrap_err();
        assert!(matches!(err, CustodyError::Wallet(WalletError::WeakPassword { .. })));

        let err = custody
            .sign_with_custodied(&session, "abc", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, CustodyError::KeystoreNotFound));
    }

    #[tokio::test]
    async fn rejected_session_is_distinguished() {
        let (_server, custody, mut session) = signed_in().await;
        session.token = "expired-or-forged".to_string();
        let err = custody
            .create_custodied_wallet(&session, "vault-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, CustodyError::Session(_)));
    }

    #[tokio::test]
    async fn transfer_requires_network() {
        let (_server, custody, session) = signed_in().await;
        let err = custody
            .transfer_native(&session, "vault-pass", "0x70997970C51812dc3A010C7d01b50e0d17dc79C8", U256::from(1u64))
            .await
            .unwrap_err();
        assert!(matches!(err, CustodyError::Chain(ChainClientError::InvalidRpcUrl(_))));
    }
}
