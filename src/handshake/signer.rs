// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Message-signing capability.
//!
//! The handshake only needs "sign this text". Two sources provide it:
//!
//! - [`LocalSigner`] holds an in-memory [`KeyPair`] (imported key or mnemonic)
//! - [`ExtensionSigner`] forwards the request to an external wallet (browser
//!   extension, hardware bridge) over a channel and waits for the answer
//!
//! [`WalletSigner`] is the closed set the application hands to the
//! orchestrator.

use alloy::primitives::{Address, Signature};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::wallet::KeyPair;

/// Why a signer did not return a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    /// The holder declined or dismissed the prompt.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The signer is unavailable or errored.
    #[error("failed: {0}")]
    Failed(String),
}

/// Produces EIP-191 `personal_sign` signatures.
#[async_trait]
pub trait MessageSigner: Send + Sync {
    async fn sign_message(&self, message: &str) -> Result<Signature, SignError>;
}

/// Signs with a key held in process memory.
#[derive(Debug)]
pub struct LocalSigner {
    key: KeyPair,
}

impl LocalSigner {
    pub fn new(key: KeyPair) -> Self {
        Self { key }
    }

    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }
}

#[async_trait]
impl MessageSigner for LocalSigner {
    async fn sign_message(&self, message: &str) -> Result<Signature, SignError> {
        self.key
            .sign_message(message)
            .map_err(|e| SignError::Failed(e.to_string()))
    }
}

/// A pending signing prompt, delivered to whatever drives the external wallet.
#[derive(Debug)]
pub struct SignRequest {
    message: String,
    respond_to: oneshot::Sender<Result<Signature, SignError>>,
}

impl SignRequest {
    /// Text the holder is asked to sign.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn approve(self, signature: Signature) {
        let _ = self.respond_to.send(Ok(signature));
    }

    pub fn reject(self, reason: impl Into<String>) {
        let _ = self.respond_to.send(Err(SignError::Rejected(reason.into())));
    }

    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.respond_to.send(Err(SignError::Failed(reason.into())));
    }
}

/// Signs by asking an external wallet.
///
/// Dropping a [`SignRequest`] without answering counts as a rejection.
#[derive(Debug, Clone)]
pub struct ExtensionSigner {
    requests: mpsc::Sender<SignRequest>,
}

/// Create an extension signer and the receiving end the wallet bridge serves.
pub fn extension_channel(buffer: usize) -> (ExtensionSigner, mpsc::Receiver<SignRequest>) {
    let (requests, rx) = mpsc::channel(buffer.max(1));
    (ExtensionSigner { requests }, rx)
}

#[async_trait]
impl MessageSigner for ExtensionSigner {
    async fn sign_message(&self, message: &str) -> Result<Signature, SignError> {
        let (respond_to, response) = oneshot::channel();
        let request = SignRequest {
            message: message.to_string(),
            respond_to,
        };

        self.requests
            .send(request)
            .await
            .map_err(|_| SignError::Failed("wallet extension unavailable".to_string()))?;

        match response.await {
            Ok(result) => result,
            Err(_) => Err(SignError::Rejected("signing request dismissed".to_string())),
        }
    }
}

/// The signers the application supports.
#[derive(Debug)]
pub enum WalletSigner {
    Local(LocalSigner),
    Extension(ExtensionSigner),
}

impl From<KeyPair> for WalletSigner {
    fn from(key: KeyPair) -> Self {
        WalletSigner::Local(LocalSigner::new(key))
    }
}

impl From<ExtensionSigner> for WalletSigner {
    fn from(signer: ExtensionSigner) -> Self {
        WalletSigner::Extension(signer)
    }
}

#[async_trait]
impl MessageSigner for WalletSigner {
    async fn sign_message(&self, message: &str) -> Result<Signature, SignError> {
        match self {
            WalletSigner::Local(signer) => signer.sign_message(message).await,
            WalletSigner::Extension(signer) => signer.sign_message(message).await,
        }
    }
}

/// `0x`-prefixed hex encoding of a 65-byte signature.
pub fn signature_to_hex(signature: &Signature) -> String {
    format!("0x{}", alloy::hex::encode(signature.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::import_from_private_key;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn local_signer_recovers_to_its_address() {
        let signer = WalletSigner::from(import_from_private_key(KEY).unwrap());
        let signature = signer.sign_message("hello").await.unwrap();
        let recovered = signature.recover_address_from_msg("hello").unwrap();
        assert_eq!(
            recovered.to_checksum(None),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        assert_eq!(signature_to_hex(&signature).len(), 2 + 130);
    }

    #[tokio::test]
    async fn extension_signer_relays_approval() {
        let (signer, mut requests) = extension_channel(1);
        let key = import_from_private_key(KEY).unwrap();

        let bridge = tokio::spawn(async move {
            let request = requests.recv().await.unwrap();
            let signature = key.sign_message(request.message()).unwrap();
            request.approve(signature);
        });

        let signature = signer.sign_message("approve me").await.unwrap();
        bridge.await.unwrap();
        assert!(signature.recover_address_from_msg("approve me").is_ok());
    }

    #[tokio::test]
    async fn extension_signer_reports_rejection() {
        let (signer, mut requests) = extension_channel(1);
        tokio::spawn(async move {
            requests.recv().await.unwrap().reject("user closed popup");
        });

        let err = signer.sign_message("no").await.unwrap_err();
        assert_eq!(err, SignError::Rejected("user closed popup".to_string()));
    }

    #[tokio::test]
    async fn dropped_request_counts_as_rejection() {
        let (signer, mut requests) = extension_channel(1);
        tokio::spawn(async move {
            drop(requests.recv().await);
        });

        let err = signer.sign_message("ignored").await.unwrap_err();
        assert!(matches!(err, SignError::Rejected(_)));
    }

    #[tokio::test]
    async fn missing_extension_is_a_failure() {
        let (signer, requests) = extension_channel(1);
        drop(requests);

        let err = signer.sign_message("anyone?").await.unwrap_err();
        assert!(matches!(err, SignError::Failed(_)));
    }
}
