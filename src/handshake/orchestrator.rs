// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge → sign → verify orchestration.
//!
//! ```text
//! Idle → ChallengeRequested → Signed → Verifying → Authenticated
//!            │                   │          │
//!            └───────────────────┴──────────┴────→ Failed
//! ```
//!
//! Every call starts again from `Idle`. Nothing is retried automatically
//! and nothing from a failed attempt is reused.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::challenge::Challenge;
use super::signer::{signature_to_hex, MessageSigner, SignError};
use super::HandshakeError;
use crate::backend::AuthBackend;
use crate::models::{SessionGrant, VerifyRequest};

/// Which verification endpoint completes the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Observable progress of the current handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    #[default]
    Idle,
    ChallengeRequested,
    Signed,
    Verifying,
    Authenticated,
    Failed,
}

/// Drives handshakes against an [`AuthBackend`].
///
/// Handshakes on one `Authenticator` run one at a time so the published
/// state always describes a single attempt.
pub struct Authenticator<B> {
    backend: Arc<B>,
    state: watch::Sender<HandshakeState>,
    in_flight: Mutex<()>,
}

impl<B: AuthBackend> Authenticator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (state, _) = watch::channel(HandshakeState::Idle);
        Self {
            backend,
            state,
            in_flight: Mutex::new(()),
        }
    }

    /// Watch state transitions (for a progress indicator).
    pub fn subscribe(&self) -> watch::Receiver<HandshakeState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> HandshakeState {
        *self.state.borrow()
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Prove control of `address` and obtain a session.
    ///
    /// `password` is the platform login password. The signer's address is
    /// not compared with `address` here; the backend rejects a mismatch.
    pub async fn authenticate<S>(
        &self,
        address: &str,
        signer: &S,
        password: &str,
        mode: AuthMode,
    ) -> Result<SessionGrant, HandshakeError>
    where
        S: MessageSigner + ?Sized,
    {
        let _guard = self.in_flight.lock().await;
        self.publish(HandshakeState::Idle);

        let result = self.run(address, signer, password, mode).await;
        match &result {
            Ok(grant) => {
                tracing::info!(
                    address = %address,
                    user_id = %grant.user.user_id,
                    is_new_user = grant.is_new_user,
                    ?mode,
                    "Authenticated"
                );
                self.publish(HandshakeState::Authenticated);
            }
            Err(e) => {
                tracing::warn!(address = %address, ?mode, error = %e, "Handshake failed");
                self.publish(HandshakeState::Failed);
            }
        }
        result
    }

    async fn run<S>(
        &self,
        address: &str,
        signer: &S,
        password: &str,
        mode: AuthMode,
    ) -> Result<SessionGrant, HandshakeError>
    where
        S: MessageSigner + ?Sized,
    {
        self.publish(HandshakeState::ChallengeRequested);
        let response = self
            .backend
            .issue_challenge(address)
            .await
            .map_err(HandshakeError::ChallengeRequestFailed)?;
        let challenge = Challenge::from_response(address, response)
            .map_err(HandshakeError::ChallengeRequestFailed)?;
        tracing::debug!(address = %address, expires_at = %challenge.expires_at, "Challenge received");

        let signature = signer
            .sign_message(&challenge.message)
            .await
            .map_err(|e| match e {
                SignError::Rejected(reason) => HandshakeError::UserRejectedSignature(reason),
                SignError::Failed(reason) => HandshakeError::SigningFailed(reason),
            })?;
        self.publish(HandshakeState::Signed);

        let request = VerifyRequest {
            address: address.to_string(),
            signature: signature_to_hex(&signature),
            message: challenge.message,
            password: password.to_string(),
        };

        self.publish(HandshakeState::Verifying);
        let verified = match mode {
            AuthMode::Login => self.backend.verify_login(&request).await,
            AuthMode::Register => self.backend.verify_register(&request).await,
        };
        verified.map_err(HandshakeError::VerificationFailed)
    }

    fn publish(&self, state: HandshakeState) {
        self.state.send_replace(state);
    }
}
