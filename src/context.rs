// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client application context.
//!
//! Holds the backend handle, the current session and the services built on
//! them. The session survives restarts through `session.json` in the client
//! data directory; [`ClientContext::hydrate`] restores it and
//! [`ClientContext::logout`] clears both memory and file.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    backend::{AuthBackend, BackendError, HttpBackend},
    blockchain::NetworkConfig,
    config::ClientConfig,
    custody::KeystoreCustody,
    handshake::{AuthMode, Authenticator, HandshakeError, MessageSigner},
    models::{SessionGrant, UserProfile},
    storage::{FileStorage, StorageError},
};

/// An authenticated session: bearer token plus the profile it was issued for.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

impl From<SessionGrant> for Session {
    fn from(grant: SessionGrant) -> Self {
        Self {
            token: grant.token,
            user: grant.user,
        }
    }
}

/// Errors from context operations.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    #[error("Session storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Explicitly passed client state.
pub struct ClientContext<B: AuthBackend = HttpBackend> {
    storage: FileStorage,
    session: Option<Session>,
    authenticator: Authenticator<B>,
    custody: KeystoreCustody<B>,
}

impl ClientContext<HttpBackend> {
    /// Build a context talking to the backend named in `config`.
    pub fn from_config(
        config: &ClientConfig,
        storage: FileStorage,
        network: Option<NetworkConfig>,
    ) -> Result<Self, ContextError> {
        let backend = Arc::new(HttpBackend::from_config(config)?);
        Ok(Self::new(backend, storage, network)?)
    }
}

impl<B: AuthBackend> ClientContext<B> {
    /// Create a context. Initializes the data directory; does not load a session.
    pub fn new(
        backend: Arc<B>,
        mut storage: FileStorage,
        network: Option<NetworkConfig>,
    ) -> Result<Self, StorageError> {
        storage.initialize()?;

        let mut custody = KeystoreCustody::new(backend.clone());
        if let Some(network) = network {
            custody = custody.with_network(network);
        }

        Ok(Self {
            storage,
            session: None,
            authenticator: Authenticator::new(backend),
            custody,
        })
    }

    /// Restore the persisted session, if any.
    ///
    /// An unreadable session file is discarded rather than reported.
    pub fn hydrate(&mut self) -> Result<Option<&Session>, StorageError> {
        let path = self.storage.paths().session_file();
        match self.storage.read_json::<Session>(&path) {
            Ok(session) => {
                tracing::debug!(user_id = %session.user.user_id, "Session restored");
                self.session = Some(session);
            }
            Err(StorageError::NotFound(_)) => self.session = None,
            Err(StorageError::Json(e)) => {
                tracing::warn!(error = %e, "Discarding unreadable session file");
                self.storage.delete(&path)?;
                self.session = None;
            }
            Err(e) => return Err(e),
        }
        Ok(self.session.as_ref())
    }

    /// Adopt a freshly granted session and persist it.
    pub fn establish(&mut self, grant: SessionGrant) -> Result<&Session, StorageError> {
        let session = Session::from(grant);
        self.storage
            .write_json(self.storage.paths().session_file(), &session)?;
        Ok(self.session.insert(session))
    }

    /// Run the handshake and, on success, adopt the resulting session.
    pub async fn sign_in<S: MessageSigner + ?Sized>(
        &mut self,
        address: &str,
        signer: &S,
        password: &str,
        mode: AuthMode,
    ) -> Result<&Session, ContextError> {
        let grant = self
            .authenticator
            .authenticate(address, signer, password, mode)
            .await?;
        Ok(self.establish(grant)?)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Forget the session in memory and on disk.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.session = None;
        match self.storage.delete(self.storage.paths().session_file()) {
            Ok(()) | Err(StorageError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn authenticator(&self) -> &Authenticator<B> {
        &self.authenticator
    }

    pub fn custody(&self) -> &KeystoreCustody<B> {
        &self.custody
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::test_support::spawn_test_server,
        handshake::{HandshakeState, WalletSigner},
        storage::StoragePaths,
        wallet::generate,
    };
    use std::time::Duration;
    use tempfile::TempDir;

    fn context(base_url: &str, dir: &TempDir) -> ClientContext {
        let config = ClientConfig {
            backend_url: base_url.parse().unwrap(),
            timeout: Duration::from_secs(10),
        };
        ClientContext::from_config(&config, FileStorage::new(StoragePaths::new(dir.path())), None)
            .unwrap()
    }

    #[tokio::test]
    async fn sign_in_persists_session_across_restarts() {
        let server = spawn_test_server().await;
        let dir = TempDir::new().unwrap();
        let key = generate().unwrap();
        let address = key.address_string();
        let signer = WalletSigner::from(key);

        let mut ctx = context(&server.base_url, &dir);
        let user_id = ctx
            .sign_in(&address, &signer, "platform-pass", AuthMode::Register)
            .await
            .unwrap()
            .user
            .user_id
            .clone();
        assert_eq!(ctx.authenticator().state(), HandshakeState::Authenticated);

        let mut restarted = context(&server.base_url, &dir);
        assert!(restarted.session().is_none());
        let restored = restarted.hydrate().unwrap().unwrap();
        assert_eq!(restored.user.user_id, user_id);
        assert_eq!(restored.user.address, address);
    }

    #[tokio::test]
    async fn logout_clears_memory_and_file() {
        let server = spawn_test_server().await;
        let dir = TempDir::new().unwrap();
        let key = generate().unwrap();
        let address = key.address_string();
        let signer = WalletSigner::from(key);

        let mut ctx = context(&server.base_url, &dir);
        ctx.sign_in(&address, &signer, "platform-pass", AuthMode::Register)
            .await
            .unwrap();
        ctx.logout().unwrap();
        assert!(ctx.session().is_none());
        assert!(!dir.path().join("session.json").exists());

        // Logging out twice is fine
        ctx.logout().unwrap();
        assert!(ctx.hydrate().unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_session_file_is_discarded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("session.json"), b"{not json").unwrap();

        let mut ctx = context("http://127.0.0.1:1", &dir);
        assert!(ctx.hydrate().unwrap().is_none());
        assert!(!dir.path().join("session.json").exists());
    }

    #[test]
    fn session_debug_redacts_token() {
        let session = Session {
            token: "secret.jwt.token".to_string(),
            user: UserProfile {
                user_id: "u1".to_string(),
                address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
                created_at: chrono::Utc::now(),
            },
        };
        assert!(!format!("{session:?}").contains("secret.jwt.token"));
    }
}
