// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    auth::{challenges::DEFAULT_CAPACITY, AuthError, ChallengeBook, SessionIssuer},
    blockchain::{ChainClient, ChainClientError},
    config::ServerConfig,
    storage::FileStorage,
};

/// Errors building [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Chain(#[from] ChainClientError),

    #[error("Session setup failed: {0}")]
    Sessions(AuthError),
}

/// Shared state of the reference backend.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<FileStorage>,
    pub challenges: Arc<ChallengeBook>,
    pub sessions: Arc<SessionIssuer>,
    pub chain: Arc<ChainClient>,
}

impl AppState {
    /// Build state from configuration and initialized storage.
    pub fn from_config(config: &ServerConfig, storage: FileStorage) -> Result<Self, StateError> {
        let sessions = match &config.session_secret {
            Some(secret) => SessionIssuer::new(secret, config.session_ttl),
            None => {
                tracing::warn!(
                    "SESSION_SECRET not set; using a random per-process secret (sessions end on restart)"
                );
                SessionIssuer::ephemeral(config.session_ttl).map_err(StateError::Sessions)?
            }
        };

        Ok(Self {
            storage: Arc::new(storage),
            challenges: Arc::new(ChallengeBook::new(
                config.sign_in_domain.clone(),
                config.challenge_ttl,
                config.challenge_burst,
                DEFAULT_CAPACITY,
            )),
            sessions: Arc::new(sessions),
            chain: Arc::new(ChainClient::new(config.network.clone())?),
        })
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }
}
