// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Platform Backend Client
//!
//! The challenge issuer, signature verifier, keystore store and balance
//! lookup are remote. [`AuthBackend`] is the seam the handshake and custody
//! code talk through; [`HttpBackend`] implements it over JSON/HTTPS.

use async_trait::async_trait;

use crate::models::{
    BalanceResponse, ChallengeResponse, OrderStatus, PersistKeystoreRequest,
    PersistKeystoreResponse, SessionGrant, StoredKeystoreResponse, VerifyRequest,
};

pub mod error;
pub mod http;

pub use error::BackendError;
pub use http::HttpBackend;

/// Remote operations consumed by the authentication flow.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Ask for a single-use challenge bound to `address`.
    async fn issue_challenge(&self, address: &str) -> Result<ChallengeResponse, BackendError>;

    /// Verify a signed challenge against an existing account.
    async fn verify_login(&self, request: &VerifyRequest) -> Result<SessionGrant, BackendError>;

    /// Verify a signed challenge and create the account.
    async fn verify_register(&self, request: &VerifyRequest)
        -> Result<SessionGrant, BackendError>;

    /// Store an encrypted keystore for the session's user.
    async fn persist_keystore(
        &self,
        token: &str,
        request: &PersistKeystoreRequest,
    ) -> Result<PersistKeystoreResponse, BackendError>;

    /// Fetch the session user's encrypted keystore.
    async fn fetch_keystore(&self, token: &str) -> Result<StoredKeystoreResponse, BackendError>;

    /// Native balance of `address`.
    async fn query_balance(&self, address: &str) -> Result<BalanceResponse, BackendError>;
}

/// Source of order payment status, polled by the checkout dialog.
#[async_trait]
pub trait OrderStatusSource: Send + Sync {
    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, BackendError>;
}
