// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies shared by the HTTP API (`api`) and the
//! client that consumes it (`backend`). All types derive `Serialize`,
//! `Deserialize`, and `ToSchema` for JSON handling and OpenAPI docs.
//!
//! ## Model Categories
//!
//! - **Challenges**: nonce issuance for a wallet address
//! - **Verification**: signed challenge + platform password → session
//! - **Keystores**: password-encrypted private keys held for a user
//! - **Balances / Orders**: read-only status queries
//!
//! Types carrying passwords or tokens redact them in `Debug` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::wallet::EncryptedKeystore;

// =============================================================================
// Challenges
// =============================================================================

/// Request a sign-in challenge for an address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ChallengeRequest {
    /// `0x`-prefixed wallet address.
    pub address: String,
}

/// A single-use challenge bound to the requesting address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// Random nonce embedded in `message`.
    pub nonce: String,
    /// Exact text the wallet must sign.
    pub message: String,
    /// After this instant the challenge is rejected.
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Verification
// =============================================================================

/// Signed challenge plus platform password.
///
/// Used for both login and registration.
#[derive(Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VerifyRequest {
    /// Claimed wallet address.
    pub address: String,
    /// Hex-encoded 65-byte EIP-191 signature.
    pub signature: String,
    /// The challenge message that was signed.
    pub message: String,
    /// Platform login password (not a keystore password).
    pub password: String,
}

impl std::fmt::Debug for VerifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyRequest")
            .field("address", &self.address)
            .field("signature", &self.signature)
            .field("message", &self.message)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public profile of a platform account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserProfile {
    /// Platform user identifier.
    pub user_id: String,
    /// Checksummed wallet address bound to the account.
    pub address: String,
    /// When the account was registered.
    pub created_at: DateTime<Utc>,
}

/// Session issued after successful verification.
#[derive(Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SessionGrant {
    /// Opaque bearer token for subsequent calls.
    pub token: String,
    /// The authenticated user.
    pub user: UserProfile,
    /// `true` when this verification created the account.
    pub is_new_user: bool,
}

impl std::fmt::Debug for SessionGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGrant")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("is_new_user", &self.is_new_user)
            .finish()
    }
}

// =============================================================================
// Keystores
// =============================================================================

/// Store a password-encrypted keystore for the session's user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PersistKeystoreRequest {
    /// Address of the wrapped key; must match `keystore.address`.
    pub address: String,
    /// The encrypted keystore.
    pub keystore: EncryptedKeystore,
}

/// Acknowledgement for a persisted keystore.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PersistKeystoreResponse {
    pub success: bool,
}

/// The custodied keystore for the session's user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredKeystoreResponse {
    pub address: String,
    pub keystore: EncryptedKeystore,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Balances
// =============================================================================

/// Native token balance of an address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct BalanceResponse {
    /// Queried address.
    pub address: String,
    /// Token symbol (e.g., "AVAX").
    pub symbol: String,
    /// Balance in wei.
    pub balance_raw: String,
    /// Balance formatted with decimals.
    pub balance_formatted: String,
    /// Number of decimals.
    pub decimals: u8,
    /// Network name.
    pub network: String,
    /// Chain ID.
    pub chain_id: u64,
}

// =============================================================================
// Orders
// =============================================================================

/// Payment state of an order as reported by the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Expired,
}

impl OrderStatus {
    /// Whether the order can still change state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

/// Order status response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OrderStatusResponse {
    pub order_id: String,
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_request_debug_redacts_password() {
        let request = VerifyRequest {
            address: "0xabc".to_string(),
            signature: "0x00".to_string(),
            message: "hello".to_string(),
            password: "super-secret".to_string(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn session_grant_debug_redacts_token() {
        let grant = SessionGrant {
            token: "eyJhbGciOi".to_string(),
            user: UserProfile {
                user_id: "u1".to_string(),
                address: "0xabc".to_string(),
                created_at: Utc::now(),
            },
            is_new_user: true,
        };
        assert!(!format!("{grant:?}").contains("eyJhbGciOi"));
    }

    #[test]
    fn order_status_uses_lowercase_json() {
        let json = serde_json::to_string(&OrderStatus::Paid).unwrap();
        assert_eq!(json, "\"paid\"");
        let parsed: OrderStatusResponse =
            serde_json::from_str(r#"{"order_id":"o1","status":"expired"}"#).unwrap();
        assert_eq!(parsed.status, OrderStatus::Expired);
        assert!(parsed.status.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }
}
