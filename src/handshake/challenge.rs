// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in challenge format.
//!
//! ```text
//! {domain} wants you to sign in with your Ethereum account:
//! {checksummed address}
//!
//! Nonce: {nonce}
//! Issued At: {RFC 3339}
//! Expiration Time: {RFC 3339}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};

use crate::backend::BackendError;
use crate::models::ChallengeResponse;

/// A challenge as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub address: String,
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    /// Accept a backend challenge for `address`.
    ///
    /// The message must embed both the nonce and the address; otherwise the
    /// wallet would be asked to sign something not bound to this sign-in.
    pub fn from_response(address: &str, response: ChallengeResponse) -> Result<Self, BackendError> {
        if response.nonce.is_empty() || !response.message.contains(&response.nonce) {
            return Err(BackendError::Decode(
                "challenge message does not embed its nonce".to_string(),
            ));
        }
        let embeds_address = response
            .message
            .lines()
            .any(|line| line.trim().eq_ignore_ascii_case(address.trim()));
        if !embeds_address {
            return Err(BackendError::Decode(
                "challenge message is not bound to the requested address".to_string(),
            ));
        }

        Ok(Self {
            address: address.to_string(),
            nonce: response.nonce,
            message: response.message,
            expires_at: response.expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Render the challenge text signed by the wallet.
pub fn build_message(
    domain: &str,
    address: &str,
    nonce: &str,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> String {
    format!(
        "{domain} wants you to sign in with your Ethereum account:\n\
         {address}\n\
         \n\
         Nonce: {nonce}\n\
         Issued At: {}\n\
         Expiration Time: {}",
        issued_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
