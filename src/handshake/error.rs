// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Handshake errors.

use crate::backend::BackendError;

/// Why a challenge/response handshake did not produce a session.
///
/// Every variant is recoverable; the caller may start a new handshake.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The challenge could not be obtained (transport, rate limit, bad address,
    /// or a malformed challenge).
    #[error("Challenge request failed: {0}")]
    ChallengeRequestFailed(#[source] BackendError),

    /// The wallet holder declined or dismissed the signing prompt.
    #[error("Signature request rejected: {0}")]
    UserRejectedSignature(String),

    /// The signer could not produce a signature.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// The backend rejected the signed challenge or the credentials.
    #[error("Verification failed: {0}")]
    VerificationFailed(#[source] BackendError),
}

impl HandshakeError {
    /// Stable code for the UI.
    pub fn error_code(&self) -> &'static str {
        match self {
            HandshakeError::ChallengeRequestFailed(_) => "challenge_request_failed",
            HandshakeError::UserRejectedSignature(_) => "user_rejected_signature",
            HandshakeError::SigningFailed(_) => "signing_failed",
            HandshakeError::VerificationFailed(_) => "verification_failed",
        }
    }

    /// Backend error code behind a challenge or verification failure.
    pub fn backend_code(&self) -> Option<&str> {
        match self {
            HandshakeError::ChallengeRequestFailed(e) | HandshakeError::VerificationFailed(e) => {
                e.code()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_code_is_exposed() {
        let err = HandshakeError::VerificationFailed(BackendError::Rejected {
            status: 401,
            code: "signature_mismatch".to_string(),
            message: "Signature does not match address".to_string(),
        });
        assert_eq!(err.error_code(), "verification_failed");
        assert_eq!(err.backend_code(), Some("signature_mismatch"));

        let err = HandshakeError::UserRejectedSignature("dismissed".to_string());
        assert_eq!(err.backend_code(), None);
    }
}
