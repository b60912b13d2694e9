// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and verification (HS256 JWT).

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};

use super::{AuthError, AuthenticatedUser, SessionClaims};

/// Clock skew tolerance (60 seconds).
pub const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Length of a generated per-process secret.
const GENERATED_SECRET_LEN: usize = 32;

/// Issues and verifies session tokens with one symmetric secret.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issuer with a random secret; sessions do not survive a restart.
    pub fn ephemeral(ttl: Duration) -> Result<Self, AuthError> {
        let mut secret = zeroize::Zeroizing::new([0u8; GENERATED_SECRET_LEN]);
        SystemRandom::new()
            .fill(secret.as_mut_slice())
            .map_err(|_| AuthError::InternalError("system RNG unavailable".to_string()))?;
        Ok(Self::new(secret.as_slice(), ttl))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` signed in with `address`.
    pub fn issue(
        &self,
        user_id: &str,
        address: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionClaims), AuthError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::InternalError(format!("session ttl: {e}")))?;
        let claims = SessionClaims {
            sub: user_id.to_string(),
            address: address.to_string(),
            sid: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InternalError(format!("token encoding: {e}")))?;
        Ok((token, claims))
    }

    /// Verify signature and expiry of `token`.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<SessionClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";
    const ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn issue_then_verify() {
        let issuer = SessionIssuer::new(SECRET, Duration::from_secs(3600));
        let (token, claims) = issuer.issue("user-1", ADDRESS, Utc::now()).unwrap();

        let user = issuer.verify(&token).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.address, ADDRESS);
        assert_eq!(user.session_id, claims.sid);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = SessionIssuer::new(SECRET, Duration::from_secs(60));
        let long_ago = Utc::now() - chrono::Duration::hours(2);
        let (token, _) = issuer.issue("user-1", ADDRESS, long_ago).unwrap();

        assert!(matches!(issuer.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let issuer = SessionIssuer::new(SECRET, Duration::from_secs(60));
        let other = SessionIssuer::new(b"another-secret-another-secret-xx", Duration::from_secs(60));
        let (token, _) = other.issue("user-1", ADDRESS, Utc::now()).unwrap();

        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn garbage_is_malformed() {
        let issuer = SessionIssuer::ephemeral(Duration::from_secs(60)).unwrap();
        assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn sessions_are_unique_per_issue() {
        let issuer = SessionIssuer::new(SECRET, Duration::from_secs(60));
        let now = Utc::now();
        let (_, a) = issuer.issue("user-1", ADDRESS, now).unwrap();
        let (_, b) = issuer.issue("user-1", ADDRESS, now).unwrap();
        assert_ne!(a.sid, b.sid);
    }
}
