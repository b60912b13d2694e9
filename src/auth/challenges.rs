// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outstanding sign-in challenges.
//!
//! - at most one challenge per address; a new one replaces the old
//! - a challenge is looked up with [`ChallengeBook::peek`] and removed with
//!   [`ChallengeBook::take`] only once a signature over it has been verified,
//!   so a signature can never be replayed and a caller without the key
//!   cannot discard someone else's challenge
//! - issuance is rate limited per address over a sliding window
//!
//! Both maps are bounded LRUs so an address flood cannot grow memory.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use alloy::primitives::Address;
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use ring::rand::{SecureRandom, SystemRandom};

use crate::handshake::build_message;

/// Default bound on outstanding challenges.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Rate-limit window.
pub const RATE_WINDOW_SECS: i64 = 60;

/// Random bytes per nonce (hex encoded to 32 characters).
const NONCE_LEN: usize = 16;

/// A challenge held by the server until verified or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedChallenge {
    pub address: Address,
    pub nonce: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Why a challenge could not be issued or consumed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("Too many challenges requested; retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    #[error("No outstanding challenge for this address")]
    NotFound,

    #[error("Challenge has expired")]
    Expired,

    #[error("Signed message does not match the issued challenge")]
    MessageMismatch,

    #[error("Random number generator unavailable")]
    Entropy,
}

impl ChallengeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ChallengeError::RateLimited { .. } => "rate_limited",
            ChallengeError::NotFound => "challenge_not_found",
            ChallengeError::Expired => "challenge_expired",
            ChallengeError::MessageMismatch => "challenge_mismatch",
            ChallengeError::Entropy => "internal_error",
        }
    }
}

struct Inner {
    outstanding: LruCache<Address, IssuedChallenge>,
    issues: LruCache<Address, VecDeque<DateTime<Utc>>>,
}

/// In-memory challenge store.
pub struct ChallengeBook {
    inner: Mutex<Inner>,
    rng: SystemRandom,
    domain: String,
    ttl: Duration,
    burst: u32,
}

impl std::fmt::Debug for ChallengeBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeBook")
            .field("domain", &self.domain)
            .field("ttl", &self.ttl)
            .field("burst", &self.burst)
            .finish_non_exhaustive()
    }
}

impl ChallengeBook {
    pub fn new(domain: impl Into<String>, ttl: std::time::Duration, burst: u32, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                outstanding: LruCache::new(capacity),
                issues: LruCache::new(capacity),
            }),
            rng: SystemRandom::new(),
            domain: domain.into(),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::seconds(300)),
            burst: burst.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh challenge for `address`, replacing any outstanding one.
    pub fn issue(&self, address: Address, now: DateTime<Utc>) -> Result<IssuedChallenge, ChallengeError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| ChallengeError::Entropy)?;
        let nonce = alloy::hex::encode(nonce_bytes);

        let mut inner = self.lock();

        let window_start = now - Duration::seconds(RATE_WINDOW_SECS);
        let history = inner.issues.get_or_insert_mut(address, VecDeque::new);
        while history.front().is_some_and(|t| *t <= window_start) {
            history.pop_front();
        }
        if history.len() >= self.burst as usize {
            let oldest = history.front().copied().unwrap_or(now);
            let retry_after_secs = (oldest - window_start).num_seconds().max(1);
            return Err(ChallengeError::RateLimited { retry_after_secs });
        }
        history.push_back(now);

        let expires_at = now + self.ttl;
        let challenge = IssuedChallenge {
            address,
            message: build_message(
                &self.domain,
                &address.to_checksum(None),
                &nonce,
                now,
                expires_at,
            ),
            nonce,
            issued_at: now,
            expires_at,
        };
        inner.outstanding.put(address, challenge.clone());
        Ok(challenge)
    }

    /// Check `message` against the outstanding challenge for `address`
    /// without removing it. Expired challenges are dropped.
    pub fn peek(
        &self,
        address: Address,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedChallenge, ChallengeError> {
        let mut inner = self.lock();
        let challenge = inner
            .outstanding
            .peek(&address)
            .cloned()
            .ok_or(ChallengeError::NotFound)?;

        if now >= challenge.expires_at {
            inner.outstanding.pop(&address);
            return Err(ChallengeError::Expired);
        }
        if challenge.message != message {
            return Err(ChallengeError::MessageMismatch);
        }
        Ok(challenge)
    }

    /// Remove the challenge `nonce` for `address` after its signature verified.
    ///
    /// Fails with [`ChallengeError::NotFound`] if it was already taken or
    /// replaced, so two concurrent submissions cannot both succeed.
    pub fn take(&self, address: Address, nonce: &str) -> Result<IssuedChallenge, ChallengeError> {
        let mut inner = self.lock();
        let current = inner
            .outstanding
            .peek(&address)
            .is_some_and(|challenge| challenge.nonce == nonce);
        if !current {
            return Err(ChallengeError::NotFound);
        }
        inner.outstanding.pop(&address).ok_or(ChallengeError::NotFound)
    }

    /// Number of outstanding challenges.
    pub fn outstanding(&self) -> usize {
        self.lock().outstanding.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
