// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Server side of wallet sign-in.
//!
//! ## Auth Flow
//!
//! 1. Client requests a challenge for an address (`POST /v1/auth/challenge`)
//! 2. Wallet signs the challenge text (EIP-191 `personal_sign`)
//! 3. Client submits address, signature, message and password
//! 4. Server:
//!    - checks the message against the outstanding challenge (TTL bound)
//!    - recovers the signer and compares it with the claimed address
//!    - removes the challenge (single use from here on)
//!    - checks the platform password
//!    - issues an HS256 session token (`sub` → `user_id`)
//! 5. Later requests send `Authorization: Bearer <token>`
//!
//! ## Security
//!
//! - Challenges are single use once a valid signature has been presented;
//!   a forged attempt does not discard them
//! - Challenge issuance is rate limited per address
//! - Clock skew tolerance for session tokens is 60 seconds

pub mod challenges;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod sessions;

pub use challenges::{ChallengeBook, ChallengeError, IssuedChallenge};
pub use claims::{AuthenticatedUser, SessionClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use sessions::SessionIssuer;
