// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signed-Challenge Handshake
//!
//! Client side of wallet sign-in:
//!
//! 1. ask the backend for a single-use challenge bound to an address
//! 2. have a [`MessageSigner`] sign the challenge text (EIP-191)
//! 3. submit address, signature, message and platform password
//!
//! The backend recovers the signer from the signature and issues a session
//! only if it matches the claimed address.

pub mod challenge;
pub mod error;
pub mod orchestrator;
pub mod signer;

pub use challenge::{build_message, Challenge};
pub use error::HandshakeError;
pub use orchestrator::{AuthMode, Authenticator, HandshakeState};
pub use signer::{
    extension_channel, signature_to_hex, ExtensionSigner, LocalSigner, MessageSigner, SignError,
    SignRequest, WalletSigner,
};
