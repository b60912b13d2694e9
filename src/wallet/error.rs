// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key manager errors.

/// Errors raised while generating, importing or (de)crypting keys.
///
/// Every variant except [`WalletError::EntropyUnavailable`] is recoverable:
/// the user can correct the input and try again.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Invalid private key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Password must be at least {min_len} characters")]
    WeakPassword { min_len: usize },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Corrupt keystore: {0}")]
    CorruptKeystore(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    /// The operating system could not supply randomness.
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),
}

impl WalletError {
    /// Stable machine-readable code, used when surfacing the error to a UI.
    pub fn error_code(&self) -> &'static str {
        match self {
            WalletError::InvalidKeyFormat(_) => "invalid_key_format",
            WalletError::InvalidMnemonic(_) => "invalid_mnemonic",
            WalletError::WeakPassword { .. } => "weak_password",
            WalletError::InvalidPassword => "invalid_password",
            WalletError::CorruptKeystore(_) => "corrupt_keystore",
            WalletError::Signing(_) => "signing_failed",
            WalletError::EntropyUnavailable(_) => "entropy_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_password_message_names_minimum() {
        let err = WalletError::WeakPassword { min_len: 6 };
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
        assert_eq!(err.error_code(), "weak_password");
    }
}
