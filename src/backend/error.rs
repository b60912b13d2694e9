// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backend client errors.

/// Failure talking to the platform backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Connection, TLS or timeout failure.
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with a non-success status.
    #[error("Backend rejected request ({status} {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    /// The response body did not match the expected contract.
    #[error("Invalid backend response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Backend error code, if the backend supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Rejected { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// HTTP status of a rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
