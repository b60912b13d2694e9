// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain integration.
//!
//! This module provides functionality for:
//! - Querying native balances (`GET /v1/balance/{address}`)
//! - Signing and broadcasting native transfers from a custodied key

pub mod client;
pub mod transactions;
pub mod types;

pub use client::{format_balance, ChainClient, ChainClientError};
pub use transactions::{SendResult, TxBuilder};
pub use types::*;
