// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AIGC Web3 Auth - Wallet Identity & Signed-Challenge Authentication
//!
//! Client-side wallet key management, a challenge/response sign-in
//! handshake and password-encrypted keystore custody, together with the
//! reference backend they talk to.
//!
//! ## Modules
//!
//! Client:
//! - `wallet` - key generation, import, keystore encryption
//! - `handshake` - challenge → sign → verify orchestration
//! - `custody` - server-held encrypted keystores
//! - `backend` - HTTP client for the platform API
//! - `context` - session persistence and logout
//! - `poller` - fixed-interval status polling
//!
//! Server:
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - challenge book and session tokens
//! - `blockchain` - EVM balance queries and transfers
//! - `storage` - file-backed accounts, keystores and audit log

pub mod api;
pub mod auth;
pub mod backend;
pub mod blockchain;
pub mod config;
pub mod context;
pub mod custody;
pub mod error;
pub mod handshake;
pub mod logging;
pub mod models;
pub mod poller;
pub mod state;
pub mod storage;
pub mod wallet;
