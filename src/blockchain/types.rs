// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::str::FromStr;

use alloy::primitives::Address;

use super::ChainClientError;

/// Decimals of the native currency on every supported EVM chain.
pub const NATIVE_DECIMALS: u8 = 18;

/// Fuji public RPC endpoint.
pub const FUJI_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Native currency symbol
    pub symbol: String,
}

impl NetworkConfig {
    /// Avalanche Fuji Testnet configuration.
    pub fn fuji() -> Self {
        Self {
            name: "Avalanche Fuji Testnet".to_string(),
            chain_id: 43113,
            rpc_url: FUJI_RPC_URL.to_string(),
            symbol: "AVAX".to_string(),
        }
    }
}

/// Native balance of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBalance {
    /// Checksummed address
    pub address: String,
    pub symbol: String,
    /// Balance in wei
    pub balance_raw: String,
    /// Balance with up to 6 decimals
    pub balance_formatted: String,
    pub decimals: u8,
}

/// Parse a `0x` address, rejecting anything that is not 20 bytes of hex.
pub fn parse_address(raw: &str) -> Result<Address, ChainClientError> {
    Address::from_str(raw.trim()).map_err(|e| ChainClientError::InvalidAddress(e.to_string()))
}
