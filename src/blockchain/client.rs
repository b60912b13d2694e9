// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only EVM client for balance queries.

use alloy::{
    primitives::U256,
    providers::{DynProvider, Provider, ProviderBuilder},
};

use super::types::*;

/// JSON-RPC client bound to one network.
#[derive(Clone)]
pub struct ChainClient {
    network: NetworkConfig,
    provider: DynProvider,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl ChainClient {
    /// Create a new client for the specified network.
    ///
    /// No request is made until the first query.
    pub fn new(network: NetworkConfig) -> Result<Self, ChainClientError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self { network, provider })
    }

    /// Get the native balance for an address.
    pub async fn get_native_balance(&self, address: &str) -> Result<NativeBalance, ChainClientError> {
        let addr = parse_address(address)?;

        let balance = self
            .provider
            .get_balance(addr)
            .await
            .map_err(|e| ChainClientError::RpcError(e.to_string()))?;

        Ok(NativeBalance {
            address: addr.to_checksum(None),
            symbol: self.network.symbol.clone(),
            balance_raw: balance.to_string(),
            balance_formatted: format_balance(balance, NATIVE_DECIMALS),
            decimals: NATIVE_DECIMALS,
        })
    }

    /// Get the current block number.
    pub async fn get_block_number(&self) -> Result<u64, ChainClientError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainClientError::RpcError(e.to_string()))
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

/// Format a balance with the specified number of decimals.
///
/// At most 6 fractional digits are kept (truncated, not rounded).
pub fn format_balance(balance: U256, decimals: u8) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
    let trimmed = decimal_str.trim_end_matches('0');
    let truncated = &trimmed[..trimmed.len().min(6)];
    let truncated = truncated.trim_end_matches('0');
    if truncated.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{truncated}")
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_balance() {
        let one = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_balance(one, 18), "1");

        let half = U256::from(500_000_000_000_000_000u64);
        assert_eq!(format_balance(half, 18), "0.5");

        // Truncated to 6 decimals
        let complex = U256::from(1_234_567_890_000_000_000u64);
        assert_eq!(format_balance(complex, 18), "1.234567");

        assert_eq!(format_balance(U256::ZERO, 18), "0");

        // Dust below the sixth decimal collapses to the whole part
        let dust = U256::from(2_000_000_000_000_000_001u64);
        assert_eq!(format_balance(dust, 18), "2");

        let one_six_decimal_unit = U256::from(1_000_000u64);
        assert_eq!(format_balance(one_six_decimal_unit, 6), "1");
    }

    #[test]
    fn invalid_rpc_url_is_rejected() {
        let network = NetworkConfig {
            rpc_url: "not a url".to_string(),
            ..NetworkConfig::fuji()
        };
        assert!(matches!(
            ChainClient::new(network),
            Err(ChainClientError::InvalidRpcUrl(_))
        ));
    }

    #[tokio::test]
    async fn invalid_address_fails_before_any_rpc() {
        let client = ChainClient::new(NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            ..NetworkConfig::fuji()
        })
        .unwrap();
        let err = client.get_native_balance("0xnope").await.unwrap_err();
        assert!(matches!(err, ChainClientError::InvalidAddress(_)));
    }
}
