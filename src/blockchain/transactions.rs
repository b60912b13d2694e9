// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Native transfer signing and broadcasting.
//!
//! Nonce, gas limit, EIP-1559 fees and chain ID are filled by alloy's
//! recommended fillers; the signer is attached through [`EthereumWallet`].

use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::U256,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};

use super::client::ChainClientError;
use super::types::{parse_address, NetworkConfig};

/// Transaction send result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    /// Transaction hash
    pub tx_hash: String,
    /// Sender address (checksummed)
    pub from: String,
}

/// Signing transaction builder for one network and one key.
pub struct TxBuilder {
    network: NetworkConfig,
    from: String,
    provider: DynProvider,
}

impl TxBuilder {
    /// Create a builder that signs with `signer`.
    ///
    /// The signer is moved into the provider's wallet and dropped with it.
    pub fn new(network: NetworkConfig, signer: PrivateKeySigner) -> Result<Self, ChainClientError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let from = signer.address().to_checksum(None);
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            network,
            from,
            provider,
        })
    }

    /// Send a native transfer of `amount_wei` to `to`.
    pub async fn send_native(&self, to: &str, amount_wei: U256) -> Result<SendResult, ChainClientError> {
        let to_addr = parse_address(to)?;

        let tx = TransactionRequest::default()
            .with_to(to_addr)
            .with_value(amount_wei)
            .with_chain_id(self.network.chain_id);

        let pending = self.provider.send_transaction(tx).await.map_err(|e| {
            ChainClientError::TransactionFailed(format!("Failed to send: {e}"))
        })?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        tracing::info!(from = %self.from, to = %to_addr, tx_hash = %tx_hash, "Native transfer broadcast");

        Ok(SendResult {
            tx_hash,
            from: self.from.clone(),
        })
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}
