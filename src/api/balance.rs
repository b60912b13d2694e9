// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain balance query endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    blockchain::{parse_address, ChainClientError},
    error::ApiError,
    models::BalanceResponse,
    state::AppState,
};

/// Get the native balance of an address.
#[utoipa::path(
    get,
    path = "/v1/balance/{address}",
    tag = "Balance",
    params(
        ("address" = String, Path, description = "0x-prefixed wallet address")
    ),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse),
        (status = 400, description = "Invalid address (invalid_address)"),
        (status = 503, description = "Blockchain network unavailable (chain_unreachable)")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    parse_address(&address)
        .map_err(|_| ApiError::bad_request("invalid_address", "Invalid wallet address"))?;

    let balance = state
        .chain
        .get_native_balance(&address)
        .await
        .map_err(|e| match e {
            ChainClientError::InvalidAddress(_) => {
                ApiError::bad_request("invalid_address", "Invalid wallet address")
            }
            other => {
                tracing::warn!(address = %address, error = %other, "Balance query failed");
                ApiError::unavailable("chain_unreachable", "Blockchain network unavailable")
            }
        })?;

    let network = state.chain.network();
    Ok(Json(BalanceResponse {
        address: balance.address,
        symbol: balance.symbol,
        balance_raw: balance.balance_raw,
        balance_formatted: balance.balance_formatted,
        decimals: balance.decimals,
        network: network.name.clone(),
        chain_id: network.chain_id,
    }))
}
