// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Custodied keystore endpoints.
//!
//! The server stores the keystore exactly as received. It checks structure
//! and the address binding but cannot decrypt it.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    audit_log,
    auth::Auth,
    blockchain::parse_address,
    error::ApiError,
    models::{PersistKeystoreRequest, PersistKeystoreResponse, StoredKeystoreResponse},
    state::AppState,
    storage::{AuditEvent, AuditEventType, KeystoreRepository, StorageError, StoredKeystore},
};

/// Store (or replace) the session user's encrypted keystore.
#[utoipa::path(
    put,
    path = "/v1/keystore",
    tag = "Keystore",
    request_body = PersistKeystoreRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Keystore stored", body = PersistKeystoreResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 422, description = "Address mismatch or malformed keystore")
    )
)]
pub async fn persist_keystore(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<PersistKeystoreRequest>,
) -> Result<Json<PersistKeystoreResponse>, ApiError> {
    request.keystore.validate().map_err(|e| {
        ApiError::unprocessable("invalid_keystore", format!("Malformed keystore: {e}"))
    })?;

    let claimed = parse_address(&request.address)
        .map_err(|_| ApiError::bad_request("invalid_address", "Invalid wallet address"))?;
    let recorded = request.keystore.parsed_address().map_err(|e| {
        ApiError::unprocessable("invalid_keystore", format!("Malformed keystore: {e}"))
    })?;
    if claimed != recorded {
        return Err(ApiError::unprocessable(
            "address_mismatch",
            "Request address does not match the keystore address",
        ));
    }

    let address = recorded.to_checksum(None);
    let record = StoredKeystore {
        user_id: user.user_id.clone(),
        address: address.clone(),
        keystore: request.keystore,
        updated_at: Utc::now(),
    };
    KeystoreRepository::new(state.storage()).put(&record)?;

    tracing::info!(user_id = %user.user_id, address = %address, "Keystore persisted");
    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::KeystorePersisted)
            .with_user(&user.user_id)
            .with_address(&address)
    );

    Ok(Json(PersistKeystoreResponse { success: true }))
}

/// Fetch the session user's encrypted keystore.
#[utoipa::path(
    get,
    path = "/v1/keystore",
    tag = "Keystore",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Keystore", body = StoredKeystoreResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 404, description = "No keystore stored (keystore_not_found)")
    )
)]
pub async fn fetch_keystore(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<StoredKeystoreResponse>, ApiError> {
    let record = KeystoreRepository::new(state.storage())
        .get(&user.user_id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => {
                ApiError::not_found("keystore_not_found", "No keystore stored for this user")
            }
            other => ApiError::from(other),
        })?;

    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::KeystoreFetched)
            .with_user(&user.user_id)
            .with_address(&record.address)
    );

    Ok(Json(StoredKeystoreResponse {
        address: record.address,
        keystore: record.keystore,
        updated_at: record.updated_at,
    }))
}
