// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Challenge issuance and signed-challenge verification endpoints.

use alloy::primitives::{Address, Signature};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, Json};
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};

use crate::{
    audit_log,
    auth::{ChallengeError, IssuedChallenge},
    blockchain::parse_address,
    error::ApiError,
    models::{ChallengeRequest, ChallengeResponse, SessionGrant, UserProfile, VerifyRequest},
    state::AppState,
    storage::{Account, AccountRepository, AuditEvent, AuditEventType, StorageError},
    wallet::MIN_PASSWORD_LEN,
};

/// Salt length for platform password hashes.
const PASSWORD_SALT_LEN: usize = 16;

/// Issue a sign-in challenge for an address.
///
/// Replaces any outstanding challenge for the same address.
#[utoipa::path(
    post,
    path = "/v1/auth/challenge",
    tag = "Auth",
    request_body = ChallengeRequest,
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 400, description = "Invalid address (invalid_address)"),
        (status = 429, description = "Too many challenges (rate_limited)")
    )
)]
pub async fn issue_challenge(
    State(state): State<AppState>,
    Json(request): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let address = parse_claimed_address(&request.address)?;
    let checksummed = address.to_checksum(None);

    let challenge = state
        .challenges
        .issue(address, Utc::now())
        .map_err(|e| {
            if matches!(e, ChallengeError::RateLimited { .. }) {
                audit_log!(
                    state.storage(),
                    AuditEvent::new(AuditEventType::ChallengeRateLimited)
                        .with_address(&checksummed)
                        .failed(e.error_code())
                );
            }
            challenge_error(e)
        })?;

    tracing::debug!(address = %checksummed, expires_at = %challenge.expires_at, "Challenge issued");
    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::ChallengeIssued).with_address(&checksummed)
    );

    Ok(Json(ChallengeResponse {
        nonce: challenge.nonce,
        message: challenge.message,
        expires_at: challenge.expires_at,
    }))
}

/// Verify a signed challenge and sign in to an existing account.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionGrant),
        (status = 400, description = "Invalid address (invalid_address)"),
        (status = 401, description = "Bad signature, challenge or password"),
        (status = 404, description = "No account for this address (account_not_found)")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<SessionGrant>, ApiError> {
    let challenge = verify_signed_challenge(&state, &request)?;
    let address = challenge.address.to_checksum(None);

    let repo = AccountRepository::new(state.storage());
    let account = repo.get_by_address(&address).map_err(|e| match e {
        StorageError::NotFound(_) => {
            audit_failure(&state, &address, "account_not_found");
            ApiError::not_found("account_not_found", "No account is bound to this address")
        }
        other => ApiError::from(other),
    })?;

    if !verify_password(&request.password, &account.password_hash).await? {
        audit_failure(&state, &address, "invalid_password");
        return Err(ApiError::unauthorized("invalid_password", "Invalid password"));
    }

    let now = Utc::now();
    let account = repo.record_login(&address, now)?;
    let grant = grant_session(&state, &account, false)?;

    tracing::info!(address = %address, user_id = %account.user_id, "Login succeeded");
    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::AuthSuccess)
            .with_user(&account.user_id)
            .with_address(&address)
    );

    Ok(Json(grant))
}

/// Verify a signed challenge and create an account bound to the address.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Account created and signed in", body = SessionGrant),
        (status = 400, description = "Invalid address (invalid_address)"),
        (status = 401, description = "Bad signature or challenge"),
        (status = 409, description = "Address already registered (address_already_bound)"),
        (status = 422, description = "Password too short (weak_password)")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<SessionGrant>, ApiError> {
    let challenge = verify_signed_challenge(&state, &request)?;
    let address = challenge.address.to_checksum(None);

    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::unprocessable(
            "weak_password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    let repo = AccountRepository::new(state.storage());
    if repo.exists(&address) {
        audit_failure(&state, &address, "address_already_bound");
        return Err(already_bound());
    }

    let account = Account {
        user_id: uuid::Uuid::new_v4().to_string(),
        address: address.clone(),
        password_hash: hash_password(&request.password).await?,
        created_at: Utc::now(),
        last_login_at: None,
    };
    repo.create(&account).map_err(|e| match e {
        StorageError::AlreadyExists(_) => already_bound(),
        other => ApiError::from(other),
    })?;

    let grant = grant_session(&state, &account, true)?;

    tracing::info!(address = %address, user_id = %account.user_id, "Account registered");
    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::AccountRegistered)
            .with_user(&account.user_id)
            .with_address(&address)
    );

    Ok(Json(grant))
}

/// Check that the signature over the outstanding challenge recovers to the
/// claimed address, then remove the challenge.
///
/// Nothing is removed until recovery succeeds, so a forged request cannot
/// discard another address's challenge.
fn verify_signed_challenge(
    state: &AppState,
    request: &VerifyRequest,
) -> Result<IssuedChallenge, ApiError> {
    let address = parse_claimed_address(&request.address)?;
    let checksummed = address.to_checksum(None);

    let challenge = state
        .challenges
        .peek(address, &request.message, Utc::now())
        .inspect_err(|e| audit_failure(state, &checksummed, e.error_code()))
        .map_err(challenge_error)?;

    let signature = parse_signature(&request.signature).inspect_err(|_| {
        audit_failure(state, &checksummed, "invalid_signature");
    })?;

    let recovered = signature
        .recover_address_from_msg(challenge.message.as_bytes())
        .map_err(|_| {
            audit_failure(state, &checksummed, "invalid_signature");
            ApiError::unauthorized("invalid_signature", "Signature could not be recovered")
        })?;

    if recovered != address {
        tracing::warn!(claimed = %checksummed, recovered = %recovered, "Signature does not match claimed address");
        audit_failure(state, &checksummed, "signature_mismatch");
        return Err(ApiError::unauthorized(
            "signature_mismatch",
            "Signature does not match the claimed address",
        ));
    }

    state
        .challenges
        .take(address, &challenge.nonce)
        .inspect_err(|e| audit_failure(state, &checksummed, e.error_code()))
        .map_err(challenge_error)
}

fn parse_claimed_address(raw: &str) -> Result<Address, ApiError> {
    parse_address(raw).map_err(|_| ApiError::bad_request("invalid_address", "Invalid wallet address"))
}

fn parse_signature(raw: &str) -> Result<Signature, ApiError> {
    let invalid = || ApiError::unauthorized("invalid_signature", "Malformed signature");
    let bytes = alloy::hex::decode(raw.trim()).map_err(|_| invalid())?;
    Signature::try_from(bytes.as_slice()).map_err(|_| invalid())
}

fn challenge_error(e: ChallengeError) -> ApiError {
    match e {
        ChallengeError::RateLimited { .. } => ApiError::too_many_requests(e.to_string()),
        ChallengeError::Entropy => ApiError::internal(e),
        _ => ApiError::unauthorized(e.error_code(), e.to_string()),
    }
}

fn already_bound() -> ApiError {
    ApiError::conflict(
        "address_already_bound",
        "This address is already bound to an account",
    )
}

fn audit_failure(state: &AppState, address: &str, code: &str) {
    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::AuthFailure)
            .with_address(address)
            .failed(code)
    );
}

fn grant_session(state: &AppState, account: &Account, is_new_user: bool) -> Result<SessionGrant, ApiError> {
    let (token, _claims) = state
        .sessions
        .issue(&account.user_id, &account.address, Utc::now())
        .map_err(ApiError::internal)?;

    Ok(SessionGrant {
        token,
        user: UserProfile::from(account),
        is_new_user,
    })
}

async fn hash_password(password: &str) -> Result<String, ApiError> {
    let mut salt = [0u8; PASSWORD_SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| ApiError::internal("system RNG unavailable"))?;
    let password = zeroize::Zeroizing::new(password.to_string());

    tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(&salt).map_err(ApiError::internal)?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(ApiError::internal)
    })
    .await
    .map_err(ApiError::internal)?
}

async fn verify_password(password: &str, stored: &str) -> Result<bool, ApiError> {
    let password = zeroize::Zeroizing::new(password.to_string());
    let stored = stored.to_string();

    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored).map_err(ApiError::internal)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(ApiError::internal)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).await.unwrap());
        assert!(!verify_password("wrong horse", &hash).await.unwrap());
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        assert_eq!(parse_signature("0x1234").unwrap_err().code, "invalid_signature");
        assert_eq!(parse_signature("zz").unwrap_err().code, "invalid_signature");
    }

    #[test]
    fn invalid_address_maps_to_400() {
        let err = parse_claimed_address("0x123").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_address");
    }
}
