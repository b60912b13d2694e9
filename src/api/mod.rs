// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface of the reference backend.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | POST | `/v1/auth/challenge` | - |
//! | POST | `/v1/auth/login` | signed challenge + password |
//! | POST | `/v1/auth/register` | signed challenge + password |
//! | PUT  | `/v1/keystore` | bearer |
//! | GET  | `/v1/keystore` | bearer |
//! | GET  | `/v1/balance/{address}` | - |
//! | GET  | `/health/live`, `/health/ready` | - |

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        BalanceResponse, ChallengeRequest, ChallengeResponse, PersistKeystoreRequest,
        PersistKeystoreResponse, SessionGrant, StoredKeystoreResponse, UserProfile, VerifyRequest,
    },
    state::AppState,
    wallet::{EncryptedKeystore, KdfParams, KeystoreCrypto, StoredKdfParams},
};

pub mod auth;
pub mod balance;
pub mod health;
pub mod keystore;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/challenge", post(auth::issue_challenge))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route(
            "/keystore",
            get(keystore::fetch_keystore).put(keystore::persist_keystore),
        )
        .route("/balance/{address}", get(balance::get_balance));

    let health_routes = Router::new()
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness));

    Router::new()
        .nest("/v1", v1_routes)
        .nest("/health", health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::issue_challenge,
        auth::login,
        auth::register,
        keystore::persist_keystore,
        keystore::fetch_keystore,
        balance::get_balance,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            ChallengeRequest,
            ChallengeResponse,
            VerifyRequest,
            SessionGrant,
            UserProfile,
            PersistKeystoreRequest,
            PersistKeystoreResponse,
            StoredKeystoreResponse,
            EncryptedKeystore,
            KeystoreCrypto,
            StoredKdfParams,
            KdfParams,
            BalanceResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signed-challenge login and registration"),
        (name = "Keystore", description = "Encrypted keystore custody"),
        (name = "Balance", description = "Native balance queries"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::spawn_test_server;
    use crate::{
        handshake::signature_to_hex,
        models::{ChallengeResponse, SessionGrant, StoredKeystoreResponse},
        wallet::{encrypt_with_params, generate, keystore::tests::test_params, KeyPair},
    };
    use serde_json::{json, Value};

    async fn challenge(client: &reqwest::Client, base: &str, address: &str) -> reqwest::Response {
        client
            .post(format!("{base}/v1/auth/challenge"))
            .json(&json!({ "address": address }))
            .send()
            .await
            .unwrap()
    }

    async fn signed_body(client: &reqwest::Client, base: &str, key: &KeyPair, password: &str) -> Value {
        let address = key.address_string();
        let issued: ChallengeResponse = challenge(client, base, &address).await.json().await.unwrap();
        let signature = key.sign_message(&issued.message).unwrap();
        json!({
            "address": address,
            "signature": signature_to_hex(&signature),
            "message": issued.message,
            "password": password,
        })
    }

    async fn error_code(response: reqwest::Response) -> String {
        let body: Value = response.json().await.unwrap();
        body["error_code"].as_str().unwrap_or_default().to_string()
    }

    async fn register(client: &reqwest::Client, base: &str, key: &KeyPair) -> SessionGrant {
        let body = signed_body(client, base, key, "platform-pass").await;
        client
            .post(format!("{base}/v1/auth/register"))
            .json(&body)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_probes_respond() {
        let server = spawn_test_server().await;
        let live = reqwest::get(format!("{}/health/live", server.base_url)).await.unwrap();
        assert_eq!(live.status(), 200);
        assert!(live.headers().contains_key("x-request-id"));

        let ready: Value = reqwest::get(format!("{}/health/ready", server.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ready["checks"]["storage"], "ok");
    }

    #[tokio::test]
    async fn challenge_rejects_malformed_address() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let response = challenge(&client, &server.base_url, "0x1234").await;
        assert_eq!(response.status(), 400);
        assert_eq!(error_code(response).await, "invalid_address");
    }

    #[tokio::test]
    async fn signed_challenge_cannot_be_replayed() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let key = generate().unwrap();
        let body = signed_body(&client, &server.base_url, &key, "platform-pass").await;

        let first = client
            .post(format!("{}/v1/auth/register", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(first.status(), 200);

        let replay = client
            .post(format!("{}/v1/auth/login", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(replay.status(), 401);
        assert_eq!(error_code(replay).await, "challenge_not_found");
    }

    #[tokio::test]
    async fn forged_attempts_leave_the_real_challenge_usable() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let key = generate().unwrap();
        let attacker = generate().unwrap();
        let body = signed_body(&client, &server.base_url, &key, "platform-pass").await;
        let login = format!("{}/v1/auth/login", server.base_url);

        let garbage = client
            .post(&login)
            .json(&json!({
                "address": key.address_string(),
                "signature": "0x00",
                "message": "x",
                "password": "whatever-pass",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(garbage.status(), 401);

        let message = body["message"].as_str().unwrap();
        let forged_signature = attacker.sign_message(message).unwrap();
        let forged = client
            .post(&login)
            .json(&json!({
                "address": key.address_string(),
                "signature": signature_to_hex(&forged_signature),
                "message": message,
                "password": "whatever-pass",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(forged.status(), 401);
        assert_eq!(error_code(forged).await, "signature_mismatch");

        let malformed = client
            .post(&login)
            .json(&json!({
                "address": key.address_string(),
                "signature": "0x1234",
                "message": message,
                "password": "whatever-pass",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(error_code(malformed).await, "invalid_signature");

        let genuine = client
            .post(format!("{}/v1/auth/register", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(genuine.status(), 200);
    }

    #[tokio::test]
    async fn second_registration_for_same_address_conflicts() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let key = generate().unwrap();
        register(&client, &server.base_url, &key).await;

        let body = signed_body(&client, &server.base_url, &key, "platform-pass").await;
        let response = client
            .post(format!("{}/v1/auth/register", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 409);
        assert_eq!(error_code(response).await, "address_already_bound");
    }

    #[tokio::test]
    async fn short_platform_password_is_rejected() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let key = generate().unwrap();
        let body = signed_body(&client, &server.base_url, &key, "abc").await;

        let response = client
            .post(format!("{}/v1/auth/register", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 422);
        assert_eq!(error_code(response).await, "weak_password");
    }

    #[tokio::test]
    async fn challenge_issuance_is_rate_limited() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let address = generate().unwrap().address_string();

        for _ in 0..crate::config::DEFAULT_CHALLENGE_BURST {
            assert_eq!(challenge(&client, &server.base_url, &address).await.status(), 200);
        }
        let limited = challenge(&client, &server.base_url, &address).await;
        assert_eq!(limited.status(), 429);
        assert_eq!(error_code(limited).await, "rate_limited");
    }

    #[tokio::test]
    async fn keystore_requires_session() {
        let server = spawn_test_server().await;
        let response = reqwest::get(format!("{}/v1/keystore", server.base_url)).await.unwrap();
        assert_eq!(response.status(), 401);

        let response = reqwest::Client::new()
            .get(format!("{}/v1/keystore", server.base_url))
            .bearer_auth("not-a-jwt")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn keystore_persist_and_fetch() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let key = generate().unwrap();
        let grant = register(&client, &server.base_url, &key).await;
        let url = format!("{}/v1/keystore", server.base_url);

        let missing = client.get(&url).bearer_auth(&grant.token).send().await.unwrap();
        assert_eq!(missing.status(), 404);
        assert_eq!(error_code(missing).await, "keystore_not_found");

        let keystore = encrypt_with_params(&key, "vault-pass", &test_params()).unwrap();
        let stored = client
            .put(&url)
            .bearer_auth(&grant.token)
            .json(&json!({ "address": key.address_string(), "keystore": keystore }))
            .send()
            .await
            .unwrap();
        assert_eq!(stored.status(), 200);

        let fetched: StoredKeystoreResponse = client
            .get(&url)
            .bearer_auth(&grant.token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fetched.keystore, keystore);
        assert_eq!(fetched.address, key.address_string());
    }

    #[tokio::test]
    async fn keystore_address_must_match_request() {
        let server = spawn_test_server().await;
        let client = reqwest::Client::new();
        let key = generate().unwrap();
        let grant = register(&client, &server.base_url, &key).await;

        let keystore = encrypt_with_params(&key, "vault-pass", &test_params()).unwrap();
        let other = generate().unwrap().address_string();
        let response = client
            .put(format!("{}/v1/keystore", server.base_url))
            .bearer_auth(&grant.token)
            .json(&json!({ "address": other, "keystore": keystore }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 422);
        assert_eq!(error_code(response).await, "address_mismatch");
    }

    #[tokio::test]
    async fn balance_validates_address_and_reports_unreachable_chain() {
        let server = spawn_test_server().await;

        let bad = reqwest::get(format!("{}/v1/balance/nope", server.base_url)).await.unwrap();
        assert_eq!(bad.status(), 400);
        assert_eq!(error_code(bad).await, "invalid_address");

        let address = generate().unwrap().address_string();
        let down = reqwest::get(format!("{}/v1/balance/{address}", server.base_url))
            .await
            .unwrap();
        assert_eq!(down.status(), 503);
        assert_eq!(error_code(down).await, "chain_unreachable");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let server = spawn_test_server().await;
        let doc: Value = reqwest::get(format!("{}/api-doc/openapi.json", server.base_url))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(doc["paths"]["/v1/auth/challenge"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
