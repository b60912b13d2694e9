// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON/HTTPS implementation of [`AuthBackend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use super::{AuthBackend, BackendError, OrderStatusSource};
use crate::{
    config::ClientConfig,
    models::{
        BalanceResponse, ChallengeRequest, ChallengeResponse, OrderStatus, OrderStatusResponse,
        PersistKeystoreRequest, PersistKeystoreResponse, SessionGrant, StoredKeystoreResponse,
        VerifyRequest,
    },
};

/// Error body returned by the platform API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    error_code: Option<String>,
}

/// HTTP client for the platform backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client rooted at `base_url`.
    ///
    /// A base URL with a path prefix (e.g. `https://host/api`) is treated as a
    /// directory so endpoint paths are appended to it.
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, BackendError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unreachable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Create a client from [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        Self::new(config.backend_url.clone(), config.timeout)
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Unreachable(format!("Invalid endpoint {path}: {e}")))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| BackendError::Decode(e.to_string()));
        }

        let (code, message) = match response.json::<ErrorBody>().await {
            Ok(body) => (
                body.error_code.unwrap_or_else(|| "unknown".to_string()),
                body.error,
            ),
            Err(_) => (
                "unknown".to_string(),
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected status")
                    .to_string(),
            ),
        };

        tracing::debug!(status = status.as_u16(), code = %code, "Backend rejected request");

        Err(BackendError::Rejected {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn issue_challenge(&self, address: &str) -> Result<ChallengeResponse, BackendError> {
        let body = ChallengeRequest {
            address: address.to_string(),
        };
        let url = self.endpoint("v1/auth/challenge")?;
        self.send(self.client.post(url).json(&body)).await
    }

    async fn verify_login(&self, request: &VerifyRequest) -> Result<SessionGrant, BackendError> {
        let url = self.endpoint("v1/auth/login")?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn verify_register(
        &self,
        request: &VerifyRequest,
    ) -> Result<SessionGrant, BackendError> {
        let url = self.endpoint("v1/auth/register")?;
        self.send(self.client.post(url).json(request)).await
    }

    async fn persist_keystore(
        &self,
        token: &str,
        request: &PersistKeystoreRequest,
    ) -> Result<PersistKeystoreResponse, BackendError> {
        let url = self.endpoint("v1/keystore")?;
        self.send(
            self.client
                .put(url)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .json(request),
        )
        .await
    }

    async fn fetch_keystore(&self, token: &str) -> Result<StoredKeystoreResponse, BackendError> {
        let url = self.endpoint("v1/keystore")?;
        self.send(
            self.client
                .get(url)
                .header(AUTHORIZATION, format!("Bearer {token}")),
        )
        .await
    }

    async fn query_balance(&self, address: &str) -> Result<BalanceResponse, BackendError> {
        let url = self.endpoint(&format!("v1/balance/{address}"))?;
        self.send(self.client.get(url)).await
    }
}

#[async_trait]
impl OrderStatusSource for HttpBackend {
    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, BackendError> {
        let url = self.endpoint(&format!("v1/orders/{order_id}/status"))?;
        let response: OrderStatusResponse = self.send(self.client.get(url)).await?;
        Ok(response.status)
    }
}
