//! Authorization gate implementations
//!
//! - `StaticAuthorizationGate` returns a fixed decision, used when no external
//!   authorizer is configured and in tests.
//! - `HttpAuthorizationGate` asks a remote authorization service.
//!
//! Timeouts are not handled here; the orchestrator bounds every call.

use crate::core::traits::AuthorizationGate;
use crate::types::{AuthorizationError, TransferRequest};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Request timeout of the HTTP authorization client
///
/// The orchestrator usually gives up earlier; this bounds the connection when
/// the gate is used on its own.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Gate that always answers the same way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAuthorizationGate {
    authorized: bool,
}

impl StaticAuthorizationGate {
    pub fn new(authorized: bool) -> Self {
        Self { authorized }
    }

    pub fn allow_all() -> Self {
        Self::new(true)
    }

    pub fn deny_all() -> Self {
        Self::new(false)
    }
}

impl Default for StaticAuthorizationGate {
    fn default() -> Self {
        Self::allow_all()
    }
}

#[async_trait]
impl AuthorizationGate for StaticAuthorizationGate {
    async fn is_authorized(&self, _request: &TransferRequest) -> Result<bool, AuthorizationError> {
        Ok(self.authorized)
    }
}

/// Body returned by the authorization service
///
/// ```json
/// {"status": "success", "data": {"authorization": true}}
/// ```
#[derive(Debug, Deserialize)]
struct AuthorizationResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<AuthorizationData>,
}

#[derive(Debug, Deserialize)]
struct AuthorizationData {
    authorization: bool,
}

/// Interpret an authorization service body
///
/// A missing `data` object counts as a decline.
pub fn parse_authorization_body(body: &str) -> Result<bool, AuthorizationError> {
    let response: AuthorizationResponse =
        serde_json::from_str(body).map_err(|e| AuthorizationError::InvalidResponse {
            message: e.to_string(),
        })?;

    debug!(status = ?response.status, "Authorization response");

    Ok(response.data.is_some_and(|data| data.authorization))
}

/// Gate backed by a remote HTTP authorization service
///
/// Issues `GET <url>`. A 2xx or 403 answer carries the decision in its JSON
/// body; any other status means the service is unavailable.
#[derive(Debug, Clone)]
pub struct HttpAuthorizationGate {
    client: reqwest::Client,
    url: String,
}

impl HttpAuthorizationGate {
    /// Create a gate calling `url`
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::Unavailable` if the HTTP client cannot be
    /// built.
    pub fn new(url: impl Into<String>) -> Result<Self, AuthorizationError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self::with_client(client, url))
    }

    /// Create a gate using an existing HTTP client
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AuthorizationGate for HttpAuthorizationGate {
    async fn is_authorized(&self, request: &TransferRequest) -> Result<bool, AuthorizationError> {
        debug!(
            payer = request.payer,
            payee = request.payee,
            value = %request.value,
            url = %self.url,
            "Requesting transfer authorization"
        );

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() && status != StatusCode::FORBIDDEN {
            return Err(AuthorizationError::Unavailable {
                message: format!("authorization service answered {}", status),
            });
        }

        let body = response.text().await?;
        parse_authorization_body(&body)
    }
}
