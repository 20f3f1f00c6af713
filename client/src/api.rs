//! HTTP transport to the identity server.
//!
//! ERROR HANDLING
//! ==============
//! Callers get typed errors instead of raw responses: provider rejections
//! (400s) carry the server's reason, auth failures (401s) carry the token
//! error, and transport failures surface as `Network` so the session can
//! fail closed on them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity as the server reports it: an opaque stable id plus email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The server rejected the request (400) with this reason.
    #[error("{0}")]
    Rejected(String),
    /// The presented credential was missing, invalid, or expired.
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Transport contract the session cache depends on. `ApiClient` is the real
/// implementation; tests substitute mocks.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Create an account. The token is absent when the provider withholds a
    /// session (e.g. pending confirmation).
    async fn sign_up(&self, email: &str, password: &str) -> Result<(User, Option<String>), ApiError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<(User, String), ApiError>;
    async fn sign_out(&self, token: &str) -> Result<(), ApiError>;
    /// Validate a persisted token, recovering the identity it embeds.
    async fn validate(&self, token: &str) -> Result<User, ApiError>;
    async fn check_role(&self, token: &str, role: &str) -> Result<bool, ApiError>;
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: User,
    token: Option<String>,
}

/// HTTP client for the server's JSON surface.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, http: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Pull the server's `{"error": ...}` reason out of a failed response.
    async fn error_reason(resp: reqwest::Response) -> String {
        let status = resp.status();
        let body = resp.json::<serde_json::Value>().await.ok();
        body.as_ref()
            .and_then(|v| v.get("error"))
            .and_then(|e| e.as_str())
            .map_or_else(|| status.to_string(), ToOwned::to_owned)
    }
}

#[async_trait]
impl AuthTransport for ApiClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(User, Option<String>), ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/signup"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Rejected(Self::error_reason(resp).await));
        }

        let body: AuthResponse = resp.json().await?;
        Ok((body.user, body.token))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(User, String), ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/signin"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Rejected(Self::error_reason(resp).await));
        }

        let body: AuthResponse = resp.json().await?;
        let token = body
            .token
            .ok_or_else(|| ApiError::Unexpected("signin response missing token".into()))?;
        Ok((body.user, token))
    }

    async fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.url("/auth/signout"))
            .bearer_auth(token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Unauthorized(Self::error_reason(resp).await));
        }
        Ok(())
    }

    async fn validate(&self, token: &str) -> Result<User, ApiError> {
        let resp = self
            .http
            .get(self.url("/auth/validate"))
            .bearer_auth(token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ApiError::Unauthorized(Self::error_reason(resp).await));
        }

        #[derive(Deserialize)]
        struct ValidateResponse {
            valid: bool,
            user: Option<User>,
        }

        let body: ValidateResponse = resp.json().await?;
        match (body.valid, body.user) {
            (true, Some(user)) => Ok(user),
            _ => Err(ApiError::Unexpected("validate response without user".into())),
        }
    }

    async fn check_role(&self, token: &str, role: &str) -> Result<bool, ApiError> {
        // Closed allow-list mirror of the server: only the admin probe
        // endpoint exists, every other role name is deny.
        if role != "admin" {
            return Ok(false);
        }

        let resp = self
            .http
            .get(self.url("/api/admin/dashboard"))
            .bearer_auth(token)
            .send()
            .await?;

        Ok(resp.status().is_success())
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
