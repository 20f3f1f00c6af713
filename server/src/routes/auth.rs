//! Auth routes — signup, signin, signout, token validation.
//!
//! ERROR HANDLING
//! ==============
//! Provider rejections map to 400 with the provider's reason; token-layer
//! failures map to 401 with the short machine-readable reason from
//! `TokenError`. Store failures never leak detail, only a generic message.

use axum::extract::{FromRef, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::services::credentials::{Identity, ProviderError};
use crate::services::revocation;
use crate::services::token::{self, Claims, TokenError};
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user recovered from the bearer token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: Identity,
    pub claims: Claims,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let (user, claims) = verify_request(&state, &parts.headers).await.map_err(unauthorized)?;
        Ok(Self { user, claims })
    }
}

/// Shared verification path for the extractor and `GET /auth/validate`:
/// parse the bearer header, check signature and expiry, then consult the
/// denylist when the revocation policy is enabled.
pub(crate) async fn verify_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(Identity, Claims), TokenError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let raw = token::bearer_token(header)?;
    let claims = state.signer.verify(raw)?;

    if state.denylist_enabled {
        match revocation::is_revoked(&state.pool, claims.jti).await {
            Ok(true) => return Err(TokenError::Invalid),
            Ok(false) => {}
            // Lookup failure honors the token: revocation is best-effort,
            // the signature check above already gates authentication.
            Err(e) => tracing::warn!(error = %e, "denylist lookup failed; honoring token"),
        }
    }

    let user = claims.identity()?;
    Ok((user, claims))
}

fn unauthorized(err: TokenError) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": err.to_string() }))).into_response()
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

fn internal_error(msg: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg }))).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `POST /auth/signup` — create an account and issue a token.
pub async fn signup(State(state): State<AppState>, Json(body): Json<CredentialsBody>) -> Response {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return bad_request("email and password are required");
    };

    match state.provider.sign_up(&email, &password).await {
        Ok(user) => issue_and_respond(&state, &user),
        Err(ProviderError::Db(e)) => {
            tracing::error!(error = %e, "signup failed");
            internal_error("signup failed")
        }
        Err(e) => bad_request(&e.to_string()),
    }
}

/// `POST /auth/signin` — verify credentials and issue a token.
pub async fn signin(State(state): State<AppState>, Json(body): Json<CredentialsBody>) -> Response {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return bad_request("email and password are required");
    };

    match state.provider.sign_in(&email, &password).await {
        Ok(user) => {
            tracing::debug!(email = %user.email, "token issued");
            issue_and_respond(&state, &user)
        }
        Err(ProviderError::Db(e)) => {
            tracing::error!(error = %e, "signin failed");
            internal_error("signin failed")
        }
        Err(e) => bad_request(&e.to_string()),
    }
}

fn issue_and_respond(state: &AppState, user: &Identity) -> Response {
    match state.signer.issue(user) {
        Ok(token) => Json(json!({ "user": user, "token": token })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "token issuance failed");
            internal_error("token issuance failed")
        }
    }
}

/// `POST /auth/signout` — revoke the presented token when the denylist
/// policy is on, then notify the provider. Provider failure is logged, never
/// surfaced: the client clears its session regardless.
pub async fn signout(State(state): State<AppState>, auth: AuthUser) -> Json<serde_json::Value> {
    if state.denylist_enabled {
        if let Err(e) = revocation::revoke(&state.pool, auth.claims.jti, auth.claims.exp).await {
            tracing::warn!(error = %e, "token revocation failed");
        }
    }

    if let Err(e) = state.provider.sign_out(auth.user.id).await {
        tracing::warn!(user_id = %auth.user.id, error = %e, "provider signout failed");
    }

    Json(json!({ "success": true }))
}

/// `GET /auth/user` — the authenticated identity; the extractor rejects
/// unauthenticated requests with 401.
pub async fn current_user(auth: AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "user": auth.user }))
}

/// `GET /auth/validate` — validate the bearer token and return the embedded
/// identity without a provider round trip.
pub async fn validate(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match verify_request(&state, &headers).await {
        Ok((user, _)) => Json(json!({ "valid": true, "user": user })).into_response(),
        Err(e) => {
            (StatusCode::UNAUTHORIZED, Json(json!({ "valid": false, "error": e.to_string() }))).into_response()
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
