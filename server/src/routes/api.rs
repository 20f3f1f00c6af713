//! Protected resource routes.
//!
//! Admin gating runs after `AuthUser` extraction, so a request without a
//! verified identity is rejected before the role resolver is ever consulted.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use super::auth::AuthUser;
use crate::services::roles;
use crate::state::AppState;

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "error": "admin access required" }))).into_response()
}

/// `GET /api/dashboard` — any authenticated user.
pub async fn dashboard(auth: AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "message": "Dashboard data", "user": auth.user }))
}

/// `GET /api/admin/dashboard` — admin role required.
pub async fn admin_dashboard(State(state): State<AppState>, auth: AuthUser) -> Response {
    if !roles::has_role(&state.pool, auth.user.id, "admin").await {
        return forbidden();
    }

    Json(json!({ "message": "Admin dashboard data", "user": auth.user.email })).into_response()
}

/// `GET /api/admin/users` — admin role required; full account listing from
/// the credential provider.
pub async fn admin_users(State(state): State<AppState>, auth: AuthUser) -> Response {
    if !roles::has_role(&state.pool, auth.user.id, "admin").await {
        return forbidden();
    }

    match state.provider.list_users().await {
        Ok(users) => Json(users).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "user listing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "failed to retrieve users" })))
                .into_response()
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
