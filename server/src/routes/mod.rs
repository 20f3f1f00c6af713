//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the auth endpoints and the protected JSON API under a single Axum
//! router. The browser/front-end shell is an external collaborator; it only
//! needs these paths to stay reachable.

pub mod api;
pub mod auth;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/signout", post(auth::signout))
        .route("/auth/validate", get(auth::validate))
        .route("/auth/user", get(auth::current_user))
        .route("/api/dashboard", get(api::dashboard))
        .route("/api/admin/dashboard", get(api::admin_dashboard))
        .route("/api/admin/users", get(api::admin_users))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
