mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let signer = services::token::TokenSigner::from_env().expect("JWT_SECRET required");
    let denylist_enabled = state::env_bool("TOKEN_DENYLIST").unwrap_or(false);

    let pool = db::init_pool(&database_url)
        .await
        .expect("database init failed");

    let provider = Arc::new(services::credentials::PgCredentials::new(pool.clone()));
    let state = state::AppState::new(pool, signer, provider, denylist_enabled);

    // Denylist rows outlive their tokens' expiry; purge them in the background.
    let _purge = denylist_enabled.then(|| services::revocation::spawn_purge_task(state.clone()));

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, denylist_enabled, "keygate listening");
    axum::serve(listener, app).await.expect("server failed");
}
