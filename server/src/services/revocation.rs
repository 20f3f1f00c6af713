//! Optional signed-out-token denylist.
//!
//! ARCHITECTURE
//! ============
//! Stateless tokens stay valid until expiry even after sign-out. Deployments
//! that cannot accept that exposure set `TOKEN_DENYLIST=true`: sign-out then
//! records the token's `jti`, and the auth extractor rejects denylisted
//! tokens. Rows are purged once the token they name would have expired
//! anyway.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use crate::state::AppState;

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Record a signed-out token's ID so it is refused for the rest of its
/// natural lifetime.
///
/// # Errors
///
/// Returns the underlying store error; callers log and continue, since the
/// client has already dropped its copy.
pub async fn revoke(pool: &PgPool, jti: Uuid, exp: u64) -> Result<(), sqlx::Error> {
    let exp = i64::try_from(exp).unwrap_or(i64::MAX);
    sqlx::query(
        r"INSERT INTO revoked_tokens (jti, expires_at)
          VALUES ($1, to_timestamp($2))
          ON CONFLICT (jti) DO NOTHING",
    )
    .bind(jti)
    .bind(exp)
    .execute(pool)
    .await?;
    Ok(())
}

/// Whether a token ID has been revoked.
///
/// # Errors
///
/// Returns the underlying store error. The caller honors the token on
/// lookup failure — revocation is best-effort by policy, while
/// authentication itself stays fail-closed.
pub async fn is_revoked(pool: &PgPool, jti: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
        .bind(jti)
        .fetch_one(pool)
        .await
}

/// Delete denylist rows for tokens that have expired on their own.
///
/// # Errors
///
/// Returns the underlying store error.
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Spawn the hourly denylist purge task.
pub fn spawn_purge_task(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match purge_expired(&state.pool).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(purged = n, "expired revoked tokens removed"),
                Err(e) => tracing::warn!(error = %e, "revoked-token purge failed"),
            }
        }
    })
}
