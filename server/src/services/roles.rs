//! Role resolution against the role-membership store.
//!
//! TRADE-OFFS
//! ==========
//! Roles are looked up fresh on every check instead of being cached in the
//! token, so a grant or revocation takes effect immediately at the cost of
//! one read per admin request. Store failure always denies.

use std::collections::HashSet;

use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Closed allow-list of role names the system recognizes. Anything else
/// resolves to deny without touching the store.
pub const RECOGNIZED_ROLES: &[&str] = &["admin"];

#[must_use]
pub fn is_recognized_role(role: &str) -> bool {
    RECOGNIZED_ROLES.contains(&role)
}

/// All role labels held by a user.
///
/// # Errors
///
/// Returns the underlying store error; callers decide whether that denies.
pub async fn roles_for(pool: &PgPool, user_id: Uuid) -> Result<HashSet<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT role FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|r| r.get("role")).collect())
}

/// Whether the user holds the given role. Fail-closed: unrecognized role
/// names and store failures both deny, never error upward.
pub async fn has_role(pool: &PgPool, user_id: Uuid, role: &str) -> bool {
    if !is_recognized_role(role) {
        return false;
    }

    match roles_for(pool, user_id).await {
        Ok(roles) => roles.contains(role),
        Err(e) => {
            tracing::warn!(error = %e, %user_id, role, "role lookup failed; denying");
            false
        }
    }
}

#[cfg(test)]
#[path = "roles_test.rs"]
mod tests;
