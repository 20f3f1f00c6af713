//! Credential-provider boundary — account creation and password verification.
//!
//! ARCHITECTURE
//! ============
//! The rest of the system never sees raw passwords; they stop here. The
//! `CredentialProvider` trait is the narrow contract the token and route
//! layers depend on, with a Postgres-backed implementation for production
//! and a mock for tests.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

/// The minimal stable pair naming an authenticated principal. Immutable once
/// issued; everything downstream (tokens, roles) keys off `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("invalid login credentials")]
    BadCredentials,
    #[error("user already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// External identity-provider contract: create an account, verify
/// credentials, invalidate a session, enumerate accounts.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, ProviderError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError>;
    async fn sign_out(&self, user_id: Uuid) -> Result<(), ProviderError>;
    async fn list_users(&self) -> Result<Vec<Identity>, ProviderError>;
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

pub(crate) fn validate_password(password: &str) -> Result<(), ProviderError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ProviderError::WeakPassword);
    }
    Ok(())
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a random 16-byte hex salt.
#[must_use]
pub(crate) fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Salted SHA-256 digest of a password, hex-encoded.
#[must_use]
pub(crate) fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// Postgres-backed credential provider over the `users` table.
pub struct PgCredentials {
    pool: PgPool,
}

impl PgCredentials {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialProvider for PgCredentials {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let email = normalize_email(email).ok_or(ProviderError::InvalidEmail)?;
        validate_password(password)?;

        let salt = generate_salt();
        let hash = hash_password(&salt, password);

        let row = sqlx::query(
            r"INSERT INTO users (email, password_salt, password_hash)
              VALUES ($1, $2, $3)
              ON CONFLICT (email) DO NOTHING
              RETURNING id",
        )
        .bind(&email)
        .bind(&salt)
        .bind(&hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(ProviderError::DuplicateEmail);
        };

        Ok(Identity { id: row.get("id"), email })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let email = normalize_email(email).ok_or(ProviderError::BadCredentials)?;

        let row = sqlx::query("SELECT id, password_salt, password_hash FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        // Unknown email and wrong password are indistinguishable to callers.
        let Some(row) = row else {
            return Err(ProviderError::BadCredentials);
        };

        let salt: String = row.get("password_salt");
        let stored: String = row.get("password_hash");
        if hash_password(&salt, password) != stored {
            return Err(ProviderError::BadCredentials);
        }

        Ok(Identity { id: row.get("id"), email })
    }

    async fn sign_out(&self, _user_id: Uuid) -> Result<(), ProviderError> {
        // Tokens are self-contained; the provider keeps no session record to
        // invalidate. Revocation, when enabled, happens at the token layer.
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<Identity>, ProviderError> {
        let rows = sqlx::query("SELECT id, email FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| Identity { id: r.get("id"), email: r.get("email") })
            .collect())
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
