//! Signed bearer-token issuance and verification.
//!
//! ARCHITECTURE
//! ============
//! Tokens are self-contained HS256 JWTs carrying the user's identity and an
//! expiry. Verification is a pure function of (token, secret, clock) with no
//! database round trip, which is what lets every protected request be checked
//! without consulting the credential provider again.
//!
//! TRADE-OFFS
//! ==========
//! Statelessness means sign-out does not invalidate an already-issued token;
//! the optional denylist in `services::revocation` exists for deployments
//! that cannot accept the full-TTL exposure window.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::credentials::Identity;

/// Default token lifetime: 1 day.
pub const DEFAULT_TTL_SECS: u64 = 86_400;

/// Token-layer failure taxonomy. Every protected request resolves to exactly
/// one of these or to a verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("no token provided")]
    Missing,
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Claims payload embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user ID.
    pub sub: String,
    /// User email at issuance time.
    pub email: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: u64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: u64,
    /// Token ID, used by the optional revocation denylist.
    pub jti: Uuid,
}

impl Claims {
    /// Recover the embedded identity. A malformed subject is treated the
    /// same as a forged token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the subject is not a UUID.
    pub fn identity(&self) -> Result<Identity, TokenError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)?;
        Ok(Identity { id, email: self.email.clone() })
    }
}

/// Extract the raw token from an `Authorization: Bearer <token>` header value.
///
/// # Errors
///
/// Returns `TokenError::Missing` when the header is absent, uses a different
/// scheme, or carries an empty token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    let header = header.ok_or(TokenError::Missing)?;
    let token = header.strip_prefix("Bearer ").map(str::trim).unwrap_or_default();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}

/// Issues and verifies signed bearer tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl_secs", &self.ttl_secs).finish()
    }
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Load from `JWT_SECRET` and optional `TOKEN_TTL_SECS`.
    /// Returns `None` if the secret is missing (the server cannot run).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let secret = std::env::var("JWT_SECRET").ok()?;
        let ttl_secs = std::env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TTL_SECS);
        Some(Self::new(&secret, ttl_secs))
    }

    /// Mint a signed token for a verified identity. Stateless: nothing is
    /// persisted server-side, the token itself is the session record.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if signing fails (never expected with a
    /// valid HMAC key).
    pub fn issue(&self, user: &Identity) -> Result<String, TokenError> {
        let now = unix_now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
            jti: Uuid::new_v4(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding).map_err(|_| TokenError::Invalid)
    }

    /// Verify a presented token's signature and expiry, recovering its claims.
    ///
    /// # Errors
    ///
    /// `Expired` when the signature is valid but the expiry has passed;
    /// `Invalid` for tampering, a wrong secret, or a malformed payload.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
