//! Access tokens for authenticated sessions.
//!
//! Once a login or signup has passed every required factor the API hands
//! out an HS256-signed bearer token. The token only restates the sanitized
//! account; it carries no credential material.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::warn;

use crate::config::{MAX_JWT_EXPIRES_IN_SECONDS, bounded_seconds};
use crate::errors::{AuthError, AuthResult};
use crate::types::{SanitizedUser, UserRole};

const ACCESS_TOKEN_TYPE: &str = "access";

/// Token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Issuer name for tokens
    pub issuer: String,
    /// Access token lifetime
    pub expires_in: Duration,
}

impl JwtConfig {
    /// Lifetimes past 30 days are clamped.
    pub fn new(issuer: impl Into<String>, expires_in_seconds: u64) -> Self {
        Self {
            issuer: issuer.into(),
            expires_in: bounded_seconds(expires_in_seconds, MAX_JWT_EXPIRES_IN_SECONDS),
        }
    }
}

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Token type
    pub typ: String,
}

impl AccessTokenClaims {
    fn for_user(user: &SanitizedUser, issuer: &str, now: OffsetDateTime, ttl: Duration) -> Self {
        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            iss: issuer.to_string(),
            typ: ACCESS_TOKEN_TYPE.to_string(),
        }
    }
}

/// Issued access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// Expiration as a Unix timestamp
    pub expires_at: i64,
}

/// Signs and verifies access tokens.
pub struct TokenService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service signing with `secret`.
    pub fn new(config: JwtConfig, secret: &[u8]) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::config("JWT secret must not be empty"));
        }

        Ok(Self {
            config,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Issues an access token for a fully authenticated account.
    pub fn issue(&self, user: &SanitizedUser) -> AuthResult<AccessToken> {
        self.issue_at(user, OffsetDateTime::now_utc())
    }

    fn issue_at(&self, user: &SanitizedUser, now: OffsetDateTime) -> AuthResult<AccessToken> {
        let claims = AccessTokenClaims::for_user(user, &self.config.issuer, now, self.config.expires_in);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(AccessToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Verifies signature, issuer, expiry and token type.
    pub fn verify(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.leeway = 0;

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            warn!("Access token rejected: {e}");
            AuthError::from(e)
        })?;

        if data.claims.typ != ACCESS_TOKEN_TYPE {
            return Err(AuthError::token("unexpected token type"));
        }

        Ok(data.claims)
    }
}
