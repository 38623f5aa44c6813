//! Configuration management for the storefront authentication service.
//!
//! This module loads service settings from environment variables and derives
//! the smaller [`AuthConfig`] consumed by the auth core.

use std::env;
use std::net::SocketAddr;

use time::Duration;

use crate::credential::KDF_DEFAULT_ITERATIONS;
use crate::errors::AuthError;

/// Default challenge lifetime in seconds (5 minutes).
pub const DEFAULT_CHALLENGE_TTL_SECONDS: u64 = 300;
/// Default interval between expired-challenge sweeps in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;
/// Longest accepted challenge lifetime in seconds (1 day).
pub const MAX_CHALLENGE_TTL_SECONDS: i64 = 86_400;
/// Longest accepted access token lifetime in seconds (30 days).
pub const MAX_JWT_EXPIRES_IN_SECONDS: i64 = 2_592_000;

/// Converts a second count to a `Duration`, saturating at `max`.
pub(crate) fn bounded_seconds(value: u64, max: i64) -> Duration {
    Duration::seconds(i64::try_from(value).map_or(max, |v| v.min(max)))
}

fn within_limit(value: u64, max: i64) -> bool {
    i64::try_from(value).is_ok_and(|v| v <= max)
}

/// Settings used by [`crate::AuthService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// How long an issued two-factor challenge stays valid
    pub challenge_ttl: Duration,
    /// PBKDF2 iteration count for password credentials
    pub kdf_iterations: u32,
}

impl AuthConfig {
    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            challenge_ttl: bounded_seconds(DEFAULT_CHALLENGE_TTL_SECONDS, MAX_CHALLENGE_TTL_SECONDS),
            kdf_iterations: KDF_DEFAULT_ITERATIONS,
        }
    }
}

/// Global service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Environment name (dev, staging, prod)
    pub environment: String,
    /// Address the HTTP server binds to
    pub bind_address: SocketAddr,
    /// HMAC secret for access tokens
    pub jwt_secret: String,
    /// Access token issuer
    pub jwt_issuer: String,
    /// Access token lifetime (seconds)
    pub jwt_expires_in: u64,
    /// Two-factor challenge lifetime (seconds)
    pub challenge_ttl_seconds: u64,
    /// Expired-challenge sweep interval (seconds, 0 disables)
    pub challenge_sweep_interval_seconds: u64,
    /// PBKDF2 iteration count
    pub kdf_iterations: u32,
    /// Whether to create the demo accounts at start-up
    pub seed_demo_users: bool,
}

impl ServiceConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup, falling back to
    /// defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let kdf_iterations: u32 = parse(&get("KDF_ITERATIONS", "100000"), "KDF_ITERATIONS")?;
        if kdf_iterations == 0 {
            return Err(AuthError::config("KDF_ITERATIONS must be at least 1"));
        }

        let challenge_ttl_seconds: u64 = parse(
            &get("CHALLENGE_TTL_SECONDS", &DEFAULT_CHALLENGE_TTL_SECONDS.to_string()),
            "CHALLENGE_TTL_SECONDS",
        )?;
        if challenge_ttl_seconds == 0 {
            return Err(AuthError::config("CHALLENGE_TTL_SECONDS must be at least 1"));
        }
        if !within_limit(challenge_ttl_seconds, MAX_CHALLENGE_TTL_SECONDS) {
            return Err(AuthError::config(format!(
                "CHALLENGE_TTL_SECONDS must be at most {MAX_CHALLENGE_TTL_SECONDS}"
            )));
        }

        let jwt_expires_in: u64 = parse(&get("JWT_EXPIRES_IN", "3600"), "JWT_EXPIRES_IN")?;
        if jwt_expires_in == 0 || !within_limit(jwt_expires_in, MAX_JWT_EXPIRES_IN_SECONDS) {
            return Err(AuthError::config(format!(
                "JWT_EXPIRES_IN must be between 1 and {MAX_JWT_EXPIRES_IN_SECONDS}"
            )));
        }

        Ok(Self {
            environment: get("ENVIRONMENT", "dev"),
            bind_address: parse(&get("BIND_ADDRESS", "127.0.0.1:4000"), "BIND_ADDRESS")?,
            jwt_secret: get("JWT_SECRET", "dev-secret-change-me"),
            jwt_issuer: get("JWT_ISSUER", "storefront-auth"),
            jwt_expires_in,
            challenge_ttl_seconds,
            challenge_sweep_interval_seconds: parse(
                &get(
                    "CHALLENGE_SWEEP_INTERVAL_SECONDS",
                    &DEFAULT_SWEEP_INTERVAL_SECONDS.to_string(),
                ),
                "CHALLENGE_SWEEP_INTERVAL_SECONDS",
            )?,
            kdf_iterations,
            seed_demo_users: parse_bool(&get("SEED_DEMO_USERS", "true"), "SEED_DEMO_USERS")?,
        })
    }

    /// Settings for the auth core.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::default()
            .with_challenge_ttl(bounded_seconds(self.challenge_ttl_seconds, MAX_CHALLENGE_TTL_SECONDS))
            .with_kdf_iterations(self.kdf_iterations)
    }

    /// Sweep interval, or `None` when sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<std::time::Duration> {
        (self.challenge_sweep_interval_seconds > 0)
            .then(|| std::time::Duration::from_secs(self.challenge_sweep_interval_seconds))
    }

    pub fn is_production(&self) -> bool {
        self.environment == "prod"
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, AuthError> {
    value
        .trim()
        .parse()
        .map_err(|_| AuthError::config(format!("Invalid {key}")))
}

fn parse_bool(value: &str, key: &str) -> Result<bool, AuthError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AuthError::config(format!("Invalid {key}"))),
    }
}
