//! Common data types for the storefront authentication core.
//!
//! This module defines the account record, the sanitized view handed to
//! callers, two-factor challenges and the outcome shapes returned by the
//! signup/login/verification flows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::credential::Credential;
use crate::errors::AuthError;

/// Account role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Storefront shopper
    #[default]
    Customer,
    /// Store administrator
    Admin,
}

/// Channel nominally used to deliver a second-factor code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TwoFactorMethod {
    /// Authenticator app (TOTP style)
    Authenticator,
    /// Text message
    Sms,
    /// Email message
    Email,
}

impl TwoFactorMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TwoFactorMethod::Authenticator => "authenticator",
            TwoFactorMethod::Sms => "sms",
            TwoFactorMethod::Email => "email",
        }
    }
}

impl fmt::Display for TwoFactorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TwoFactorMethod {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authenticator" => Ok(TwoFactorMethod::Authenticator),
            "sms" => Ok(TwoFactorMethod::Sms),
            "email" => Ok(TwoFactorMethod::Email),
            _ => Err(AuthError::validation("Unsupported two-factor method.")),
        }
    }
}

/// Which portal a login is made against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    /// Regular storefront sign-in
    #[default]
    Customer,
    /// Admin dashboard sign-in, restricted to admin accounts
    Admin,
}

impl FromStr for LoginMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(LoginMode::Customer),
            "admin" => Ok(LoginMode::Admin),
            _ => Err(AuthError::validation("Unsupported login mode.")),
        }
    }
}

/// Account record as held by the user store.
///
/// Contains the credential; never serialize this type to a client, use
/// [`User::sanitized`] instead.
#[derive(Debug, Clone)]
pub struct User {
    /// Opaque unique identifier (UUID v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address, unique case-insensitively
    pub email: String,
    /// Account role
    pub role: UserRole,
    /// Salted password hash
    pub credential: Credential,
    /// Whether a second factor is required after the password
    pub two_factor_enabled: bool,
    /// Second-factor channel, when enabled
    pub two_factor_method: Option<TwoFactorMethod>,
    /// Whether the account has a passkey on file
    pub passkey_enabled: bool,
    /// Account creation time
    pub created_at: OffsetDateTime,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub two_factor_method: Option<TwoFactorMethod>,
}

impl NewUser {
    /// Creates customer account input without a second factor.
    pub fn customer(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: UserRole::Customer,
            two_factor_method: None,
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_two_factor(mut self, method: TwoFactorMethod) -> Self {
        self.two_factor_method = Some(method);
        self
    }
}

impl User {
    /// Builds a new account record around an already derived credential.
    pub fn new(
        name: String,
        email: String,
        role: UserRole,
        credential: Credential,
        two_factor_method: Option<TwoFactorMethod>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            role,
            credential,
            two_factor_enabled: two_factor_method.is_some(),
            two_factor_method,
            passkey_enabled: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns the normalized lookup key for the email address.
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Returns the client-safe view of this account.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            two_factor_enabled: self.two_factor_enabled,
            two_factor_method: self.two_factor_method,
            passkey_enabled: self.passkey_enabled,
        }
    }
}

/// Lower-cases and trims an email for case-insensitive comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account view with credential secrets stripped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub two_factor_enabled: bool,
    pub two_factor_method: Option<TwoFactorMethod>,
    pub passkey_enabled: bool,
}

/// A pending second-factor verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorChallenge {
    /// Opaque unguessable identifier (UUID v4)
    pub challenge_id: String,
    /// Owning account
    pub user_id: String,
    /// Channel the code was nominally sent through
    pub method: TwoFactorMethod,
    /// Issue time
    pub created_at: OffsetDateTime,
    /// Absolute expiry; the challenge is dead strictly after this instant
    pub expires_at: OffsetDateTime,
}

impl TwoFactorChallenge {
    /// Creates a challenge that expires `ttl` after `now`.
    pub fn new(
        user_id: String,
        method: TwoFactorMethod,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Self {
        Self {
            challenge_id: Uuid::new_v4().to_string(),
            user_id,
            method,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// Identifier and delivery hint returned when a challenge is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedChallenge {
    pub challenge_id: String,
    pub hint: String,
}

/// Result of a signup or login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub user: SanitizedUser,
    pub requires_two_factor: bool,
    pub challenge_id: Option<String>,
    pub hint: Option<String>,
}

impl AuthOutcome {
    /// Outcome for an account that is fully authenticated.
    pub fn authenticated(user: SanitizedUser) -> Self {
        Self {
            user,
            requires_two_factor: false,
            challenge_id: None,
            hint: None,
        }
    }

    /// Outcome for an account that still has to pass a second factor.
    pub fn pending(user: SanitizedUser, challenge: IssuedChallenge) -> Self {
        Self {
            user,
            requires_two_factor: true,
            challenge_id: Some(challenge.challenge_id),
            hint: Some(challenge.hint),
        }
    }
}

/// Informational passkey capability report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyOptions {
    pub passkey_enabled: bool,
    pub message: String,
}
