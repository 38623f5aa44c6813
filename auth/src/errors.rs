//! Error handling for the storefront authentication core.
//!
//! This module defines the error types returned by the auth core. Every
//! expected failure (bad input, duplicate account, wrong password, rejected
//! verification code) is a variant here rather than a panic, and each variant
//! carries a display-safe client message that never exposes credential
//! material.

use thiserror::Error;

/// Main error type for the authentication core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Input validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// An account with the same email (case-insensitive) already exists
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// No account matches the supplied email
    #[error("User not found")]
    UserNotFound,

    /// Password did not match the stored credential
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Admin-mode login attempted by a non-admin account
    #[error("Admin access required")]
    AdminAccessRequired,

    /// Two-factor challenge does not exist (never issued, consumed or swept)
    #[error("Challenge not found")]
    ChallengeNotFound,

    /// Two-factor challenge expired before it was verified
    #[error("Challenge expired")]
    ChallengeExpired,

    /// Supplied code does not match the expected code for the challenge
    #[error("Invalid verification code")]
    InvalidCode,

    /// Verification succeeded but the owning account could not be resolved
    #[error("Verification failed")]
    VerificationFailed,

    /// Access token operation failed
    #[error("Token error: {0}")]
    Token(String),

    /// Store operation failed
    #[error("Store error")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal server error (should not expose details)
    #[error("Internal server error")]
    InternalError,
}

/// Store-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A lock guarding the store was poisoned by a panicking writer
    #[error("Store lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// Constraint violation (e.g., unique email)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type alias for auth core operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Creates a validation failed error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationFailed(reason.into())
    }

    /// Creates a token error.
    pub fn token(reason: impl Into<String>) -> Self {
        Self::Token(reason.into())
    }

    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Returns true if this error should be logged with details.
    pub fn should_log_details(&self) -> bool {
        matches!(
            self,
            AuthError::Store(_)
                | AuthError::Configuration(_)
                | AuthError::VerificationFailed
                | AuthError::InternalError
        )
    }

    /// Returns the error code for client responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ValidationFailed(_) => "VALIDATION_FAILED",
            AuthError::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::IncorrectPassword => "INCORRECT_PASSWORD",
            AuthError::AdminAccessRequired => "ADMIN_ACCESS_REQUIRED",
            AuthError::ChallengeNotFound => "CHALLENGE_NOT_FOUND",
            AuthError::ChallengeExpired => "CHALLENGE_EXPIRED",
            AuthError::InvalidCode => "INVALID_CODE",
            AuthError::VerificationFailed => "VERIFICATION_FAILED",
            AuthError::Token(_) => "TOKEN_ERROR",
            AuthError::Store(_) => "STORE_ERROR",
            AuthError::Configuration(_) => "CONFIG_ERROR",
            AuthError::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns a safe client message (without sensitive details).
    pub fn client_message(&self) -> String {
        match self {
            AuthError::ValidationFailed(msg) => msg.clone(),
            AuthError::EmailAlreadyRegistered => {
                "An account with this email already exists.".to_string()
            }
            AuthError::UserNotFound => "No account found for this email.".to_string(),
            AuthError::IncorrectPassword => "Incorrect password.".to_string(),
            AuthError::AdminAccessRequired => {
                "This account does not have admin access.".to_string()
            }
            AuthError::ChallengeNotFound => "Verification challenge not found.".to_string(),
            AuthError::ChallengeExpired => {
                "Verification code has expired. Please sign in again.".to_string()
            }
            AuthError::InvalidCode => "Invalid verification code.".to_string(),
            AuthError::VerificationFailed => "Unable to complete verification.".to_string(),
            AuthError::Token(_) => "Invalid or expired session token.".to_string(),
            AuthError::Store(_) => "Service temporarily unavailable.".to_string(),
            AuthError::Configuration(_) => "Service configuration error.".to_string(),
            AuthError::InternalError => "Internal server error.".to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::Token(format!("JWT error: {err}"))
    }
}
