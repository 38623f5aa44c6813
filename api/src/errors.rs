//! HTTP error handling for the storefront auth API
//!
//! Maps auth core errors onto status codes and a uniform JSON failure body,
//! logging each one at a level that matches its severity.

use auth::AuthError;
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};

/// Error classes for client handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Invalid input data (400)
    BadRequest,
    /// Authentication failed (401)
    Unauthorized,
    /// Insufficient permissions (403)
    Forbidden,
    /// Resource not found (404)
    NotFound,
    /// Conflicts with existing state (409)
    Conflict,
    /// Internal server error (500)
    InternalError,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fallback message when no more specific one is available
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Invalid request.",
            Self::Unauthorized => "Authentication required.",
            Self::Forbidden => "Access denied.",
            Self::NotFound => "Resource not found.",
            Self::Conflict => "Resource already exists.",
            Self::InternalError => "Internal server error.",
        }
    }

    /// Returns whether this error should be logged with full details
    pub fn should_log_details(&self) -> bool {
        matches!(self, Self::InternalError)
    }
}

/// API failure with the information needed to render and log it
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorCode,
    /// Specific machine-readable code, e.g. `INVALID_CODE`
    pub code: &'static str,
    /// Display-safe message
    pub message: String,
    /// Internal details, logged but never sent
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn log(&self, request_id: &str) {
        match self.kind {
            ApiErrorCode::InternalError => {
                error!(
                    error_code = %self.code,
                    details = ?self.details,
                    request_id = %request_id,
                    "Internal error occurred"
                );
            }
            ApiErrorCode::Unauthorized | ApiErrorCode::Forbidden => {
                warn!(error_code = %self.code, request_id = %request_id, "Authorization error");
            }
            _ => {
                info!(error_code = %self.code, request_id = %request_id, "Client error");
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    success: bool,
    code: &'a str,
    message: &'a str,
    request_id: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log(&request_id);

        let body = ErrorBody {
            success: false,
            code: self.code,
            message: &self.message,
            request_id: &request_id,
        };
        (self.kind.http_status(), Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let kind = match &error {
            AuthError::ValidationFailed(_) => ApiErrorCode::BadRequest,
            AuthError::EmailAlreadyRegistered => ApiErrorCode::Conflict,
            AuthError::UserNotFound | AuthError::ChallengeNotFound => ApiErrorCode::NotFound,
            AuthError::IncorrectPassword
            | AuthError::InvalidCode
            | AuthError::ChallengeExpired
            | AuthError::Token(_) => ApiErrorCode::Unauthorized,
            AuthError::AdminAccessRequired => ApiErrorCode::Forbidden,
            AuthError::VerificationFailed
            | AuthError::Store(_)
            | AuthError::Configuration(_)
            | AuthError::InternalError => ApiErrorCode::InternalError,
        };

        let api_error = Self::new(kind, error.error_code(), error.client_message());
        if error.should_log_details() {
            api_error.with_details(error.to_string())
        } else {
            api_error
        }
    }
}

/// Failure for a blocking task that panicked or was cancelled
pub fn task_failed(err: tokio::task::JoinError) -> ApiError {
    let kind = ApiErrorCode::InternalError;
    ApiError::new(kind, kind.as_str(), kind.user_message())
        .with_details(format!("Blocking task failed: {err}"))
}
