//! Request extractors whose rejections render as [`ApiError`] bodies.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use http::request::Parts;
use serde::de::DeserializeOwned;

use crate::errors::{ApiError, ApiErrorCode};

/// JSON body extractor; malformed bodies fail with a 400 validation error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string extractor with the same failure shape as [`ApiJson`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

fn validation_failed(message: &str, details: String) -> ApiError {
    ApiError::new(ApiErrorCode::BadRequest, "VALIDATION_FAILED", message).with_details(details)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::MissingJsonContentType(_) => "Request body must be sent as application/json.",
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON.",
            JsonRejection::JsonDataError(_) => "Request body has missing or mistyped fields.",
            _ => "Request body could not be read.",
        };
        validation_failed(message, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        validation_failed("Query string has missing or mistyped fields.", rejection.body_text())
    }
}
