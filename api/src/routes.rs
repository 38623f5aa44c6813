//! REST routes for the storefront auth API
//!
//! Request and response bodies are camelCase JSON. Every success body carries
//! `success: true`; failures are rendered by [`ApiError`].

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use auth::{AuthOutcome, PasskeyOptions, SanitizedUser};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::context::AppState;
use crate::errors::{ApiError, ApiErrorCode, task_failed};
use crate::extract::{ApiJson, ApiQuery};
use crate::validation;

type ApiResult<T> = Result<T, ApiError>;

/// Creates the router with every auth endpoint and the health check
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signup", post(signup_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/verify-2fa", post(verify_two_factor_handler))
        .route(
            "/api/auth/passkey-options",
            get(passkey_options_query_handler).post(passkey_options_handler),
        )
        .route("/api/auth/me", get(me_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub two_factor_method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// `customer` (default) or `admin`
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTwoFactorRequest {
    pub challenge_id: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyOptionsRequest {
    pub email: Option<String>,
}

/// Body for signup and login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub requires_two_factor: bool,
    pub user: SanitizedUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTwoFactorResponse {
    pub success: bool,
    pub user: SanitizedUser,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyOptionsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub options: PasskeyOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    pub user: SanitizedUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub users: usize,
    pub pending_challenges: usize,
}

/// Turns an auth outcome into a response body, issuing a token only when no
/// second factor is outstanding.
fn auth_response(state: &AppState, outcome: AuthOutcome) -> ApiResult<AuthResponse> {
    let (token, expires_at) = if outcome.requires_two_factor {
        (None, None)
    } else {
        let access = state.tokens.issue(&outcome.user)?;
        (Some(access.token), Some(access.expires_at))
    };

    Ok(AuthResponse {
        success: true,
        requires_two_factor: outcome.requires_two_factor,
        user: outcome.user,
        challenge_id: outcome.challenge_id,
        hint: outcome.hint,
        token,
        expires_at,
    })
}

#[instrument(skip_all)]
async fn signup_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_user = validation::validate_signup(&request)?;

    let auth = state.auth.clone();
    let outcome = tokio::task::spawn_blocking(move || auth.signup(new_user))
        .await
        .map_err(task_failed)??;

    info!(user_id = %outcome.user.id, requires_two_factor = outcome.requires_two_factor, "Signup completed");
    Ok((StatusCode::CREATED, Json(auth_response(&state, outcome)?)))
}

#[instrument(skip_all)]
async fn login_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (email, password, mode) = validation::validate_login(&request)?;

    let auth = state.auth.clone();
    let outcome = tokio::task::spawn_blocking(move || auth.login(&email, &password, mode))
        .await
        .map_err(task_failed)??;

    Ok(Json(auth_response(&state, outcome)?))
}

#[instrument(skip_all)]
async fn verify_two_factor_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyTwoFactorRequest>,
) -> ApiResult<Json<VerifyTwoFactorResponse>> {
    let (challenge_id, code) = validation::validate_verify(&request)?;

    let user = state.auth.complete_two_factor(&challenge_id, &code)?;
    let access = state.tokens.issue(&user)?;

    Ok(Json(VerifyTwoFactorResponse {
        success: true,
        user,
        token: access.token,
        expires_at: access.expires_at,
    }))
}

async fn passkey_options_query_handler(
    State(state): State<AppState>,
    ApiQuery(request): ApiQuery<PasskeyOptionsRequest>,
) -> ApiResult<Json<PasskeyOptionsResponse>> {
    passkey_options(&state, request)
}

async fn passkey_options_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PasskeyOptionsRequest>,
) -> ApiResult<Json<PasskeyOptionsResponse>> {
    passkey_options(&state, request)
}

fn passkey_options(state: &AppState, request: PasskeyOptionsRequest) -> ApiResult<Json<PasskeyOptionsResponse>> {
    let options = state.auth.passkey_options(request.email.as_deref())?;
    Ok(Json(PasskeyOptionsResponse {
        success: true,
        options,
    }))
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                ApiErrorCode::Unauthorized,
                "MISSING_TOKEN",
                "Authorization bearer token is required.",
            )
        })
}

async fn me_handler(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<MeResponse>> {
    let claims = state.tokens.verify(bearer_token(&headers)?)?;

    let user = state
        .auth
        .find_user_by_email(&claims.email)?
        .filter(|user| user.id == claims.sub)
        .ok_or(auth::AuthError::UserNotFound)?;

    Ok(Json(MeResponse {
        success: true,
        user: user.sanitized(),
    }))
}

async fn health_handler(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok",
        users: state.auth.user_count()?,
        pending_challenges: state.auth.challenge_count()?,
    }))
}
