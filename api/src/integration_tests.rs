//! Integration tests for the storefront auth API
//!
//! Drives the full router end-to-end: request validation, the auth core,
//! error mapping and token issuance.

use auth::{AuthConfig, JwtConfig, TokenService};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use crate::context::AppState;
use crate::routes::create_app;

const TEST_KDF_ITERATIONS: u32 = 1_000;

/// Creates state over an empty store with cheap hashing
fn create_test_state() -> AppState {
    let tokens = TokenService::new(JwtConfig::new("storefront-auth-test", 3600), b"integration-test-secret")
        .expect("Failed to create test token service");
    AppState::new(AuthConfig::default().with_kdf_iterations(TEST_KDF_ITERATIONS), tokens)
}

/// Creates seeded state whose challenges are already expired when issued
fn create_expiring_state() -> AppState {
    let tokens = TokenService::new(JwtConfig::new("storefront-auth-test", 3600), b"integration-test-secret")
        .expect("Failed to create test token service");
    let auth_config = AuthConfig::default()
        .with_kdf_iterations(TEST_KDF_ITERATIONS)
        .with_challenge_ttl(time::Duration::seconds(-1));
    let state = AppState::new(auth_config, tokens);
    state.auth.seed_demo_users().expect("Failed to seed demo accounts");
    state
}

/// Creates state with the demo accounts present
fn create_seeded_state() -> AppState {
    let state = create_test_state();
    state.auth.seed_demo_users().expect("Failed to seed demo accounts");
    state
}

/// Sends a request through the router and returns status and JSON body
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    into_parts(app, request).await
}

/// Sends a POST with a raw body and optional content type
async fn send_raw(app: &Router, uri: &str, content_type: Option<&str>, body: &'static str) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body)).expect("Failed to build request");
    into_parts(app, request).await
}

async fn into_parts(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("Router failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::seed::{DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD, DEMO_CUSTOMER_EMAIL, DEMO_CUSTOMER_PASSWORD};
    use auth::{DEMO_AUTHENTICATOR_CODE, DEMO_EMAIL_CODE, DEMO_SMS_CODE};
    use serde_json::json;
    use tracing_test::traced_test;

    /// Test health endpoint - basic functionality
    #[tokio::test]
    #[traced_test]
    async fn test_health_endpoint() {
        let app = create_app(create_seeded_state());

        let (status, body) = send(&app, "GET", "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["users"], 2);
        assert_eq!(body["pendingChallenges"], 0);
    }

    /// Signup without 2FA returns a token straight away
    #[tokio::test]
    #[traced_test]
    async fn test_signup_without_two_factor() {
        let app = create_app(create_test_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            Some(json!({ "name": "Jane Doe", "email": "Jane@Example.com", "password": "password123" })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["requiresTwoFactor"], false);
        assert_eq!(body["user"]["email"], "Jane@Example.com");
        assert_eq!(body["user"]["role"], "customer");
        assert_eq!(body["user"]["twoFactorEnabled"], false);
        assert!(body["token"].is_string());
        assert!(body.get("challengeId").is_none());
        assert!(body["user"].get("credential").is_none());
        assert!(body["user"].get("salt").is_none());
    }

    /// Signup with 2FA returns a challenge and no token
    #[tokio::test]
    #[traced_test]
    async fn test_signup_with_two_factor_then_verify() {
        let app = create_app(create_test_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            Some(json!({
                "name": "Eve",
                "email": "eve@example.com",
                "password": "password123",
                "twoFactorMethod": "email"
            })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["requiresTwoFactor"], true);
        assert!(body.get("token").is_none());
        assert!(body["hint"].as_str().unwrap().contains(DEMO_EMAIL_CODE));
        let challenge_id = body["challengeId"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/verify-2fa",
            Some(json!({ "challengeId": challenge_id, "code": DEMO_EMAIL_CODE })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "eve@example.com");
        assert!(body["token"].is_string());
    }

    /// Validation failures never reach the store
    #[tokio::test]
    #[traced_test]
    async fn test_signup_validation_failures() {
        let state = create_test_state();
        let app = create_app(state.clone());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            Some(json!({ "name": "Shorty", "email": "shorty@example.com", "password": "short" })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["message"], "Password must be at least 8 characters.");
        assert_eq!(state.auth.user_count().unwrap(), 0);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            Some(json!({ "email": "nobody@example.com", "password": "password123" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Name is required.");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/signup",
            Some(json!({ "name": "Fax", "email": "fax@example.com", "password": "password123", "twoFactorMethod": "fax" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.auth.user_count().unwrap(), 0);
    }

    /// Duplicate emails conflict regardless of case
    #[tokio::test]
    #[traced_test]
    async fn test_signup_duplicate_email() {
        let app = create_app(create_seeded_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            Some(json!({ "name": "Impostor", "email": "JOHN@academystudios.com", "password": "password123" })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "EMAIL_ALREADY_REGISTERED");
        assert_eq!(body["message"], "An account with this email already exists.");
    }

    /// Seeded admin logs in through the admin portal and completes 2FA
    #[tokio::test]
    #[traced_test]
    async fn test_admin_login_flow() {
        let app = create_app(create_seeded_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "email": DEMO_ADMIN_EMAIL, "password": DEMO_ADMIN_PASSWORD, "mode": "admin" })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requiresTwoFactor"], true);
        assert_eq!(body["user"]["role"], "admin");
        assert_eq!(body["user"]["twoFactorMethod"], "authenticator");
        assert!(body.get("token").is_none());
        let challenge_id = body["challengeId"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/verify-2fa",
            Some(json!({ "challengeId": challenge_id, "code": DEMO_AUTHENTICATOR_CODE })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/auth/me", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], DEMO_ADMIN_EMAIL);
        assert_eq!(body["user"]["name"], "John Academy");
    }

    /// Customer accounts are refused by the admin portal
    #[tokio::test]
    #[traced_test]
    async fn test_admin_mode_rejects_customer() {
        let state = create_seeded_state();
        let app = create_app(state.clone());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "email": DEMO_CUSTOMER_EMAIL, "password": DEMO_CUSTOMER_PASSWORD, "mode": "admin" })),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "ADMIN_ACCESS_REQUIRED");
        assert_eq!(state.auth.challenge_count().unwrap(), 0);
    }

    /// Unknown email and wrong password report distinct reasons
    #[tokio::test]
    #[traced_test]
    async fn test_login_failures() {
        let app = create_app(create_seeded_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "ghost@example.com", "password": "password123" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No account found for this email.");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "email": DEMO_CUSTOMER_EMAIL, "password": "WrongPass123!" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INCORRECT_PASSWORD");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "email": DEMO_CUSTOMER_EMAIL, "password": "WrongPass123!", "mode": "superuser" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// A challenge survives a wrong code but is consumed by the right one
    #[tokio::test]
    #[traced_test]
    async fn test_two_factor_challenge_is_single_use() {
        let app = create_app(create_seeded_state());

        let (_, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "email": DEMO_CUSTOMER_EMAIL, "password": DEMO_CUSTOMER_PASSWORD })),
            None,
        )
        .await;
        assert_eq!(body["user"]["twoFactorMethod"], "sms");
        let challenge_id = body["challengeId"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/verify-2fa",
            Some(json!({ "challengeId": challenge_id, "code": "000000" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_CODE");

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/verify-2fa",
            Some(json!({ "challengeId": challenge_id, "code": DEMO_SMS_CODE })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/verify-2fa",
            Some(json!({ "challengeId": challenge_id, "code": DEMO_SMS_CODE })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "CHALLENGE_NOT_FOUND");
    }

    /// Expired challenges report expiry once and are then gone
    #[tokio::test]
    #[traced_test]
    async fn test_expired_challenge_through_router() {
        let state = create_expiring_state();
        let app = create_app(state.clone());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({ "email": DEMO_ADMIN_EMAIL, "password": DEMO_ADMIN_PASSWORD })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requiresTwoFactor"], true);
        let challenge_id = body["challengeId"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/verify-2fa",
            Some(json!({ "challengeId": challenge_id, "code": DEMO_AUTHENTICATOR_CODE })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "CHALLENGE_EXPIRED");
        assert_eq!(body["message"], "Verification code has expired. Please sign in again.");
        assert_eq!(state.auth.challenge_count().unwrap(), 0);

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/verify-2fa",
            Some(json!({ "challengeId": challenge_id, "code": DEMO_AUTHENTICATOR_CODE })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "CHALLENGE_NOT_FOUND");
    }

    /// Bodies axum cannot deserialize still get the JSON failure shape
    #[tokio::test]
    #[traced_test]
    async fn test_unreadable_bodies_are_validation_failures() {
        let state = create_test_state();
        let app = create_app(state.clone());

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/signup",
            Some(json!({ "name": 5, "email": "five@example.com", "password": "password123" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert!(body["message"].is_string());
        assert_eq!(state.auth.user_count().unwrap(), 0);

        let (status, body) = send_raw(
            &app,
            "/api/auth/login",
            None,
            r#"{"email":"john@academystudios.com","password":"AdminPass123!"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");

        let (status, body) = send_raw(&app, "/api/auth/verify-2fa", Some("application/json"), "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Request body is not valid JSON.");
    }

    /// Missing challenge id or code is a validation failure
    #[tokio::test]
    #[traced_test]
    async fn test_verify_requires_fields() {
        let app = create_app(create_test_state());

        let (status, body) = send(&app, "POST", "/api/auth/verify-2fa", Some(json!({ "code": "246810" })), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Challenge ID and code are required.");
    }

    /// Passkey availability over both GET and POST
    #[tokio::test]
    #[traced_test]
    async fn test_passkey_options() {
        let app = create_app(create_seeded_state());

        let uri = format!("/api/auth/passkey-options?email={DEMO_CUSTOMER_EMAIL}");
        let (status, body) = send(&app, "GET", &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["passkeyEnabled"], true);

        let (_, body) = send(
            &app,
            "POST",
            "/api/auth/passkey-options",
            Some(json!({ "email": DEMO_ADMIN_EMAIL })),
            None,
        )
        .await;
        assert_eq!(body["passkeyEnabled"], false);

        let (_, unknown) = send(
            &app,
            "POST",
            "/api/auth/passkey-options",
            Some(json!({ "email": "ghost@example.com" })),
            None,
        )
        .await;
        assert_eq!(unknown, body);

        let (status, body) = send(&app, "GET", "/api/auth/passkey-options", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["passkeyEnabled"], false);
        assert!(body["message"].is_string());
    }

    /// The session endpoint requires a valid bearer token
    #[tokio::test]
    #[traced_test]
    async fn test_me_requires_token() {
        let app = create_app(create_test_state());

        let (status, body) = send(&app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "MISSING_TOKEN");

        let (status, body) = send(&app, "GET", "/api/auth/me", None, Some("not-a-jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "TOKEN_ERROR");
    }
}
