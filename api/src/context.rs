//! Shared state for the HTTP handlers
//!
//! Holds the auth core and the token service behind `Arc`s so the router can
//! clone the state into every request.

use std::sync::Arc;

use auth::{AuthConfig, AuthService, JwtConfig, ServiceConfig, TokenService};
use tracing::info;

/// State handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Accounts, credentials and two-factor challenges
    pub auth: Arc<AuthService>,
    /// Access token signing and verification
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Builds the state from service configuration, seeding demo accounts if enabled
    pub fn from_config(config: &ServiceConfig) -> Result<Self, auth::AuthError> {
        info!(environment = %config.environment, "Initializing application state");

        let auth = Arc::new(AuthService::in_memory(config.auth_config()));
        if config.seed_demo_users {
            auth.seed_demo_users()?;
        }

        let tokens = Arc::new(TokenService::new(
            JwtConfig::new(config.jwt_issuer.clone(), config.jwt_expires_in),
            config.jwt_secret.as_bytes(),
        )?);

        Ok(Self { auth, tokens })
    }

    /// State over an empty in-memory service
    pub fn new(auth_config: AuthConfig, tokens: TokenService) -> Self {
        Self {
            auth: Arc::new(AuthService::in_memory(auth_config)),
            tokens: Arc::new(tokens),
        }
    }
}
