//! Bearer-token authentication and role checks for inbound requests.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::Deserialize;

use concierge_core::{
    config::{AuthConfig, AuthMode},
    AuthenticatedUser, Error, Result,
};

/// Validates a bearer token and resolves the caller.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validate a token and return the authenticated user.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser>;
}

/// An authenticator that accepts every token (for development and tests).
pub struct NoOpAuthenticator;

#[async_trait]
impl Authenticator for NoOpAuthenticator {
    async fn validate(&self, _token: &str) -> Result<AuthenticatedUser> {
        Ok(AuthenticatedUser::anonymous())
    }
}

/// Claims read from an access token. `user_id` may be numeric.
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: Option<String>,
    user_id: Option<serde_json::Value>,
    role: Option<String>,
    email: Option<String>,
}

/// HS256 access-token validator.
pub struct JwtAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    /// Create a validator for tokens signed with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            Error::unauthorized("Invalid token")
        })?;
        let claims = data.claims;

        let user_id = match claims.user_id {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => claims.sub,
        }
        .ok_or_else(|| Error::unauthorized("Token has no user identity"))?;

        Ok(AuthenticatedUser {
            user_id,
            role: claims.role.unwrap_or_else(|| "guest".to_string()),
            email: claims.email,
        })
    }
}

/// Role allow-list applied after authentication. An empty list allows everyone.
#[derive(Debug, Clone, Default)]
pub struct RoleGuard {
    allowed: Vec<String>,
}

impl RoleGuard {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    pub fn permits(&self, user: &AuthenticatedUser) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|r| r == &user.role)
    }
}

/// Build the authenticator selected by configuration.
pub fn build_authenticator(config: &AuthConfig) -> Result<Arc<dyn Authenticator>> {
    match config.mode {
        AuthMode::Jwt => {
            let secret = config.jwt_secret.as_ref().ok_or_else(|| {
                Error::governance("auth.jwt_secret is required when auth.mode = \"jwt\"")
            })?;
            Ok(Arc::new(JwtAuthenticator::new(
                secret.expose_secret().as_bytes(),
            )))
        }
        AuthMode::Disabled => {
            tracing::warn!("Using NoOpAuthenticator - NOT SUITABLE FOR PRODUCTION");
            Ok(Arc::new(NoOpAuthenticator))
        }
    }
}
