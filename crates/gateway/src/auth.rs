//! Bearer-token gate in front of the chat controller.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use concierge_governance::{Authenticator, NoOpAuthenticator, RoleGuard};

use crate::error::ApiError;

/// Authenticator plus the roles allowed through.
pub struct AuthState {
    pub authenticator: Arc<dyn Authenticator>,
    pub guard: RoleGuard,
}

impl AuthState {
    pub fn new(authenticator: Arc<dyn Authenticator>, guard: RoleGuard) -> Self {
        Self {
            authenticator,
            guard,
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new(Arc::new(NoOpAuthenticator), RoleGuard::default())
    }
}

/// Validate the bearer token and stash the caller in request extensions.
pub async fn require_auth(
    State(auth): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authentication credentials were not provided".to_string())
        })?;

    let user = auth.authenticator.validate(&token).await.map_err(|e| {
        tracing::warn!(error = %e, "Authentication failed");
        ApiError::Unauthorized("Invalid token".to_string())
    })?;

    if !auth.guard.permits(&user) {
        tracing::warn!(user_id = %user.user_id, role = %user.role, "Role not permitted");
        return Err(ApiError::Forbidden("Permission denied".to_string()));
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
