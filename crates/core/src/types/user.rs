use serde::{Deserialize, Serialize};

/// Caller identity established by the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            email: None,
        }
    }

    /// Identity used when authentication is disabled.
    pub fn anonymous() -> Self {
        Self::new("anonymous", "guest")
    }
}
