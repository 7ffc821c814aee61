//! HTTP error envelope for every gateway endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use concierge_provider::ProviderError;

/// Failure rendered as a JSON `{"error": ...}` body.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid input, wrong method.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Request body over the configured upload limit.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Provider answered with an unexpected status.
    #[error("provider request failed")]
    ProviderRejected { status: u16, body: String },

    /// Network-level failure reaching the provider.
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// A chat pipeline collaborator failed.
    #[error("{stage} failed")]
    Collaborator {
        stage: &'static str,
        #[source]
        source: concierge_core::Error,
    },

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn payload_too_large() -> Self {
        Self::PayloadTooLarge
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn collaborator(stage: &'static str, source: concierge_core::Error) -> Self {
        Self::Collaborator { stage, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ProviderRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Transport(_) | ApiError::Collaborator { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected { status, body } => ApiError::ProviderRejected { status, body },
            ProviderError::Transport(e) => ApiError::Transport(e.to_string()),
            ProviderError::InvalidChatId(_) => ApiError::bad_request("Invalid chat_id"),
            ProviderError::InvalidUrl(msg) | ProviderError::Decode(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::ProviderRejected { status, body } => json!({
                "error": "provider request failed",
                "status_code": status,
                "response_body": body,
            }),
            ApiError::Collaborator { source, .. } => json!({
                "error": self.to_string(),
                "detail": source.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_envelope() {
        let (status, json) = body_json(ApiError::bad_request("No input provided")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "No input provided"}));
    }

    #[tokio::test]
    async fn test_rejection_relays_provider_status() {
        let (status, json) = body_json(ApiError::ProviderRejected {
            status: 422,
            body: "{\"message\":\"bad agent\"}".into(),
        })
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["status_code"], 422);
        assert_eq!(json["response_body"], "{\"message\":\"bad agent\"}");
    }

    #[tokio::test]
    async fn test_transport_and_internal_tiers_differ() {
        let (s1, transport) = body_json(ApiError::Transport("connection refused".into())).await;
        let (s2, internal) = body_json(ApiError::internal("boom")).await;
        assert_eq!(s1, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(s2, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(transport["error"], "HTTP request failed: connection refused");
        assert_eq!(internal["error"], "boom");
    }

    #[tokio::test]
    async fn test_collaborator_failure_names_stage() {
        let (status, json) = body_json(ApiError::collaborator(
            "transcription",
            concierge_core::Error::transcription("decoder crashed"),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "transcription failed");
        assert_eq!(json["detail"], "Transcription failed: decoder crashed");
    }
}
