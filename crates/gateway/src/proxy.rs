//! Provider proxy endpoints.
//!
//! Each handler validates its input, performs exactly one provider call and
//! relays the outcome. Bodies are parsed by hand so that malformed JSON and
//! missing fields produce distinct 400 messages.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use concierge_provider::{
    ChatCompletionPayload, CreateChatPayload, ProviderError, ProviderOperation, ProviderReply,
};

use crate::error::ApiError;
use crate::server::AppState;

/// Python-style truthiness: null, false, 0, "", [] and {} are missing.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Parse a request body as a JSON object.
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON payload"))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::internal(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn required(data: &Map<String, Value>, key: &str) -> Option<Value> {
    data.get(key).filter(|v| is_truthy(v)).cloned()
}

fn or_empty_object(data: &Map<String, Value>, key: &str) -> Value {
    data.get(key)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Await one provider call, record metrics, relay the reply.
async fn forward<F>(operation: ProviderOperation, call: F) -> Result<Response, ApiError>
where
    F: Future<Output = Result<ProviderReply, ProviderError>>,
{
    let started = Instant::now();
    let result = call.await;

    let status = match &result {
        Ok(reply) => reply.status,
        Err(ProviderError::Rejected { status, .. }) => *status,
        Err(_) => 500,
    };
    concierge_governance::track_provider_request(
        operation.name(),
        status,
        started.elapsed().as_secs_f64(),
    );

    let reply = result?;
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    if status == StatusCode::NO_CONTENT {
        return Ok(status.into_response());
    }
    Ok((status, Json(reply.body)).into_response())
}

/// `POST create-chat/`
pub async fn create_chat_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let data = parse_object(&body)?;
    let agent_id =
        required(&data, "agent_id").ok_or_else(|| ApiError::bad_request("agent_id is required"))?;

    let payload = CreateChatPayload {
        agent_id,
        agent_version: data.get("agent_version").cloned().unwrap_or(Value::from(1)),
        metadata: or_empty_object(&data, "metadata"),
        retell_llm_dynamic_variables: or_empty_object(&data, "retell_llm_dynamic_variables"),
    };

    tracing::info!(agent_id = %payload.agent_id, "Creating provider chat");
    forward(
        ProviderOperation::CreateChat,
        state.provider.create_chat(&payload),
    )
    .await
}

/// `POST create-chat-completion/`
pub async fn create_chat_completion_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let data = parse_object(&body)?;
    let (chat_id, content) = match (required(&data, "chat_id"), required(&data, "content")) {
        (Some(chat_id), Some(content)) => (chat_id, content),
        _ => return Err(ApiError::bad_request("chat_id and content are required")),
    };

    tracing::info!(chat_id = %chat_id, "Posting chat completion");
    forward(
        ProviderOperation::CreateChatCompletion,
        state
            .provider
            .create_chat_completion(&ChatCompletionPayload { chat_id, content }),
    )
    .await
}

/// `GET list-chats/`
pub async fn list_chats_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    forward(ProviderOperation::ListChats, state.provider.list_chats()).await
}

/// `GET retrieve-chat/{chat_id}/`
pub async fn retrieve_chat_handler(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
) -> Result<Response, ApiError> {
    forward(ProviderOperation::GetChat, state.provider.get_chat(&chat_id)).await
}

/// `POST end-chat/{chat_id}/`
pub async fn end_chat_handler(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<String>,
) -> Result<Response, ApiError> {
    tracing::info!(chat_id = %chat_id, "Ending provider chat");
    forward(ProviderOperation::EndChat, state.provider.end_chat(&chat_id)).await
}

/// Fallback for non-POST methods on POST endpoints.
pub async fn post_required() -> ApiError {
    ApiError::bad_request("POST request required")
}

/// Fallback for non-GET methods on GET endpoints.
pub async fn get_required() -> ApiError {
    ApiError::bad_request("GET request required")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("a1")));
        assert!(is_truthy(&json!(7)));
    }

    #[test]
    fn test_parse_object_tiers() {
        assert!(matches!(
            parse_object(b"not json"),
            Err(ApiError::BadRequest(ref m)) if m == "Invalid JSON payload"
        ));
        assert!(matches!(parse_object(b""), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_object(b"[1, 2]"), Err(ApiError::Internal(_))));
        assert_eq!(parse_object(br#"{"a": 1}"#).unwrap().len(), 1);
    }

    #[test]
    fn test_optional_fields_default_to_empty_objects() {
        let data = parse_object(br#"{"agent_id": "a1", "metadata": {"k": "v"}}"#).unwrap();
        assert_eq!(or_empty_object(&data, "metadata"), json!({"k": "v"}));
        assert_eq!(or_empty_object(&data, "retell_llm_dynamic_variables"), json!({}));
    }
}
