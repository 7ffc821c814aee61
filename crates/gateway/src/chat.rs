//! The `voice-chat/` controller.
//!
//! One request runs: transcription (audio only), intent classification,
//! entity extraction, intent routing and, when routing produced no answer,
//! clarification. Nothing is kept between requests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    Extension, Form, Json,
};
use base64::Engine;
use serde_json::Value;

use concierge_core::{
    traits::{ClarificationProvider, EntityExtractor, IntentClassifier, IntentHandler, SpeechToText},
    types::{AudioInput, AuthenticatedUser, ChatRequest, ChatResponse},
};

use crate::error::ApiError;
use crate::server::AppState;

/// Chat pipeline over its five collaborators.
#[derive(Clone)]
pub struct ChatPipeline {
    speech: Arc<dyn SpeechToText>,
    classifier: Arc<dyn IntentClassifier>,
    extractor: Arc<dyn EntityExtractor>,
    handler: Arc<dyn IntentHandler>,
    clarifier: Arc<dyn ClarificationProvider>,
}

impl ChatPipeline {
    pub fn new(
        speech: Arc<dyn SpeechToText>,
        classifier: Arc<dyn IntentClassifier>,
        extractor: Arc<dyn EntityExtractor>,
        handler: Arc<dyn IntentHandler>,
        clarifier: Arc<dyn ClarificationProvider>,
    ) -> Self {
        Self {
            speech,
            classifier,
            extractor,
            handler,
            clarifier,
        }
    }

    /// Run one request through the pipeline.
    pub async fn respond(
        &self,
        request: ChatRequest,
        user: &AuthenticatedUser,
    ) -> Result<ChatResponse, ApiError> {
        let trace_id = request.trace_id;
        let mut text = request.text;

        if let Some(audio) = &request.audio {
            tracing::debug!(trace_id = %trace_id, size = audio.len(), "Transcribing audio input");
            let transcript = self
                .speech
                .transcribe(audio)
                .await
                .map_err(|e| stage_failed(&trace_id, "transcription", e))?;
            text = Some(transcript);
        }

        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ApiError::bad_request("No input provided")),
        };
        let lowered = text.to_lowercase();

        let intent = self
            .classifier
            .classify(&lowered)
            .await
            .map_err(|e| stage_failed(&trace_id, "intent classification", e))?;

        let entities = self
            .extractor
            .extract(&lowered)
            .await
            .map_err(|e| stage_failed(&trace_id, "entity extraction", e))?;

        let route = self
            .handler
            .handle(&intent, &lowered, &entities, user)
            .await
            .map_err(|e| stage_failed(&trace_id, "intent routing", e))?;

        let clarified = route.needs_clarification();
        let answer = match route.answer.clone() {
            Some(answer) if !clarified => answer,
            _ => self
                .clarifier
                .clarify(&lowered)
                .await
                .map_err(|e| stage_failed(&trace_id, "clarification", e))?,
        };

        tracing::info!(
            trace_id = %trace_id,
            user_id = %user.user_id,
            intent = %intent.label,
            confidence = intent.confidence,
            entities = entities.len(),
            clarified,
            "Chat request answered"
        );
        concierge_governance::track_chat(&intent.label, clarified);

        Ok(ChatResponse::assemble(text, answer, route, intent, entities))
    }
}

fn stage_failed(trace_id: &str, stage: &'static str, err: concierge_core::Error) -> ApiError {
    tracing::error!(trace_id = %trace_id, stage, error = %err, "Chat pipeline stage failed");
    ApiError::collaborator(stage, err)
}

// =============================================================================
// Input decoding
// =============================================================================

/// Text and/or audio decoded from a multipart, form or JSON body.
#[derive(Debug, Default)]
pub struct ChatInput {
    pub text: Option<String>,
    pub audio: Option<AudioInput>,
}

impl ChatInput {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let invalid = |e: MultipartError| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large()
            } else {
                ApiError::bad_request("Invalid multipart payload")
            }
        };
        let mut input = ChatInput::default();

        while let Some(field) = multipart.next_field().await.map_err(invalid)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("text") => input.text = Some(field.text().await.map_err(invalid)?),
                Some("audio") => {
                    let filename = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(invalid)?;
                    input.audio = Some(AudioInput {
                        data,
                        filename,
                        content_type,
                    });
                }
                _ => {}
            }
        }

        Ok(input)
    }

    fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ChatInput::default());
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON payload"))?;
        let Value::Object(data) = value else {
            return Err(ApiError::bad_request("Invalid JSON payload"));
        };

        let text = match data.get("text") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(ApiError::bad_request("text must be a string")),
        };

        let audio = match data.get("audio") {
            None | Some(Value::Null) => None,
            Some(Value::String(encoded)) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|_| ApiError::bad_request("Invalid audio encoding"))?;
                Some(AudioInput::new(bytes))
            }
            Some(_) => return Err(ApiError::bad_request("Invalid audio encoding")),
        };

        Ok(ChatInput { text, audio })
    }
}

#[async_trait]
impl<S> FromRequest<S> for ChatInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|_| ApiError::bad_request("Invalid multipart payload"))?;
            return Self::from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| match e.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(),
                    _ => ApiError::bad_request("Invalid form payload"),
                })?;
            return Ok(ChatInput {
                text: fields.get("text").cloned(),
                audio: None,
            });
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| match e.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(),
                _ => ApiError::bad_request(e.body_text()),
            })?;
        Self::from_json(&body)
    }
}

/// `POST voice-chat/`
pub async fn voice_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    input: ChatInput,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = ChatRequest::new(input.text, input.audio);
    tracing::info!(
        trace_id = %request.trace_id,
        has_text = request.text.is_some(),
        has_audio = request.audio.is_some(),
        "Processing chat request"
    );

    let response = state.pipeline.respond(request, &user).await?;
    Ok(Json(response))
}
