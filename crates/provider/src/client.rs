//! Provider API client.

use std::time::Instant;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use secrecy::ExposeSecret;
use serde_json::{Map, Value};

use concierge_core::config::ProviderConfig;

use crate::error::ProviderError;
use crate::types::{ChatCompletionPayload, CreateChatPayload, ProviderReply};

/// Operations forwarded to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOperation {
    CreateChat,
    CreateChatCompletion,
    ListChats,
    GetChat,
    EndChat,
}

impl ProviderOperation {
    /// Stable name used in logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderOperation::CreateChat => "create_chat",
            ProviderOperation::CreateChatCompletion => "create_chat_completion",
            ProviderOperation::ListChats => "list_chats",
            ProviderOperation::GetChat => "get_chat",
            ProviderOperation::EndChat => "end_chat",
        }
    }

    /// Whether `status` counts as success for this operation.
    fn accepts(&self, status: StatusCode) -> bool {
        match self {
            ProviderOperation::CreateChat | ProviderOperation::CreateChatCompletion => {
                status == StatusCode::CREATED
            }
            ProviderOperation::ListChats | ProviderOperation::GetChat => status == StatusCode::OK,
            ProviderOperation::EndChat => status.is_success(),
        }
    }
}

/// Client for the provider's chat API. Holds no per-request state.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create a client with default HTTP settings (no explicit timeout).
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a client over an existing `reqwest::Client`.
    pub fn with_client(config: ProviderConfig, http: reqwest::Client) -> Self {
        if config.api_key.is_none() {
            tracing::warn!(base_url = %config.base_url, "Provider API key not configured");
        }
        Self { http, config }
    }

    /// Start a chat session for an agent.
    pub async fn create_chat(
        &self,
        payload: &CreateChatPayload,
    ) -> Result<ProviderReply, ProviderError> {
        let builder = self.request(Method::POST, "create-chat").json(payload);
        self.dispatch(ProviderOperation::CreateChat, builder).await
    }

    /// Post a user message to a chat and get the agent's completion.
    pub async fn create_chat_completion(
        &self,
        payload: &ChatCompletionPayload,
    ) -> Result<ProviderReply, ProviderError> {
        let builder = self
            .request(Method::POST, "create-chat-completion")
            .json(payload);
        self.dispatch(ProviderOperation::CreateChatCompletion, builder)
            .await
    }

    pub async fn list_chats(&self) -> Result<ProviderReply, ProviderError> {
        let builder = self.request(Method::GET, "list-chat");
        self.dispatch(ProviderOperation::ListChats, builder).await
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<ProviderReply, ProviderError> {
        let url = self.chat_url("get-chat", chat_id)?;
        let builder = self.authorized(self.http.get(url));
        self.dispatch(ProviderOperation::GetChat, builder).await
    }

    pub async fn end_chat(&self, chat_id: &str) -> Result<ProviderReply, ProviderError> {
        let url = self.chat_url("end-chat", chat_id)?;
        let builder = self.authorized(self.http.patch(url));
        self.dispatch(ProviderOperation::EndChat, builder).await
    }

    /// `{base_url}/{operation}/{chat_id}` with the id as exactly one
    /// percent-encoded path segment.
    fn chat_url(&self, operation: &str, chat_id: &str) -> Result<Url, ProviderError> {
        if chat_id.is_empty() || chat_id == "." || chat_id == ".." {
            return Err(ProviderError::InvalidChatId(chat_id.to_string()));
        }

        let endpoint = self.config.endpoint(operation);
        let mut url =
            Url::parse(&endpoint).map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(endpoint.clone()))?
            .push(chat_id);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorized(self.http.request(method, self.config.endpoint(path)))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    async fn dispatch(
        &self,
        operation: ProviderOperation,
        builder: RequestBuilder,
    ) -> Result<ProviderReply, ProviderError> {
        let started = Instant::now();

        let response = builder.send().await.map_err(|e| {
            tracing::error!(operation = operation.name(), error = %e, "Provider unreachable");
            ProviderError::Transport(e)
        })?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            operation = operation.name(),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Provider responded"
        );

        if !operation.accepts(status) {
            tracing::warn!(
                operation = operation.name(),
                status = status.as_u16(),
                "Provider rejected request"
            );
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))?
        };

        Ok(ProviderReply {
            status: status.as_u16(),
            body,
        })
    }
}
