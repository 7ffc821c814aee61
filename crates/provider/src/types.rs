use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outbound body of `create-chat`. Fields are relayed as the client sent them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatPayload {
    pub agent_id: Value,
    pub agent_version: Value,
    pub metadata: Value,
    pub retell_llm_dynamic_variables: Value,
}

impl CreateChatPayload {
    /// Payload with the default version, metadata and dynamic variables.
    pub fn new(agent_id: impl Into<Value>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_version: Value::from(1),
            metadata: Value::Object(Map::new()),
            retell_llm_dynamic_variables: Value::Object(Map::new()),
        }
    }
}

/// Outbound body of `create-chat-completion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionPayload {
    pub chat_id: Value,
    pub content: Value,
}

/// A successful provider answer, relayed to the client as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}
