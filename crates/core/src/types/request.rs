use bytes::Bytes;
use uuid::Uuid;

// =============================================================================
// Request Types
// =============================================================================

/// Raw audio uploaded with a chat request.
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// Audio bytes as received.
    pub data: Bytes,
    /// Client-side file name, if the upload carried one.
    pub filename: Option<String>,
    /// Declared MIME type, if any.
    pub content_type: Option<String>,
}

impl AudioInput {
    /// Wrap raw bytes with no file metadata.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            filename: None,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Inbound chat request. When both fields are set, audio wins.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Unique trace ID for this request.
    pub trace_id: String,
    /// Typed input.
    pub text: Option<String>,
    /// Spoken input, transcribed before anything else runs.
    pub audio: Option<AudioInput>,
}

impl ChatRequest {
    /// Create a text-only request.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            text: Some(text.into()),
            audio: None,
        }
    }

    /// Create an audio-only request.
    pub fn audio(audio: AudioInput) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            text: None,
            audio: Some(audio),
        }
    }

    /// Create a request from whatever the client sent.
    pub fn new(text: Option<String>, audio: Option<AudioInput>) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            text,
            audio,
        }
    }
}
