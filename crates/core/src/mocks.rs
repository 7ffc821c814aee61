//! Mock implementations of core traits for testing.
//!
//! Every mock records the inputs it saw so tests can assert on call order
//! and arguments without reaching into the pipeline.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::{
    traits::{
        ClarificationProvider, EntityExtractor, IntentClassifier, IntentHandler, SpeechToText,
    },
    types::{AudioInput, AuthenticatedUser, EntityMap, IntentResult, RouteResult},
    Error, Result,
};

// =============================================================================
// Mock Speech-to-Text
// =============================================================================

/// Speech-to-text mock returning a fixed transcription.
pub struct MockSpeechToText {
    transcription: std::result::Result<String, String>,
    calls: Mutex<Vec<usize>>,
}

impl MockSpeechToText {
    pub fn new(transcription: &str) -> Self {
        Self {
            transcription: Ok(transcription.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A transcriber that always fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            transcription: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of transcriptions requested.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Sizes of the audio payloads received, in call order.
    pub fn received_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechToText for MockSpeechToText {
    async fn transcribe(&self, audio: &AudioInput) -> Result<String> {
        self.calls.lock().unwrap().push(audio.len());
        self.transcription.clone().map_err(Error::transcription)
    }
}

// =============================================================================
// Mock Intent Classifier
// =============================================================================

/// Classifier mock returning a fixed intent.
pub struct MockIntentClassifier {
    result: std::result::Result<IntentResult, String>,
    seen: Mutex<Vec<String>>,
}

impl MockIntentClassifier {
    pub fn new(label: &str, confidence: f64) -> Self {
        Self {
            result: Ok(IntentResult::new(label, confidence)),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Texts passed to `classify`, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for MockIntentClassifier {
    async fn classify(&self, text: &str) -> Result<IntentResult> {
        self.seen.lock().unwrap().push(text.to_string());
        self.result.clone().map_err(Error::classification)
    }
}

// =============================================================================
// Mock Entity Extractor
// =============================================================================

/// Extractor mock returning a fixed entity map.
#[derive(Default)]
pub struct MockEntityExtractor {
    entities: EntityMap,
    failure: Option<String>,
    seen: Mutex<Vec<String>>,
}

impl MockEntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Seed the map returned on every call.
    pub fn with_entity(mut self, kind: &str, value: &str) -> Self {
        self.entities.insert(kind.to_string(), value.to_string());
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityExtractor for MockEntityExtractor {
    async fn extract(&self, text: &str) -> Result<EntityMap> {
        self.seen.lock().unwrap().push(text.to_string());
        match &self.failure {
            Some(message) => Err(Error::extraction(message.clone())),
            None => Ok(self.entities.clone()),
        }
    }
}

// =============================================================================
// Mock Intent Handler
// =============================================================================

/// Arguments captured from one `IntentHandler::handle` call.
#[derive(Debug, Clone)]
pub struct HandledCall {
    pub intent: IntentResult,
    pub text: String,
    pub entities: EntityMap,
    pub user: AuthenticatedUser,
}

/// Handler mock returning a fixed route.
pub struct MockIntentHandler {
    route: std::result::Result<RouteResult, String>,
    calls: Mutex<Vec<HandledCall>>,
}

impl MockIntentHandler {
    pub fn new(route: RouteResult) -> Self {
        Self {
            route: Ok(route),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            route: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HandledCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentHandler for MockIntentHandler {
    async fn handle(
        &self,
        intent: &IntentResult,
        text: &str,
        entities: &EntityMap,
        user: &AuthenticatedUser,
    ) -> Result<RouteResult> {
        self.calls.lock().unwrap().push(HandledCall {
            intent: intent.clone(),
            text: text.to_string(),
            entities: entities.clone(),
            user: user.clone(),
        });
        self.route.clone().map_err(Error::routing)
    }
}

// =============================================================================
// Mock Clarification
// =============================================================================

/// Clarification mock returning a fixed prompt.
pub struct MockClarifier {
    answer: String,
    seen: Mutex<Vec<String>>,
}

impl MockClarifier {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClarificationProvider for MockClarifier {
    async fn clarify(&self, text: &str) -> Result<String> {
        self.seen.lock().unwrap().push(text.to_string());
        Ok(self.answer.clone())
    }
}
