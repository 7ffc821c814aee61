use serde::{Deserialize, Serialize};

use super::intent::{EntityMap, IntentResult, RouteResult};

/// Response body of `voice-chat/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Effective input text, before lowercasing.
    pub transcription: String,
    pub answer: String,
    pub action: Option<String>,
    pub intent: String,
    /// Classifier confidence rounded to two decimals.
    pub confidence: f64,
    pub entities: EntityMap,
}

impl ChatResponse {
    /// Assemble the outward response. `answer` is the final answer after any
    /// clarification fallback; the action always comes from `route`.
    pub fn assemble(
        transcription: String,
        answer: String,
        route: RouteResult,
        intent: IntentResult,
        entities: EntityMap,
    ) -> Self {
        Self {
            transcription,
            answer,
            action: route.action,
            intent: intent.label,
            confidence: round_confidence(intent.confidence),
            entities,
        }
    }
}

/// Round to two decimal places from the exact binary value, ties to even.
/// Scaling by 100 first would round twice.
pub fn round_confidence(confidence: f64) -> f64 {
    format!("{:.2}", confidence)
        .parse()
        .unwrap_or(confidence)
}
