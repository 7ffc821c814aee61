use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Pipeline Types
// =============================================================================

/// Output of the intent classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Discrete intent label.
    pub label: String,
    /// Confidence in `[0, 1]`, full precision.
    pub confidence: f64,
}

impl IntentResult {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Entity type -> extracted value.
pub type EntityMap = HashMap<String, String>;

/// What the intent handler decided to say and do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub answer: Option<String>,
    pub action: Option<String>,
}

impl RouteResult {
    pub fn new(answer: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            action: Some(action.into()),
        }
    }

    /// No answer and no action.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An action with nothing to say.
    pub fn action_only(action: impl Into<String>) -> Self {
        Self {
            answer: None,
            action: Some(action.into()),
        }
    }

    /// True when the answer is missing or empty.
    pub fn needs_clarification(&self) -> bool {
        self.answer.as_deref().map_or(true, str::is_empty)
    }
}
