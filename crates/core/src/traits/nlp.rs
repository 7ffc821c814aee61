//! Natural-language collaborators of the chat pipeline.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AuthenticatedUser, EntityMap, IntentResult, RouteResult};

/// Predicts what the user wants.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify lowercased text into an intent label with a confidence.
    async fn classify(&self, text: &str) -> Result<IntentResult>;
}

/// Pulls structured values out of free text.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extract entities from lowercased text. Returns a fresh map.
    async fn extract(&self, text: &str) -> Result<EntityMap>;
}

/// Decides the answer and client action for a classified request.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Route an already classified request. `intent.confidence` is full precision.
    async fn handle(
        &self,
        intent: &IntentResult,
        text: &str,
        entities: &EntityMap,
        user: &AuthenticatedUser,
    ) -> Result<RouteResult>;
}

/// Produces a fallback answer asking the user to restate their input.
#[async_trait]
pub trait ClarificationProvider: Send + Sync {
    async fn clarify(&self, text: &str) -> Result<String>;
}
