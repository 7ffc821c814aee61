//! Speech-to-text trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::AudioInput;

/// Converts an uploaded audio payload into text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the audio.
    async fn transcribe(&self, audio: &AudioInput) -> Result<String>;
}
