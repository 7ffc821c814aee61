//! Audio processing for speech-to-text transcription.
//!
//! Uploads are sent to an OpenAI-compatible `audio/transcriptions`
//! endpoint (Whisper or a self-hosted equivalent).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;

use concierge_core::{
    config::SpeechConfig,
    traits::SpeechToText,
    types::AudioInput,
    Error, Result,
};

/// Supported audio formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Mp4,
    M4a,
    Wav,
    Webm,
    Ogg,
}

impl AudioFormat {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Mp4 => "audio/mp4",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Ogg => "audio/ogg",
        }
    }

    /// Get the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// Detect format from magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if data.starts_with(b"OggS") {
            return Some(AudioFormat::Ogg);
        }
        // ID3 tag or a bare MPEG frame sync
        if data.starts_with(b"ID3") || data.starts_with(&[0xFF, 0xFB]) || data.starts_with(&[0xFF, 0xFA]) {
            return Some(AudioFormat::Mp3);
        }
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(AudioFormat::Webm);
        }
        if data.len() >= 8 && &data[4..8] == b"ftyp" {
            return Some(AudioFormat::Mp4);
        }

        None
    }

    /// Map a declared MIME type (parameters ignored).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "audio/mpeg" | "audio/mp3" => Some(AudioFormat::Mp3),
            "audio/mp4" | "video/mp4" => Some(AudioFormat::Mp4),
            "audio/x-m4a" | "audio/m4a" => Some(AudioFormat::M4a),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(AudioFormat::Wav),
            "audio/webm" | "video/webm" => Some(AudioFormat::Webm),
            "audio/ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// Resolve the format of an upload: bytes first, then the declared type.
    pub fn resolve(audio: &AudioInput) -> Option<Self> {
        Self::detect(&audio.data).or_else(|| audio.content_type.as_deref().and_then(Self::from_mime))
    }
}

/// Body of a transcription response; only `text` is used.
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Whisper-compatible transcription client.
pub struct WhisperTranscriber {
    http: reqwest::Client,
    config: SpeechConfig,
}

impl WhisperTranscriber {
    pub fn new(config: SpeechConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: SpeechConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    async fn transcribe(&self, audio: &AudioInput) -> Result<String> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            Error::transcription("speech.api_key not set for Whisper transcription")
        })?;

        let format = AudioFormat::resolve(audio)
            .ok_or_else(|| Error::transcription("Unknown audio format"))?;

        let filename = audio
            .filename
            .clone()
            .unwrap_or_else(|| format!("recording.{}", format.extension()));

        tracing::info!(
            format = ?format,
            size = audio.len(),
            model = %self.config.model,
            "Transcribing audio with Whisper"
        );

        let part = Part::bytes(audio.data.to_vec())
            .file_name(filename)
            .mime_str(format.mime_type())
            .map_err(|e| Error::transcription(e.to_string()))?;
        let form = Form::new()
            .text("model", self.config.model.clone())
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::transcription(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::transcription(format!(
                "service returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::transcription(format!("unreadable response: {}", e)))?;

        Ok(body.text)
    }
}
