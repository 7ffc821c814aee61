//! Error types for the voice concierge.

use thiserror::Error;

/// Result type alias using the concierge Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type shared by every layer.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Gateway Errors
    // =========================================================================
    #[error("Gateway error: {0}")]
    Gateway(String),

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Intent classification failed: {0}")]
    Classification(String),

    #[error("Entity extraction failed: {0}")]
    Extraction(String),

    #[error("Intent routing failed: {0}")]
    Routing(String),

    // =========================================================================
    // Governance Errors
    // =========================================================================
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Governance error: {0}")]
    Governance(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Create a gateway error.
    pub fn gateway(msg: impl Into<String>) -> Self {
        Self::Gateway(msg.into())
    }

    /// Create a transcription error.
    pub fn transcription(msg: impl Into<String>) -> Self {
        Self::Transcription(msg.into())
    }

    /// Create a classification error.
    pub fn classification(msg: impl Into<String>) -> Self {
        Self::Classification(msg.into())
    }

    /// Create an entity extraction error.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a routing error.
    pub fn routing(msg: impl Into<String>) -> Self {
        Self::Routing(msg.into())
    }

    /// Create an unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a governance error.
    pub fn governance(msg: impl Into<String>) -> Self {
        Self::Governance(msg.into())
    }
}
