//! Provider call failures.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered with a status other than the expected one.
    #[error("provider request failed with status {status}")]
    Rejected { status: u16, body: String },

    /// Connection, timeout or body-read failure.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The chat id cannot be used as a path segment.
    #[error("invalid chat id: {0:?}")]
    InvalidChatId(String),

    /// The configured base URL cannot carry a path.
    #[error("invalid provider URL: {0}")]
    InvalidUrl(String),

    /// The provider accepted the call but its body is not JSON.
    #[error("provider returned an unreadable body: {0}")]
    Decode(String),
}
