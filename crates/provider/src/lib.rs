#![deny(unused)]
//! HTTP client for the conversational-AI provider.
//!
//! Every call is a single forward: no retries, no caching, no idempotency.
//! A duplicate call produces a duplicate provider-side effect.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ProviderClient, ProviderOperation};
pub use error::ProviderError;
pub use types::{ChatCompletionPayload, CreateChatPayload, ProviderReply};
