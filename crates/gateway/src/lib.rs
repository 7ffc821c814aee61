#![deny(unused)]
//! HTTP gateway for the voice concierge.
//!
//! This crate provides the HTTP entry point for the system: the voice-chat
//! controller with its default collaborators, and thin proxy endpoints in
//! front of the conversational-AI provider.

pub mod audio;
pub mod auth;
pub mod chat;
pub mod entities;
pub mod error;
pub mod handler;
pub mod proxy;
pub mod router;
pub mod server;

pub use audio::{AudioFormat, WhisperTranscriber};
pub use auth::AuthState;
pub use chat::{ChatInput, ChatPipeline};
pub use entities::RegexEntityExtractor;
pub use error::ApiError;
pub use handler::{DefaultIntentHandler, TemplateClarifier};
pub use router::KeywordIntentClassifier;
pub use server::{AppState, GatewayConfig, GatewayServer};
