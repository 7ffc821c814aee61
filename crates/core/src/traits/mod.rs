//! Core traits for the voice concierge.
//!
//! Each collaborator of the chat pipeline is one trait with one method:
//! - `speech`: speech-to-text
//! - `nlp`: intent classification, entity extraction, intent handling and
//!   clarification

pub mod nlp;
pub mod speech;

pub use nlp::*;
pub use speech::*;
