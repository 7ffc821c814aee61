//! Core type definitions for the voice concierge.
//!
//! Everything here is request-scoped: built while serving one HTTP request
//! and dropped with its response.

pub mod chat;
pub mod intent;
pub mod request;
pub mod user;

pub use chat::*;
pub use intent::*;
pub use request::*;
pub use user::*;
