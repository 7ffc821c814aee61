#![deny(unused)]
//! Core types, traits, and error definitions for the voice concierge.
//!
//! This crate provides the building blocks shared by the gateway, the
//! provider client and the governance layer.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
