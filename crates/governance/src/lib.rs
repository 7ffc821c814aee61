#![deny(unused)]
//! Governance for the voice concierge.
//!
//! This crate provides:
//! - Logging and distributed tracing setup
//! - Prometheus metrics
//! - Bearer-token authentication with role checks

pub mod metrics;
pub mod rbac;
pub mod tracing_layer;

pub use metrics::{setup_metrics_recorder, track_chat, track_provider_request};
pub use rbac::{build_authenticator, Authenticator, JwtAuthenticator, NoOpAuthenticator, RoleGuard};
pub use tracing_layer::{configure_tracing, TelemetryGuard};
