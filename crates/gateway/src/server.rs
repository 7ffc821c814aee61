//! Axum-based HTTP server for the gateway.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use concierge_core::{config::ServerConfig, Error, Result};
use concierge_provider::ProviderClient;

use crate::auth::{require_auth, AuthState};
use crate::chat::{voice_chat_handler, ChatPipeline};
use crate::proxy::{
    create_chat_completion_handler, create_chat_handler, end_chat_handler, get_required,
    list_chats_handler, post_required, retrieve_chat_handler,
};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Prefix for every gateway route, e.g. `/api`.
    pub api_prefix: String,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
    /// Body limit for `voice-chat/` uploads.
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for GatewayConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            api_prefix: server.api_prefix.clone(),
            enable_cors: server.enable_cors,
            enable_tracing: server.enable_tracing,
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}

/// Shared application state. Read-only after startup.
pub struct AppState {
    /// Chat controller.
    pub pipeline: ChatPipeline,
    /// Provider client for the proxy endpoints.
    pub provider: ProviderClient,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
    auth: Arc<AuthState>,
    metrics_handle: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new gateway server. Authentication defaults to the no-op
    /// authenticator until [`GatewayServer::with_auth`] is called.
    pub fn new(config: GatewayConfig, pipeline: ChatPipeline, provider: ProviderClient) -> Self {
        Self {
            config,
            state: Arc::new(AppState { pipeline, provider }),
            auth: Arc::new(AuthState::default()),
            metrics_handle: None,
        }
    }

    /// Set the authenticator and role guard for `voice-chat/`.
    pub fn with_auth(mut self, auth: AuthState) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    /// Set metrics handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Routes served under the API prefix.
    fn api_routes(&self) -> Router {
        let auth = middleware::from_fn_with_state(self.auth.clone(), require_auth);

        Router::new()
            .route(
                "/voice-chat/",
                post(voice_chat_handler)
                    .route_layer(auth)
                    .fallback(post_required)
                    .layer(DefaultBodyLimit::max(self.config.max_upload_bytes)),
            )
            .route(
                "/create-chat/",
                post(create_chat_handler).fallback(post_required),
            )
            .route(
                "/create-chat-completion/",
                post(create_chat_completion_handler).fallback(post_required),
            )
            .route(
                "/list-chats/",
                get(list_chats_handler).fallback(get_required),
            )
            .route(
                "/retrieve-chat/:chat_id/",
                get(retrieve_chat_handler).fallback(get_required),
            )
            .route(
                "/end-chat/:chat_id/",
                post(end_chat_handler).fallback(post_required),
            )
            .with_state(self.state.clone())
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new().route("/health", get(health_handler));

        let prefix = self.config.api_prefix.trim_end_matches('/');
        router = if prefix.is_empty() {
            router.merge(self.api_routes())
        } else {
            router.nest(prefix, self.api_routes())
        };

        if let Some(handle) = &self.metrics_handle {
            let handle = handle.clone();
            router = router.route("/metrics", get(move || async move { handle.render() }));
        }

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::gateway(format!("Failed to bind: {}", e)))?;

        tracing::info!(addr = %addr, prefix = %self.config.api_prefix, "Gateway server starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::gateway(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_config_from_server_section() {
        let server = ServerConfig {
            port: 9001,
            api_prefix: "/v2".into(),
            ..ServerConfig::default()
        };
        let config = GatewayConfig::from(&server);
        assert_eq!(config.port, 9001);
        assert_eq!(config.api_prefix, "/v2");
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
        assert!(config.enable_cors);
    }
}
