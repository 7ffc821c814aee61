#![deny(unused)]
//! Voice Concierge - voice and text chat gateway for hotel guests and staff.
//!
//! Serves the `voice-chat/` controller and thin proxy endpoints in front of
//! the conversational-AI provider.

use std::sync::Arc;

use concierge_core::config::AppConfig;
use concierge_gateway::{
    AuthState, ChatPipeline, DefaultIntentHandler, GatewayConfig, GatewayServer,
    KeywordIntentClassifier, RegexEntityExtractor, TemplateClarifier, WhisperTranscriber,
};
use concierge_governance::{build_authenticator, RoleGuard};
use concierge_provider::ProviderClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not up yet
            eprintln!("Failed to load configuration ({}), using defaults", e);
            AppConfig::default()
        }
    };

    let _telemetry = concierge_governance::configure_tracing(&config.logging)?;

    tracing::info!("Starting Voice Concierge v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Chat pipeline
    // =========================================================================
    if config.speech.api_key.is_none() {
        tracing::warn!("speech.api_key not set - audio requests will fail transcription");
    }
    let pipeline = ChatPipeline::new(
        Arc::new(WhisperTranscriber::new(config.speech.clone())),
        Arc::new(KeywordIntentClassifier::default()),
        Arc::new(RegexEntityExtractor::default()),
        Arc::new(DefaultIntentHandler::new(config.nlp.min_confidence)),
        Arc::new(TemplateClarifier),
    );
    tracing::info!(
        min_confidence = config.nlp.min_confidence,
        speech_model = %config.speech.model,
        "Chat pipeline initialized"
    );

    // =========================================================================
    // Provider client
    // =========================================================================
    let provider = ProviderClient::new(config.provider.clone());
    tracing::info!(base_url = %config.provider.base_url, "Provider client initialized");

    // =========================================================================
    // Authentication
    // =========================================================================
    let authenticator = build_authenticator(&config.auth)?;
    let auth = AuthState::new(
        authenticator,
        RoleGuard::new(config.auth.allowed_roles.clone()),
    );

    // =========================================================================
    // Gateway
    // =========================================================================
    let gateway_config = GatewayConfig::from(&config.server);
    let mut server = GatewayServer::new(gateway_config.clone(), pipeline, provider).with_auth(auth);

    if config.server.enable_metrics {
        let handle = concierge_governance::setup_metrics_recorder()?;
        server = server.with_metrics(handle);
    }

    let prefix = gateway_config.api_prefix.trim_end_matches('/');
    println!();
    println!("Voice Concierge v{}", env!("CARGO_PKG_VERSION"));
    println!("  Server: http://{}:{}", gateway_config.host, gateway_config.port);
    println!("  Endpoints:");
    println!("    GET  /health");
    println!("    POST {}/voice-chat/", prefix);
    println!("    POST {}/create-chat/", prefix);
    println!("    POST {}/create-chat-completion/", prefix);
    println!("    GET  {}/list-chats/", prefix);
    println!("    GET  {}/retrieve-chat/{{chat_id}}/", prefix);
    println!("    POST {}/end-chat/{{chat_id}}/", prefix);
    println!();

    server.run().await?;

    Ok(())
}
