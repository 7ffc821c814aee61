//! Layered application configuration.
//!
//! Sources, lowest priority first: `config/default`, `config/{APP_ENV}`,
//! `config/local`, then `APP__SECTION__KEY` environment variables.

use config::{Config, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub speech: SpeechConfig,
    pub nlp: NlpConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix every gateway route is mounted under.
    pub api_prefix: String,
    pub enable_cors: bool,
    pub enable_tracing: bool,
    pub enable_metrics: bool,
    /// Largest accepted `voice-chat/` request body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            api_prefix: "/api".into(),
            enable_cors: true,
            enable_tracing: true,
            enable_metrics: true,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Conversational-AI provider the proxy endpoints forward to.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.retellai.com".into(),
            api_key: None,
        }
    }
}

impl ProviderConfig {
    /// Build a config pointing at `base_url` with the given key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: Some(Secret::new(api_key.into())),
        }
    }

    /// Join an operation path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// OpenAI-compatible transcription service.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: Option<Secret<String>>,
    pub model: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "whisper-1".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NlpConfig {
    /// Below this confidence the default handler produces no answer.
    pub min_confidence: f64,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HS256 bearer tokens.
    Jwt,
    /// Every bearer token is accepted as an anonymous guest.
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_secret: Option<Secret<String>>,
    pub allowed_roles: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Disabled,
            jwt_secret: None,
            allowed_roles: vec![
                "management".into(),
                "hotel_staff".into(),
                "guest".into(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit logs as JSON lines.
    pub json: bool,
    /// Default filter when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info,voice_concierge=debug,concierge_gateway=debug".into(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__PROVIDER__API_KEY=... to provider.api_key
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.allowed_roles")
                    .try_parsing(true),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }
}
