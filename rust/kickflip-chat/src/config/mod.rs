//! Configuration loading.
//!
//! Sources are layered in this order, later ones winning:
//! 1. Built-in defaults
//! 2. `config/kickflip-chat.{yaml,toml,json}` (or the file passed with `--config`)
//! 3. `KICKFLIP__SECTION__KEY` environment variables
//! 4. Well-known variables: `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`,
//!    `GROQ_API_KEY`, `REDIS_URL`
//!
//! ```rust,ignore
//! use kickflip_chat::config::AppConfig;
//!
//! let config = AppConfig::load(None)?;
//! let settings = config.create_llm_settings();
//! ```

pub mod error;
pub mod validator;

pub use error::{ConfigResult, ConfigurationError};
pub use validator::ConfigValidator;

use serde::{Deserialize, Serialize};

use crate::conversation::policy::OfferTiming;
use crate::conversation::recommender::DEFAULT_HISTORY_WINDOW;
use crate::llm::{LlmSettings, Provider};

const DEFAULT_CONFIG_FILE: &str = "config/kickflip-chat";
const ENV_PREFIX: &str = "KICKFLIP";

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Completion service selection and sampling.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Per-provider credentials.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Conversation behaviour.
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Redis state store.
    #[serde(default)]
    pub redis: RedisConfig,
    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate configuration.
    ///
    /// `path` overrides the default config file location.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let config = Self::load_unchecked(path)?;
        ConfigValidator::validate(&config)
            .map_err(|e| anyhow::anyhow!("Configuration validation failed:\n\n{e}"))?;
        Ok(config)
    }

    /// Load configuration without validation.
    pub fn load_unchecked(path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .set_default("server.host", default_host())?
            .set_default("llm.model", default_model())?
            .set_default("conversation.offer_timing", OfferTiming::default().as_str())?
            .add_source(
                config::File::with_name(path.unwrap_or(DEFAULT_CONFIG_FILE))
                    .required(path.is_some()),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            app_config.providers.openai.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            app_config.providers.anthropic.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            app_config.providers.groq.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            app_config.redis.url = Some(url);
        }

        Ok(app_config)
    }

    /// Credentials for the selected provider.
    pub fn selected_provider(&self) -> &ProviderConfig {
        self.providers.get(self.llm.provider)
    }

    /// Build driver settings for the selected provider.
    ///
    /// Base URL precedence: `llm.base_url`, then the provider section, then
    /// the provider's public endpoint.
    pub fn create_llm_settings(&self) -> LlmSettings {
        let provider = self.selected_provider();
        let base_url = self
            .llm
            .base_url
            .clone()
            .or_else(|| provider.base_url.clone())
            .unwrap_or_else(|| self.llm.provider.default_base_url().to_string());

        LlmSettings {
            base_url,
            api_key: provider.api_key.clone(),
            model: self.llm.model.clone(),
            provider: self.llm.provider,
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
            timeout_secs: self.llm.timeout_secs,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_request_timeout(),
        }
    }
}

/// Completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which provider to call.
    #[serde(default)]
    pub provider: Provider,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL override for every provider.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Maximum tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature for handler replies.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP timeout per completion call, in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    LlmSettings::default().model
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Credentials per provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI.
    #[serde(default)]
    pub openai: ProviderConfig,
    /// Anthropic.
    #[serde(default)]
    pub anthropic: ProviderConfig,
    /// Groq.
    #[serde(default)]
    pub groq: ProviderConfig,
    /// Any other OpenAI-compatible endpoint.
    #[serde(default)]
    pub custom: ProviderConfig,
}

impl ProvidersConfig {
    /// Section for a provider.
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Groq => &self.groq,
            Provider::Custom => &self.custom,
        }
    }
}

/// One provider's credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key.
    pub api_key: Option<String>,
    /// Base URL override.
    pub base_url: Option<String>,
}

/// Conversation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// When product recommendations start.
    #[serde(default)]
    pub offer_timing: OfferTiming,
    /// History entries sent along with handler and recommendation prompts.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Store name used in the persona and welcome text.
    #[serde(default = "default_store_name")]
    pub store_name: String,
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

fn default_store_name() -> String {
    "Kickflip Studio".to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            offer_timing: OfferTiming::default(),
            history_window: default_history_window(),
            store_name: default_store_name(),
        }
    }
}

/// Redis state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Connection URL. Unset means the in-memory store.
    pub url: Option<String>,
    /// Expiry of idle conversations, in seconds.
    #[serde(default = "default_state_ttl")]
    pub ttl_secs: u64,
}

fn default_state_ttl() -> u64 {
    7 * 24 * 60 * 60
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            ttl_secs: default_state_ttl(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
