//! Completion service abstractions.
//!
//! The conversation engine treats the language model as an opaque completion
//! service: it sends a short list of role-tagged messages, optionally asks for
//! a JSON object back, and receives generated text.
//!
//! # Drivers
//!
//! - [`providers::OpenAiDriver`]: OpenAI and compatible APIs (Groq, xAI, local gateways)
//! - [`providers::AnthropicDriver`]: Anthropic Claude API

pub mod providers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// LLM connection and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Base URL for the LLM API.
    pub base_url: String,
    /// API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Provider type.
    pub provider: Provider,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for sampling.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: Provider::OpenAi.default_base_url().to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            provider: Provider::OpenAi,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI and compatible APIs.
    #[default]
    OpenAi,
    /// Anthropic Claude.
    Anthropic,
    /// Groq.
    Groq,
    /// Custom/unknown OpenAI-compatible provider.
    Custom,
}

impl Provider {
    /// Get the default base URL for this provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Groq => "https://api.groq.com/openai",
            Self::Custom => "",
        }
    }

    /// Detect provider from base URL.
    pub fn from_base_url(url: &str) -> Self {
        if url.contains("openai.com") {
            Self::OpenAi
        } else if url.contains("anthropic.com") {
            Self::Anthropic
        } else if url.contains("groq.com") {
            Self::Groq
        } else {
            Self::Custom
        }
    }

    /// Display name used in startup logs.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Groq => "Groq",
            Self::Custom => "Custom",
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

impl MessageRole {
    /// Wire name shared by the OpenAI and Anthropic APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request to an LLM driver.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Ask the provider for a single JSON object.
    pub json_output: bool,
    /// Temperature (overrides settings).
    pub temperature: Option<f32>,
    /// Max tokens (overrides settings).
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Create a new plain-text request.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            json_output: false,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Create a request that expects a JSON object back.
    pub fn json(messages: Vec<Message>) -> Self {
        Self {
            json_output: true,
            ..Self::new(messages)
        }
    }

    /// Override the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Trait for completion drivers.
///
/// Implementations do not retry; transport errors are returned to the caller,
/// which decides whether to degrade.
#[async_trait]
pub trait LlmDriver: Send + Sync {
    /// Request a completion and return the generated text.
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<String>;

    /// Get the provider type.
    fn provider(&self) -> Provider;

    /// Get the current settings.
    fn settings(&self) -> &LlmSettings;
}

/// Pull the JSON object out of a model reply.
///
/// Models occasionally wrap JSON in Markdown fences or add a sentence before
/// it even in JSON mode.
pub fn extract_json(text: &str) -> anyhow::Result<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let start = trimmed
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("No JSON object in completion: {trimmed}"))?;
    let end = trimmed
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| anyhow::anyhow!("Unterminated JSON object in completion"))?;

    Ok(serde_json::from_str(&trimmed[start..=end])?)
}
