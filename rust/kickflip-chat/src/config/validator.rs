//! Startup validation.
//!
//! Every rule runs and all failures are reported together, so an operator can
//! fix the whole configuration in one pass.

use super::error::{ConfigResult, ConfigurationError};
use super::AppConfig;
use crate::llm::Provider;

/// Checks a loaded [`AppConfig`] before the server starts.
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the whole configuration.
    pub fn validate(config: &AppConfig) -> ConfigResult<()> {
        let checks = [
            Self::validate_timeouts(config),
            Self::validate_conversation(config),
            Self::validate_llm_credentials(config),
        ];

        let mut errors = Vec::new();
        for check in checks {
            match check {
                Ok(()) => {}
                Err(ConfigurationError::Multiple(errs)) => errors.extend(errs),
                Err(e) => errors.push(e),
            }
        }

        ConfigurationError::from_errors(errors).map_or(Ok(()), Err)
    }

    /// Reject zero timeouts; they would fail every request.
    pub fn validate_timeouts(config: &AppConfig) -> ConfigResult<()> {
        let mut errors = Vec::new();
        if config.llm.timeout_secs == 0 {
            errors.push(ConfigurationError::invalid(
                "llm.timeout_secs is 0",
                "Set KICKFLIP__LLM__TIMEOUT_SECS to a positive number of seconds (default 30)",
            ));
        }
        if config.server.timeout_secs == 0 {
            errors.push(ConfigurationError::invalid(
                "server.timeout_secs is 0",
                "Set KICKFLIP__SERVER__TIMEOUT_SECS to a positive number of seconds (default 60)",
            ));
        }
        ConfigurationError::from_errors(errors).map_or(Ok(()), Err)
    }

    /// Conversation settings.
    pub fn validate_conversation(config: &AppConfig) -> ConfigResult<()> {
        if config.conversation.history_window == 0 {
            return Err(ConfigurationError::invalid(
                "conversation.history_window must be at least 1",
                "Set KICKFLIP__CONVERSATION__HISTORY_WINDOW=5",
            ));
        }
        Ok(())
    }

    /// The selected provider needs a key, except custom gateways.
    pub fn validate_llm_credentials(config: &AppConfig) -> ConfigResult<()> {
        let provider = config.llm.provider;
        let has_key = config
            .selected_provider()
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());

        let env_var = match provider {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
            Provider::Custom => return Self::validate_custom_endpoint(config),
        };

        if has_key {
            Ok(())
        } else {
            Err(ConfigurationError::missing_required(
                format!("providers.{}.api_key", provider_section(provider)),
                format!("{} completion service", provider.display_name()),
                env_var,
            ))
        }
    }

    fn validate_custom_endpoint(config: &AppConfig) -> ConfigResult<()> {
        let has_url = config.llm.base_url.is_some() || config.providers.custom.base_url.is_some();
        if has_url {
            Ok(())
        } else {
            Err(ConfigurationError::missing_required(
                "llm.base_url",
                "Custom OpenAI-compatible completion service",
                "KICKFLIP__LLM__BASE_URL",
            ))
        }
    }
}

fn provider_section(provider: Provider) -> &'static str {
    match provider {
        Provider::OpenAi => "openai",
        Provider::Anthropic => "anthropic",
        Provider::Groq => "groq",
        Provider::Custom => "custom",
    }
}
