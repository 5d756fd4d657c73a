//! Configuration errors that tell the operator how to fix them.

use std::fmt;

/// Configuration errors with actionable messages.
#[derive(Debug, Clone)]
pub enum ConfigurationError {
    /// A value is out of range or malformed.
    Invalid {
        /// What is wrong.
        message: String,
        /// How to fix it.
        fix_hint: String,
    },
    /// A setting the selected configuration needs is not set.
    MissingRequired {
        /// The missing setting.
        setting: String,
        /// What needs it.
        context: String,
        /// Environment variable that sets it.
        env_var: String,
    },
    /// A backing service could not be reached.
    ConnectionFailed {
        /// Service name.
        service: String,
        /// Endpoint that was tried.
        endpoint: String,
        /// Underlying error.
        error: String,
        /// What to check.
        troubleshooting: String,
    },
    /// Several problems at once.
    Multiple(Vec<ConfigurationError>),
}

impl std::error::Error for ConfigurationError {}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { message, fix_hint } => {
                write!(f, "Invalid configuration: {message}\n\nHow to fix: {fix_hint}")
            }
            Self::MissingRequired {
                setting,
                context,
                env_var,
            } => write!(
                f,
                "Missing required configuration: {setting}\n\n\
                Required for: {context}\n\
                Set via: {env_var}"
            ),
            Self::ConnectionFailed {
                service,
                endpoint,
                error,
                troubleshooting,
            } => write!(
                f,
                "Connection failed: {service}\n\n\
                Endpoint: {endpoint}\n\
                Error: {error}\n\n\
                Check: {troubleshooting}"
            ),
            Self::Multiple(errors) => {
                writeln!(f, "Multiple configuration errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "\n{}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl ConfigurationError {
    /// Invalid value.
    #[must_use]
    pub fn invalid(message: impl Into<String>, fix_hint: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            fix_hint: fix_hint.into(),
        }
    }

    /// Missing setting.
    #[must_use]
    pub fn missing_required(
        setting: impl Into<String>,
        context: impl Into<String>,
        env_var: impl Into<String>,
    ) -> Self {
        Self::MissingRequired {
            setting: setting.into(),
            context: context.into(),
            env_var: env_var.into(),
        }
    }

    /// Unreachable service.
    #[must_use]
    pub fn connection_failed(
        service: impl Into<String>,
        endpoint: impl Into<String>,
        error: impl Into<String>,
        troubleshooting: impl Into<String>,
    ) -> Self {
        Self::ConnectionFailed {
            service: service.into(),
            endpoint: endpoint.into(),
            error: error.into(),
            troubleshooting: troubleshooting.into(),
        }
    }

    /// Collapse a list of errors. A single error is returned unwrapped.
    pub fn from_errors(mut errors: Vec<ConfigurationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

/// Result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_shows_fix_hint() {
        let err = ConfigurationError::invalid(
            "conversation.history_window must be at least 1",
            "Set KICKFLIP__CONVERSATION__HISTORY_WINDOW=5",
        );
        let text = err.to_string();
        assert!(text.contains("history_window must be at least 1"));
        assert!(text.contains("How to fix: Set KICKFLIP__CONVERSATION__HISTORY_WINDOW=5"));
    }

    #[test]
    fn test_missing_required_names_env_var() {
        let err = ConfigurationError::missing_required(
            "providers.openai.api_key",
            "OpenAI completion service",
            "OPENAI_API_KEY",
        );
        assert!(err.to_string().contains("Set via: OPENAI_API_KEY"));
    }

    #[test]
    fn test_from_errors() {
        assert!(ConfigurationError::from_errors(vec![]).is_none());

        let single = ConfigurationError::from_errors(vec![ConfigurationError::invalid("a", "b")]);
        assert!(matches!(single, Some(ConfigurationError::Invalid { .. })));

        let multiple = ConfigurationError::from_errors(vec![
            ConfigurationError::invalid("llm.timeout_secs is 0", "raise it"),
            ConfigurationError::invalid("server.timeout_secs is 0", "raise it"),
        ])
        .map(|e| e.to_string())
        .unwrap_or_default();
        assert!(multiple.starts_with("Multiple configuration errors:"));
        assert!(multiple.contains("1. Invalid configuration: llm.timeout_secs is 0"));
        assert!(multiple.contains("2. Invalid configuration: server.timeout_secs is 0"));
    }

    #[test]
    fn test_connection_failed_display() {
        let err = ConfigurationError::connection_failed(
            "Redis",
            "redis://localhost:6379",
            "connection refused",
            "Is redis-server running?",
        );
        let text = err.to_string();
        assert!(text.starts_with("Connection failed: Redis"));
        assert!(text.contains("Endpoint: redis://localhost:6379"));
    }
}
