//! LLM provider implementations.

mod anthropic;
mod openai;

pub use anthropic::AnthropicDriver;
pub use openai::OpenAiDriver;

use super::{LlmDriver, LlmSettings, Provider};
use std::sync::Arc;

/// Create a driver for the given settings.
pub fn create_driver(settings: LlmSettings) -> anyhow::Result<Arc<dyn LlmDriver>> {
    let driver: Arc<dyn LlmDriver> = match settings.provider {
        Provider::OpenAi | Provider::Groq | Provider::Custom => {
            Arc::new(OpenAiDriver::new(settings)?)
        }
        Provider::Anthropic => Arc::new(AnthropicDriver::new(settings)?),
    };
    Ok(driver)
}

/// Build the shared HTTP client with the configured timeout.
fn http_client(settings: &LlmSettings) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(settings.timeout_secs))
        .build()?;
    Ok(client)
}
