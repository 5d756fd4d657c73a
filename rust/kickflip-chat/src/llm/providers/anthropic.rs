//! Anthropic Claude API driver.

use crate::llm::{LlmDriver, LlmRequest, LlmSettings, Message, MessageRole, Provider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Appended to the system prompt in place of a native JSON mode.
const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single valid JSON object and nothing else. Do not wrap it in Markdown.";

/// Anthropic Claude API driver.
#[derive(Debug, Clone)]
pub struct AnthropicDriver {
    settings: LlmSettings,
    client: Client,
}

impl AnthropicDriver {
    /// Create a new Anthropic driver.
    pub fn new(settings: LlmSettings) -> anyhow::Result<Self> {
        let client = super::http_client(&settings)?;
        Ok(Self { settings, client })
    }

    /// Build the API URL.
    fn api_url(&self) -> String {
        format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'))
    }

    /// Convert messages to Anthropic format.
    ///
    /// System messages are lifted out into the top-level `system` field.
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<serde_json::Value>) {
        let mut system_parts = Vec::new();
        let mut converted = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => system_parts.push(msg.content.clone()),
                MessageRole::User | MessageRole::Assistant => {
                    converted.push(serde_json::json!({
                        "role": msg.role.as_str(),
                        "content": msg.content,
                    }));
                }
            }
        }

        let system_prompt = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        (system_prompt, converted)
    }

    /// Build the request body.
    fn request_body(&self, req: &LlmRequest) -> serde_json::Value {
        let (system_prompt, messages) = Self::convert_messages(&req.messages);

        let system_prompt = if req.json_output {
            Some(match system_prompt {
                Some(system) => format!("{system}\n\n{JSON_ONLY_INSTRUCTION}"),
                None => JSON_ONLY_INSTRUCTION.to_string(),
            })
        } else {
            system_prompt
        };

        let mut body = serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
            "max_tokens": req.max_tokens.unwrap_or(self.settings.max_tokens),
            "temperature": req.temperature.unwrap_or(self.settings.temperature),
        });

        if let Some(system) = system_prompt {
            body["system"] = serde_json::Value::String(system);
        }

        body
    }
}

#[async_trait]
impl LlmDriver for AnthropicDriver {
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<String> {
        let api_key = self
            .settings
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Anthropic API key required"))?;

        let response = self
            .client
            .post(self.api_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(&req))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error ({status}): {text}");
        }

        let completion: AnthropicResponse = response.json().await?;
        if let Some(usage) = completion.usage {
            tracing::debug!(
                provider = "anthropic",
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Completion usage"
            );
        }

        let text: String = completion
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContent::Text { text } => Some(text),
                AnthropicContent::Other => None,
            })
            .collect();

        if text.is_empty() {
            anyhow::bail!("Anthropic API returned no text content");
        }
        Ok(text)
    }

    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

/// Anthropic messages response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
