//! OpenAI and OpenAI-compatible provider driver.
//!
//! This driver supports OpenAI, Groq, and any OpenAI-compatible API.

use crate::llm::{LlmDriver, LlmRequest, LlmSettings, Message, Provider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// OpenAI-compatible API driver.
#[derive(Debug, Clone)]
pub struct OpenAiDriver {
    settings: LlmSettings,
    client: Client,
}

impl OpenAiDriver {
    /// Create a new OpenAI driver.
    pub fn new(settings: LlmSettings) -> anyhow::Result<Self> {
        let client = super::http_client(&settings)?;
        Ok(Self { settings, client })
    }

    /// Build the API URL.
    fn api_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Convert messages to OpenAI format.
    fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect()
    }

    /// Build the request body.
    fn request_body(&self, req: &LlmRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "messages": Self::convert_messages(&req.messages),
            "temperature": req.temperature.unwrap_or(self.settings.temperature),
            "max_tokens": req.max_tokens.unwrap_or(self.settings.max_tokens),
        });

        if req.json_output {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }
}

#[async_trait]
impl LlmDriver for OpenAiDriver {
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<String> {
        let body = self.request_body(&req);

        let mut request = self.client.post(self.api_url()).json(&body);

        // Add authorization header
        if let Some(ref api_key) = self.settings.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({status}): {text}");
        }

        let completion: OpenAiCompletion = response.json().await?;
        if let Some(usage) = completion.usage {
            tracing::debug!(
                provider = "openai",
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("OpenAI API returned no content"))
    }

    fn provider(&self) -> Provider {
        self.settings.provider
    }

    fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

/// OpenAI chat completion response.
#[derive(Debug, Deserialize)]
struct OpenAiCompletion {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
