#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kickflip_chat::config::AppConfig;
use kickflip_chat::conversation::prompts;
use kickflip_chat::llm::{LlmDriver, LlmRequest, LlmSettings, Provider};
use kickflip_chat::server::create_app_with_driver;
use parking_lot::Mutex;
use tokio::net::TcpListener;

/// Which step of a turn a completion request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Classify,
    Reply,
    Recommend,
}

/// Completion service that answers from a script instead of the network.
///
/// Messages without a scripted intent make the classifier call fail.
#[derive(Debug)]
pub struct ScriptedDriver {
    settings: LlmSettings,
    intents: HashMap<String, &'static str>,
    reply: String,
    recommendations: Option<serde_json::Value>,
    reply_failures: AtomicUsize,
    latency: Duration,
    calls: Mutex<Vec<(Call, String)>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            settings: LlmSettings {
                provider: Provider::Custom,
                base_url: "http://scripted.test".to_string(),
                ..LlmSettings::default()
            },
            intents: HashMap::new(),
            reply: "Happy to help with that!".to_string(),
            recommendations: Some(serde_json::json!({
                "recommendations": [{
                    "id": "deck-825",
                    "name": "Street Deck 8.25",
                    "description": "Seven-ply maple popsicle deck",
                    "price": 59.0
                }]
            })),
            reply_failures: AtomicUsize::new(0),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn intent(mut self, message: &str, label: &'static str) -> Self {
        self.intents.insert(message.to_string(), label);
        self
    }

    #[must_use]
    pub fn reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    /// Make the recommendation call fail.
    #[must_use]
    pub fn without_recommendations(mut self) -> Self {
        self.recommendations = None;
        self
    }

    /// Fail the next `count` handler replies.
    #[must_use]
    pub fn failing_replies(self, count: usize) -> Self {
        self.reply_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Delay every completion, as a network round-trip would.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<(Call, String)> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.lock().iter().filter(|(c, _)| *c == call).count()
    }
}

#[async_trait]
impl LlmDriver for ScriptedDriver {
    async fn complete(&self, req: LlmRequest) -> anyhow::Result<String> {
        let system = req.messages.first().map(|m| m.content.as_str()).unwrap_or_default();
        let last = req.messages.last().map(|m| m.content.clone()).unwrap_or_default();

        let call = if system == prompts::INTENT_CLASSIFIER {
            Call::Classify
        } else if system == prompts::PRODUCT_RECOMMENDER {
            Call::Recommend
        } else {
            Call::Reply
        };
        self.calls.lock().push((call, last.clone()));

        tokio::task::yield_now().await;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match call {
            Call::Classify => match self.intents.get(&last) {
                Some(label) => Ok(format!(r#"{{"intent": "{label}", "confidence": 0.9}}"#)),
                None => anyhow::bail!("error sending request: connection refused"),
            },
            Call::Recommend => match &self.recommendations {
                Some(body) => Ok(format!("```json\n{body}\n```")),
                None => anyhow::bail!("OpenAI API error (503): upstream unavailable"),
            },
            Call::Reply => {
                let failed = self
                    .reply_failures
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
                if failed {
                    anyhow::bail!("error sending request: operation timed out");
                }
                Ok(self.reply.clone())
            }
        }
    }

    fn provider(&self) -> Provider {
        Provider::Custom
    }

    fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

/// Serve the app on an ephemeral port and return its base URL.
pub async fn spawn_app(
    config: AppConfig,
    driver: Arc<ScriptedDriver>,
) -> (String, tokio::task::JoinHandle<()>) {
    let app = create_app_with_driver(config, driver)
        .await
        .expect("Failed to create app");

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    (format!("http://127.0.0.1:{port}"), handle)
}
