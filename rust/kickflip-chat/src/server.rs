//! HTTP server setup and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::{AppConfig, ConfigurationError, RedisConfig};
use crate::conversation::engine::ConversationEngine;
use crate::conversation::store::{InMemoryStateStore, RedisStateStore, StateStore};
use crate::llm::providers::create_driver;
use crate::llm::LlmDriver;
use crate::logging::OpTimer;
use crate::{log_banner, log_init_step, log_init_warning, log_success, AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const INIT_STEPS: u32 = 4;

/// Create the application with the driver selected by configuration.
pub async fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let settings = config.create_llm_settings();
    let driver = create_driver(settings)?;
    create_app_with_driver(config, driver).await
}

/// Create the application around an existing completion driver.
pub async fn create_app_with_driver(
    config: AppConfig,
    driver: Arc<dyn LlmDriver>,
) -> anyhow::Result<Router> {
    let overall_timer = OpTimer::new("server", "create_app");

    log_banner!(
        format!("🛹 kickflip-chat v{VERSION}"),
        format!(
            "Store: {} | Offer timing: {}",
            config.conversation.store_name, config.conversation.offer_timing
        )
    );

    // [1/4] Completion service
    let settings = driver.settings();
    log_init_step!(
        1,
        INIT_STEPS,
        "Completion service",
        format!(
            "⚙️ {} ({}) {}",
            driver.provider().display_name(),
            settings.model,
            if settings.api_key.is_some() { "✓" } else { "✗ No API key" }
        )
    );

    // [2/4] State store
    let step_timer = OpTimer::new("server", "state_store");
    let store = create_state_store(&config.redis).await;
    log_init_step!(2, INIT_STEPS, "State store", format!("💾 {}", store.backend()));
    step_timer.finish();

    // [3/4] Conversation engine
    let engine = Arc::new(ConversationEngine::new(
        driver,
        store,
        config.conversation.clone(),
    ));
    log_init_step!(
        3,
        INIT_STEPS,
        "Conversation engine",
        format!("💬 history window {}", config.conversation.history_window)
    );

    let state = AppState {
        config: Arc::new(config),
        engine,
    };

    // [4/4] Router and middleware
    let app = api::create_router()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.server.timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    log_init_step!(4, INIT_STEPS, "Router", "🌐 Routes + middleware configured");

    overall_timer.finish();
    log_success!("kickflip-chat server created");

    Ok(app)
}

/// Redis when configured and reachable, otherwise in-memory.
async fn create_state_store(config: &RedisConfig) -> Arc<dyn StateStore> {
    let Some(url) = config.url.as_deref() else {
        return Arc::new(InMemoryStateStore::new());
    };

    match RedisStateStore::connect(url, config.ttl_secs).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            let err = ConfigurationError::connection_failed(
                "Redis",
                url,
                e.to_string(),
                "Is Redis running and is REDIS_URL correct? Falling back to in-memory state.",
            );
            log_init_warning!("{err}");
            Arc::new(InMemoryStateStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_without_redis_url() {
        let store = create_state_store(&RedisConfig::default()).await;
        assert_eq!(store.backend(), "memory");
    }
}
