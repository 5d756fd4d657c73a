//! kickflip-chat: conversational state and intent dispatch for the Kickflip
//! Studio storefront assistant.
//!
//! Each inbound shopper message is classified into an [`Intent`], recorded in
//! the conversation's [`ConversationState`], answered by the handler for that
//! intent, and, once the conversation has warmed up, paired with product
//! recommendations.
//!
//! # Architecture
//!
//! - [`conversation`]: engine, classifier, handlers, policy, state store
//! - [`llm`]: completion service trait and OpenAI / Anthropic drivers
//! - [`config`]: layered configuration and startup validation
//! - [`api`]: HTTP endpoints
//! - [`server`]: router assembly and middleware
//!
//! # Example
//!
//! ```rust,ignore
//! use kickflip_chat::{config::AppConfig, server::create_app};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let app = create_app(config).await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! [`Intent`]: conversation::Intent
//! [`ConversationState`]: conversation::ConversationState

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod logging;
pub mod server;

use std::sync::Arc;

use config::AppConfig;
use conversation::ConversationEngine;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Conversation engine.
    pub engine: Arc<ConversationEngine>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"AppConfig")
            .field("engine", &self.engine)
            .finish()
    }
}
