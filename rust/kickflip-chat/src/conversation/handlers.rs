//! Intent dispatch table.
//!
//! Every [`Intent`] maps to exactly one handler through an exhaustive `match`,
//! so adding an intent fails to compile until it has a handler and a prompt.

use async_trait::async_trait;

use super::intent::Intent;
use super::prompts;
use super::response::TurnResponse;
use super::state::ConversationState;
use crate::llm::{LlmDriver, LlmRequest, Message, MessageRole};

/// Everything a handler may look at while producing a reply.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    /// The raw user message for this turn.
    pub message: &'a str,
    /// State after this turn's update.
    pub state: &'a ConversationState,
    /// Completion service.
    pub driver: &'a dyn LlmDriver,
    /// Store name used in prompts.
    pub store_name: &'a str,
    /// History entries to include as context.
    pub history_window: usize,
}

impl std::fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("message", &self.message)
            .field("store_name", &self.store_name)
            .field("history_window", &self.history_window)
            .finish_non_exhaustive()
    }
}

/// Produces the reply for one intent.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// The intent this handler serves.
    fn intent(&self) -> Intent;

    /// Produce a reply. Errors are turned into an apology by the engine.
    async fn handle(&self, ctx: HandlerContext<'_>) -> anyhow::Result<TurnResponse>;
}

/// Look up the handler for an intent.
pub fn handler_for(intent: Intent) -> &'static dyn IntentHandler {
    match intent {
        Intent::Greeting => &GREETING_HANDLER,
        Intent::ProductInquiry => &PRODUCT_INQUIRY_HANDLER,
        Intent::PriceInquiry => &PRICE_INQUIRY_HANDLER,
        Intent::ShippingInquiry => &SHIPPING_INQUIRY_HANDLER,
        Intent::ReturnPolicy => &RETURN_POLICY_HANDLER,
        Intent::CheckoutHelp => &CHECKOUT_HELP_HANDLER,
        Intent::Objection => &OBJECTION_HANDLER,
        Intent::Complaint => &COMPLAINT_HANDLER,
        Intent::GeneralQuestion => &GENERAL_QUESTION_HANDLER,
    }
}

/// Greets with a fixed welcome text; no model call.
#[derive(Debug)]
pub struct GreetingHandler;

#[async_trait]
impl IntentHandler for GreetingHandler {
    fn intent(&self) -> Intent {
        Intent::Greeting
    }

    async fn handle(&self, ctx: HandlerContext<'_>) -> anyhow::Result<TurnResponse> {
        Ok(TurnResponse::text(prompts::with_store(
            prompts::WELCOME,
            ctx.store_name,
        )))
    }
}

/// Answers through the completion service with intent-specific instructions.
#[derive(Debug)]
pub struct PromptedHandler {
    intent: Intent,
    instructions: &'static str,
}

impl PromptedHandler {
    /// Build the message list: persona and instructions, then recent history
    /// ending with the current user message.
    fn build_messages(&self, ctx: &HandlerContext<'_>) -> Vec<Message> {
        let system = format!(
            "{}\n\n{}",
            prompts::with_store(prompts::ASSISTANT_PERSONA, ctx.store_name),
            self.instructions
        );

        let mut messages = vec![Message::system(system)];
        messages.extend(
            ctx.state
                .recent_history(ctx.history_window)
                .iter()
                .map(Message::from),
        );

        let ends_with_message = messages
            .last()
            .is_some_and(|last| last.role == MessageRole::User && last.content == ctx.message);
        if !ends_with_message {
            messages.push(Message::user(ctx.message));
        }
        messages
    }
}

#[async_trait]
impl IntentHandler for PromptedHandler {
    fn intent(&self) -> Intent {
        self.intent
    }

    async fn handle(&self, ctx: HandlerContext<'_>) -> anyhow::Result<TurnResponse> {
        let reply = ctx
            .driver
            .complete(LlmRequest::new(self.build_messages(&ctx)))
            .await?;

        let reply = reply.trim();
        if reply.is_empty() {
            anyhow::bail!("Empty reply for intent {}", self.intent);
        }
        Ok(TurnResponse::text(reply))
    }
}

static GREETING_HANDLER: GreetingHandler = GreetingHandler;

static PRODUCT_INQUIRY_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::ProductInquiry,
    instructions: prompts::PRODUCT_INQUIRY,
};

static PRICE_INQUIRY_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::PriceInquiry,
    instructions: prompts::PRICE_INQUIRY,
};

static SHIPPING_INQUIRY_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::ShippingInquiry,
    instructions: prompts::SHIPPING_INQUIRY,
};

static RETURN_POLICY_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::ReturnPolicy,
    instructions: prompts::RETURN_POLICY,
};

static CHECKOUT_HELP_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::CheckoutHelp,
    instructions: prompts::CHECKOUT_HELP,
};

static OBJECTION_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::Objection,
    instructions: prompts::OBJECTION,
};

static COMPLAINT_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::Complaint,
    instructions: prompts::COMPLAINT,
};

static GENERAL_QUESTION_HANDLER: PromptedHandler = PromptedHandler {
    intent: Intent::GeneralQuestion,
    instructions: prompts::GENERAL_QUESTION,
};
