//! Message dispatcher - routes inbound text through middleware to the
//! conversation engine.

use std::sync::Arc;

use crate::application::errors::BotError;
use crate::application::services::{ConversationEngine, Reply};
use crate::domain::entities::User;
use crate::domain::traits::Store;

use super::middleware::{Context, Middleware, MiddlewareChain, MiddlewareError, Next};
use super::parser::MessageParser;

/// One entry point per inbound `(chat_id, text)` event: parse, run the
/// middleware chain, hand the message to the conversation engine.
pub struct MessageDispatcher<S: Store> {
    parser: MessageParser,
    middleware: Vec<Arc<dyn Middleware>>,
    engine: ConversationEngine<S>,
}

impl<S: Store> MessageDispatcher<S> {
    pub fn new(prefix: impl Into<String>, engine: ConversationEngine<S>) -> Self {
        Self {
            parser: MessageParser::new(prefix),
            middleware: Vec::new(),
            engine,
        }
    }

    /// Replace the middleware with a prebuilt chain.
    pub fn with_chain(mut self, chain: MiddlewareChain) -> Self {
        self.middleware = chain.build();
        self
    }

    /// Stamp parsed messages with the adapter they arrive through.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.parser = self.parser.with_platform(platform);
        self
    }

    pub fn engine(&self) -> &ConversationEngine<S> {
        &self.engine
    }

    /// Process one raw inbound message and produce the reply.
    pub async fn process(
        &self,
        chat_id: impl Into<String>,
        text: impl Into<String>,
        sender: Option<User>,
    ) -> Result<Reply, BotError> {
        let message = self.parser.parse(chat_id, text, sender);
        let ctx = Context::new(message);

        let ctx = match Next::new(self.middleware.clone()).run(ctx) {
            Ok(ctx) => ctx,
            Err(MiddlewareError::RateLimited { .. }) => {
                return Ok(Reply::text("Rate limited. Please try again later."));
            }
            Err(MiddlewareError::Internal(msg)) => return Err(BotError::Internal(msg)),
        };

        self.engine.handle(&ctx.message).await
    }
}
