//! Chat session: the single owner of conversation history.
//!
//! One session serves the whole process. It is created once at startup and
//! lives until exit; the server wraps it in `Arc<Mutex<_>>` so concurrent
//! requests serialize their sends instead of interleaving history appends.

use std::sync::Arc;

use tracing::debug;

use crate::chat::attachment::InlineMedia;
use crate::chat::message::{assemble, ConversationTurn, MessagePart};
use crate::error::ChatError;
use crate::provider::Provider;

/// Sampling settings forwarded to the provider on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 1.0,
            top_k: 1,
        }
    }
}

/// One inbound message: text, attachment, or both.
#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub text: Option<String>,
    pub attachment: Option<InlineMedia>,
}

impl SendRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachment: None,
        }
    }

    /// A request is empty when it has no attachment and no non-blank text.
    pub fn is_empty(&self) -> bool {
        self.attachment.is_none()
            && self
                .text
                .as_deref()
                .is_none_or(|t| t.trim().is_empty())
    }
}

/// Successful outcome of a send. The reply may be blank, never absent.
#[derive(Debug, Clone, PartialEq)]
pub struct SendResult {
    pub reply_text: String,
}

/// Conversation state plus the provider handle.
///
/// `send` is the only mutator of `history`. The session is not safe for
/// unserialized concurrent sends; callers must hold exclusive access for the
/// whole operation.
pub struct ChatSession {
    system_instruction: Vec<MessagePart>,
    history: Vec<ConversationTurn>,
    generation: GenerationConfig,
    provider: Arc<dyn Provider>,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn Provider>,
        system_instruction: impl Into<String>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            system_instruction: vec![MessagePart::text(system_instruction)],
            history: Vec::new(),
            generation,
            provider,
        }
    }

    /// Read-only view of the conversation so far.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Relay one message and record the exchange.
    ///
    /// On success history grows by two turns (user, then model). On provider
    /// failure only the user turn remains recorded: a model turn is appended
    /// only when a real reply exists.
    pub async fn send(&mut self, request: SendRequest) -> Result<SendResult, ChatError> {
        if request.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let parts = assemble(request.text.as_deref(), request.attachment)?;
        if parts.is_empty() {
            return Err(ChatError::Assembly(
                "assembled message has no parts".to_string(),
            ));
        }

        self.history.push(ConversationTurn::user(parts));

        debug!(
            provider = self.provider.name(),
            turns = self.history.len(),
            "dispatching send"
        );

        let reply = self
            .provider
            .generate(&self.system_instruction, &self.history, &self.generation)
            .await?;

        self.history.push(ConversationTurn::model_text(reply.clone()));

        Ok(SendResult { reply_text: reply })
    }
}
