//! Provider abstraction for language-model backends.
//!
//! A provider keeps no state of its own between calls; the chat session
//! supplies the system instruction and the full history every time. This is
//! the seam that lets a different backend replace Gemini without touching
//! session logic.

pub mod gemini;

pub use gemini::GeminiProvider;

use async_trait::async_trait;

use crate::chat::message::{ConversationTurn, MessagePart};
use crate::chat::session::GenerationConfig;
use crate::error::ProviderError;

/// Unified provider interface for multimodal chat backends.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Generate a reply for the conversation. `history` already contains the
    /// user turn being answered. The reply may be empty, never absent.
    async fn generate(
        &self,
        system: &[MessagePart],
        history: &[ConversationTurn],
        config: &GenerationConfig,
    ) -> Result<String, ProviderError>;
}
