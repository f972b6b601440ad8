//! Chat module - session orchestration and the multimodal message pipeline
//!
//! This is the only part of the server with real state and sequencing:
//! - `attachment` normalizes stored uploads into provider-neutral inline media
//! - `message` holds the turn/part model and the message assembler
//! - `session` owns conversation history and dispatches to the provider

pub mod attachment;
pub mod message;
pub mod session;

// Re-export key types for external use
pub use attachment::InlineMedia;
pub use message::{ConversationTurn, MessagePart, Role, assemble, DEFAULT_IMAGE_PROMPT};
pub use session::{ChatSession, GenerationConfig, SendRequest, SendResult};
