//! Conversation turn/part model and the message assembler.

use crate::chat::attachment::InlineMedia;
use crate::error::ChatError;

/// Instruction substituted when a request carries an image but no text.
/// Providers caption unreliably when a message has no textual anchor.
pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image.";

/// Who contributed a turn to the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// Smallest unit of message content: text or inline media.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    Text { content: String },
    InlineMedia(InlineMedia),
}

impl MessagePart {
    pub fn text(content: impl Into<String>) -> Self {
        MessagePart::Text {
            content: content.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { content } => Some(content),
            MessagePart::InlineMedia(_) => None,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, MessagePart::InlineMedia(_))
    }
}

/// One role-tagged contribution to the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl ConversationTurn {
    pub fn user(parts: Vec<MessagePart>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model_text(reply: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![MessagePart::text(reply)],
        }
    }
}

/// Assemble optional text and optional inline media into one ordered message.
///
/// Ordering is fixed: the text part always precedes the media part, matching
/// the provider expectation that instructions come before visual context.
/// Media-only input gets [`DEFAULT_IMAGE_PROMPT`] as its text anchor.
/// Blank or whitespace-only text counts as absent.
pub fn assemble(
    text: Option<&str>,
    media: Option<InlineMedia>,
) -> Result<Vec<MessagePart>, ChatError> {
    let text = text.map(str::trim).filter(|t| !t.is_empty());

    match (text, media) {
        (None, None) => Err(ChatError::EmptyMessage),
        (Some(t), None) => Ok(vec![MessagePart::text(t)]),
        (Some(t), Some(m)) => Ok(vec![MessagePart::text(t), MessagePart::InlineMedia(m)]),
        (None, Some(m)) => Ok(vec![
            MessagePart::text(DEFAULT_IMAGE_PROMPT),
            MessagePart::InlineMedia(m),
        ]),
    }
}
