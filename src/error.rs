// src/error.rs
// Error taxonomy for the chat pipeline. The HTTP layer maps EmptyMessage to a
// client error and everything else to a pipeline failure.

use thiserror::Error;

/// Errors surfaced by the chat session and its collaborators.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Request carried neither text nor an attachment.
    #[error("message must contain text or an attachment")]
    EmptyMessage,

    /// A stored upload could not be read back. Fatal to the request only.
    #[error("failed to read stored attachment: {0}")]
    AttachmentRead(#[source] std::io::Error),

    /// The provider call failed; history keeps the user turn, no model turn.
    #[error("provider call failed: {0}")]
    Provider(#[from] ProviderError),

    /// Assembler invariant violated. A programming error, not user input.
    #[error("message assembly invariant violated: {0}")]
    Assembly(String),
}

/// Failure modes of a provider backend. None are retried by the core.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("provider unreachable: {0}")]
    Unavailable(#[source] reqwest::Error),
}

impl ChatError {
    /// True for errors caused by bad caller input rather than the pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ChatError::EmptyMessage)
    }
}
