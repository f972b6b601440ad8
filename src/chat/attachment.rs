//! Attachment normalization: stored uploads become inline media descriptors.

use std::path::Path;

use crate::error::ChatError;

/// Maximum accepted attachment size. Enforced by the upload store before
/// bytes ever reach the session.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Binary content embedded directly in a message rather than referenced by
/// URL. Bytes are the exact file content, no transcoding.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl InlineMedia {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Normalize a stored upload. The declared content type wins; when the
    /// client sent none, guess from the file extension.
    pub async fn from_stored(
        path: &Path,
        declared_mime: Option<&str>,
    ) -> Result<Self, ChatError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(ChatError::AttachmentRead)?;

        let mime_type = match declared_mime {
            Some(m) if !m.trim().is_empty() => m.trim().to_string(),
            _ => mime_guess::from_path(path)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string(),
        };

        Ok(Self { bytes, mime_type })
    }
}
