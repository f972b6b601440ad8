//! Request handlers for the chat API.
//!
//! Both endpoints speak JSON with a single `reply` or `error` field.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use super::AppState;
use crate::chat::attachment::InlineMedia;
use crate::chat::session::SendRequest;
use crate::error::ChatError;

/// Degraded reply for image requests where the provider produced no text.
/// Returned with a 200, not an error status.
const BLANK_REPLY_FALLBACK: &str =
    "Sorry, I couldn't come up with anything for that image. Try asking again 🙏";

type ApiResult = (StatusCode, Json<Value>);

fn reply_json(reply: &str) -> ApiResult {
    (StatusCode::OK, Json(json!({ "reply": reply })))
}

fn error_json(status: StatusCode, message: impl Into<String>) -> ApiResult {
    (status, Json(json!({ "error": message.into() })))
}

fn send_error(err: ChatError) -> ApiResult {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        error!(%err, "chat send failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    error_json(status, err.to_string())
}

#[derive(Debug, Deserialize)]
pub struct ChatTextRequest {
    #[serde(default)]
    message: Option<String>,
}

/// POST /api/chat - text-only chat
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatTextRequest>,
) -> ApiResult {
    let request = SendRequest {
        text: body.message,
        attachment: None,
    };

    let mut session = state.session.lock().await;
    match session.send(request).await {
        Ok(result) => reply_json(&result.reply_text),
        Err(err) => send_error(err),
    }
}

/// POST /api/chat-image - multipart chat with optional `message` text field
/// and optional `image` file field
pub async fn chat_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult {
    let mut message: Option<String> = None;
    let mut attachment: Option<InlineMedia> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(%err, "malformed multipart body");
                return error_json(StatusCode::BAD_REQUEST, err.to_string());
            }
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("message") => match field.text().await {
                Ok(text) => message = Some(text),
                Err(err) => return error_json(StatusCode::BAD_REQUEST, err.to_string()),
            },
            Some("image") => {
                let file_name = field.file_name().map(str::to_owned);
                let declared_mime = field.content_type().map(str::to_owned);

                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => return error_json(StatusCode::BAD_REQUEST, err.to_string()),
                };

                // Fire-and-forget disk storage, then normalize from disk.
                let stored = match state.uploads.persist(file_name.as_deref(), &bytes).await {
                    Ok(path) => path,
                    Err(err) => {
                        error!(%err, "failed to store upload");
                        return error_json(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
                    }
                };

                match InlineMedia::from_stored(&stored, declared_mime.as_deref()).await {
                    Ok(media) => attachment = Some(media),
                    Err(err) => {
                        error!(%err, "failed to normalize stored upload");
                        return error_json(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
                    }
                }
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    let request = SendRequest { text: message, attachment };
    if request.is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "message or image required");
    }

    let mut session = state.session.lock().await;
    match session.send(request).await {
        Ok(result) if result.reply_text.trim().is_empty() => {
            warn!("provider returned a blank reply, serving fallback");
            reply_json(BLANK_REPLY_FALLBACK)
        }
        Ok(result) => reply_json(&result.reply_text),
        Err(err) => send_error(err),
    }
}
