//! HTTP layer: routes, shared state, and upload storage.
//!
//! Thin plumbing around the chat core:
//! - POST /api/chat - text-only chat (JSON)
//! - POST /api/chat-image - multipart chat with an optional image
//! - static frontend served from `public/`

pub mod handlers;
pub mod upload;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::post,
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::chat::attachment::MAX_ATTACHMENT_BYTES;
use crate::chat::session::ChatSession;
use upload::UploadStore;

/// Headroom for multipart boundaries and the text field on top of the
/// attachment cap.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state: one chat session for the whole process.
///
/// The mutex serializes sends; two concurrent requests can otherwise
/// interleave their history appends and corrupt turn ordering.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<ChatSession>>,
    pub uploads: Arc<UploadStore>,
}

impl AppState {
    pub fn new(session: ChatSession, uploads: UploadStore) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            uploads: Arc::new(uploads),
        }
    }
}

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat-image", post(handlers::chat_image))
        .fallback_service(ServeDir::new("public"))
        .layer(DefaultBodyLimit::max(
            MAX_ATTACHMENT_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
