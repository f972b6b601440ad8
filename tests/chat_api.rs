// tests/chat_api.rs
// In-process tests for the chat API routes, driving the router with a
// recording stub provider instead of a live backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use chatrelay::chat::attachment::MAX_ATTACHMENT_BYTES;
use chatrelay::chat::message::{ConversationTurn, MessagePart, Role, DEFAULT_IMAGE_PROMPT};
use chatrelay::chat::session::{ChatSession, GenerationConfig};
use chatrelay::error::ProviderError;
use chatrelay::provider::Provider;
use chatrelay::server::{create_router, upload::UploadStore, AppState};

// ============================================================================
// Test fixtures
// ============================================================================

/// Stub provider: fixed reply or fixed rejection, records history snapshots.
struct StubProvider {
    reply: Option<String>,
    seen: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl StubProvider {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn last_seen(&self) -> Vec<ConversationTurn> {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn generate(
        &self,
        _system: &[MessagePart],
        history: &[ConversationTurn],
        _config: &GenerationConfig,
    ) -> Result<String, ProviderError> {
        self.seen.lock().unwrap().push(history.to_vec());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(ProviderError::Rejected {
                status: 429,
                message: "quota exceeded".to_string(),
            }),
        }
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    // Keeps the uploads dir alive for the test's duration
    _uploads_dir: TempDir,
}

async fn test_app(provider: Arc<StubProvider>) -> TestApp {
    let uploads_dir = tempfile::tempdir().unwrap();
    let uploads = UploadStore::new(uploads_dir.path(), MAX_ATTACHMENT_BYTES)
        .await
        .unwrap();
    let session = ChatSession::new(provider, "you are a test bot", GenerationConfig::default());

    let state = AppState::new(session, uploads);
    TestApp {
        router: create_router(state.clone()),
        state,
        _uploads_dir: uploads_dir,
    }
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "relay-test-boundary";

/// Hand-rolled multipart body: optional `message` field, optional `image`
/// file field.
fn multipart_request(
    message: Option<&str>,
    image: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(message) = message {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"message\"\r\n\r\n{message}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, mime, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/chat-image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

// ============================================================================
// /api/chat
// ============================================================================

#[tokio::test]
async fn chat_returns_reply_and_records_history() {
    let provider = StubProvider::replying("Hi there");
    let app = test_app(provider.clone()).await;

    let response = app
        .router
        .oneshot(json_request("/api/chat", json!({ "message": "Hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["reply"], "Hi there");

    let session = app.state.session.lock().await;
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].parts[0].as_text(), Some("Hello"));
    assert_eq!(history[1].role, Role::Model);
    assert_eq!(history[1].parts[0].as_text(), Some("Hi there"));
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let provider = StubProvider::replying("never");
    let app = test_app(provider).await;

    let response = app
        .router
        .oneshot(json_request("/api/chat", json!({ "message": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].is_string());

    let session = app.state.session.lock().await;
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn chat_rejects_missing_message_field() {
    let provider = StubProvider::replying("never");
    let app = test_app(provider).await;

    let response = app
        .router
        .oneshot(json_request("/api/chat", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_maps_provider_failure_to_500() {
    let provider = StubProvider::failing();
    let app = test_app(provider).await;

    let response = app
        .router
        .oneshot(json_request("/api/chat", json!({ "message": "Hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("quota exceeded"));

    // The user turn stays recorded; no model turn is ever appended.
    let session = app.state.session.lock().await;
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
}

#[tokio::test]
async fn repeated_failures_never_append_model_turns() {
    let provider = StubProvider::failing();
    let app = test_app(provider).await;

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(json_request("/api/chat", json!({ "message": "retry" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let session = app.state.session.lock().await;
    assert!(session.history().iter().all(|turn| turn.role == Role::User));
    assert_eq!(session.history().len(), 3);
}

// ============================================================================
// /api/chat-image
// ============================================================================

#[tokio::test]
async fn chat_image_with_text_and_image_orders_text_first() {
    let provider = StubProvider::replying("That's a sunset.");
    let app = test_app(provider.clone()).await;

    let response = app
        .router
        .oneshot(multipart_request(
            Some("what's in this photo?"),
            Some(("photo.jpg", "image/jpeg", JPEG_BYTES)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["reply"], "That's a sunset.");

    let seen = provider.last_seen();
    let user_parts = &seen[0].parts;
    assert_eq!(user_parts[0].as_text(), Some("what's in this photo?"));
    match &user_parts[1] {
        MessagePart::InlineMedia(media) => {
            assert_eq!(media.bytes, JPEG_BYTES);
            assert_eq!(media.mime_type, "image/jpeg");
        }
        other => panic!("expected inline media, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_image_without_text_uses_default_instruction() {
    let provider = StubProvider::replying("A cat.");
    let app = test_app(provider.clone()).await;

    let response = app
        .router
        .oneshot(multipart_request(
            None,
            Some(("cat.jpg", "image/jpeg", JPEG_BYTES)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let seen = provider.last_seen();
    let user_parts = &seen[0].parts;
    assert_eq!(user_parts[0].as_text(), Some(DEFAULT_IMAGE_PROMPT));
    assert!(user_parts[1].is_media());
}

#[tokio::test]
async fn chat_image_message_only_works_without_file() {
    let provider = StubProvider::replying("Just text, got it.");
    let app = test_app(provider).await;

    let response = app
        .router
        .oneshot(multipart_request(Some("no image today"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["reply"], "Just text, got it.");
}

#[tokio::test]
async fn chat_image_blank_reply_degrades_to_fallback() {
    let provider = StubProvider::replying("");
    let app = test_app(provider).await;

    let response = app
        .router
        .oneshot(multipart_request(
            None,
            Some(("blank.jpg", "image/jpeg", JPEG_BYTES)),
        ))
        .await
        .unwrap();

    // Degraded but not an error: 200 with a non-empty user-facing reply.
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(!body["reply"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn chat_image_rejects_empty_form() {
    let provider = StubProvider::replying("never");
    let app = test_app(provider).await;

    let response = app
        .router
        .oneshot(multipart_request(None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].is_string());

    let session = app.state.session.lock().await;
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn conversation_spans_both_endpoints() {
    let provider = StubProvider::replying("noted");
    let app = test_app(provider.clone()).await;

    app.router
        .clone()
        .oneshot(json_request("/api/chat", json!({ "message": "remember this" })))
        .await
        .unwrap();

    app.router
        .clone()
        .oneshot(multipart_request(
            Some("and this picture"),
            Some(("pic.png", "image/png", b"png-bytes")),
        ))
        .await
        .unwrap();

    // The second call sees the full prior conversation plus its own turn.
    let seen = provider.last_seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].parts[0].as_text(), Some("remember this"));
    assert_eq!(seen[1].role, Role::Model);
    assert_eq!(seen[2].parts[0].as_text(), Some("and this picture"));
}
