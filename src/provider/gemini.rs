//! Google Gemini provider (generateContent, non-streaming).
//!
//! Translates the session's turn/part model into Gemini's wire format:
//! text parts stay text, inline media becomes base64 `inlineData`. The API
//! key travels as a query-string parameter, not a Bearer header.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chat::message::{ConversationTurn, MessagePart};
use crate::chat::session::GenerationConfig;
use crate::error::ProviderError;
use crate::provider::Provider;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Google Gemini API client
pub struct GeminiProvider {
    client: HttpClient,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the default model
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    /// Create a new Gemini provider with a custom model
    pub fn with_model(api_key: String, model: String) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            model,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create from the GEMINI_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    /// Convert conversation turns into Gemini contents
    fn build_contents(history: &[ConversationTurn]) -> Vec<GeminiContent> {
        history
            .iter()
            .map(|turn| GeminiContent {
                role: turn.role.as_str().to_string(),
                parts: turn.parts.iter().map(convert_part).collect(),
            })
            .collect()
    }

    fn build_request(
        system: &[MessagePart],
        history: &[ConversationTurn],
        config: &GenerationConfig,
    ) -> GeminiRequest {
        GeminiRequest {
            contents: Self::build_contents(history),
            system_instruction: (!system.is_empty()).then(|| GeminiSystemInstruction {
                parts: system.iter().map(convert_part).collect(),
            }),
            generation_config: Some(GeminiGenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
            }),
        }
    }

    /// Concatenate the text parts of the first candidate. Missing candidates
    /// (e.g. safety-blocked) yield an empty reply, never a failure.
    fn extract_reply(response: GeminiResponse) -> String {
        response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        system: &[MessagePart],
        history: &[ConversationTurn],
        config: &GenerationConfig,
    ) -> Result<String, ProviderError> {
        let request = Self::build_request(system, history, config);
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );

        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e)
                } else {
                    ProviderError::Unavailable(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let data: GeminiResponse = response.json().await.map_err(ProviderError::Unavailable)?;

        if let Some(error) = data.error {
            return Err(ProviderError::Rejected {
                status: error.code,
                message: error.message,
            });
        }

        let reply = Self::extract_reply(data);

        debug!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            reply_chars = reply.len(),
            "gemini reply received"
        );

        Ok(reply)
    }
}

fn convert_part(part: &MessagePart) -> GeminiPart {
    match part {
        MessagePart::Text { content } => GeminiPart::Text {
            text: content.clone(),
        },
        MessagePart::InlineMedia(media) => GeminiPart::InlineData {
            inline_data: GeminiInlineData {
                mime_type: media.mime_type.clone(),
                data: BASE64.encode(&media.bytes),
            },
        },
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Clone)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Clone)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Serialize, Clone)]
struct GeminiInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiApiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiResponseContent,
}

#[derive(Deserialize, Default)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}
