// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use chatrelay::chat::session::{ChatSession, GenerationConfig};
use chatrelay::config::CONFIG;
use chatrelay::provider::GeminiProvider;
use chatrelay::server::{create_router, upload::UploadStore, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(CONFIG.log_level.parse().unwrap_or(Level::INFO))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting chat relay");
    info!("Model: {}", CONFIG.gemini_model);

    let api_key = CONFIG
        .gemini_api_key
        .clone()
        .context("GEMINI_API_KEY not set")?;

    let provider = GeminiProvider::with_model(api_key, CONFIG.gemini_model.clone())
        .with_timeout(Duration::from_secs(CONFIG.gemini_timeout_secs));

    // One session for the whole process: created here, mutated by every send,
    // torn down at process exit.
    let session = ChatSession::new(
        Arc::new(provider),
        CONFIG.system_instruction.clone(),
        GenerationConfig {
            temperature: CONFIG.temperature,
            top_p: CONFIG.top_p,
            top_k: CONFIG.top_k,
        },
    );

    let uploads = UploadStore::new(&CONFIG.uploads_dir, CONFIG.max_upload_bytes).await?;
    info!("Uploads dir: {}", CONFIG.uploads_dir);

    let app = create_router(AppState::new(session, uploads));

    let bind_address = format!("{}:{}", CONFIG.host, CONFIG.port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server running at http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
