// src/config/mod.rs
// All runtime settings come from the environment; main loads .env (dotenvy)
// before the first CONFIG access, so values are read exactly once per process.

use once_cell::sync::Lazy;
use std::str::FromStr;

/// Persona preamble sent with every provider call. Never appended to history.
const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Lanxi, a friendly, laid-back AI assistant 😄\n\
- Use emoji naturally\n\
- Keep the tone warm, like chatting with a friend\n\
- Never be stiff or formal";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    // ── Server
    pub host: String,
    pub port: u16,

    // ── Gemini
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_timeout_secs: u64,

    // ── Generation defaults
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub system_instruction: String,

    // ── Uploads
    pub uploads_dir: String,
    pub max_upload_bytes: usize,

    // ── Logging
    pub log_level: String,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_var_or("HOST", "127.0.0.1".to_string()),
            port: env_var_or("PORT", 3000),
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gemini_model: env_var_or("GEMINI_MODEL", "gemini-1.5-flash".to_string()),
            gemini_timeout_secs: env_var_or("GEMINI_TIMEOUT_SECS", 60),
            temperature: env_var_or("TEMPERATURE", 0.9),
            top_p: env_var_or("TOP_P", 1.0),
            top_k: env_var_or("TOP_K", 1),
            system_instruction: env_var_or(
                "SYSTEM_INSTRUCTION",
                DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            ),
            uploads_dir: env_var_or("UPLOADS_DIR", "uploads".to_string()),
            max_upload_bytes: env_var_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            log_level: env_var_or("LOG_LEVEL", "info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<RelayConfig> = Lazy::new(RelayConfig::from_env);

/// Read an env var, trimming whitespace and stripping inline `#` comments
/// before parsing. Unset or unparseable values fall back to the default.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            clean.parse::<T>().unwrap_or(default)
        }
        Err(_) => default,
    }
}
