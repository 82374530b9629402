//! Default LLM configs loaded strictly from environment variables.
//!
//! Convenience constructors for [`LlmModelConfig`], grouped by role:
//!
//! - **Chat**      → the generation model answering on the chat endpoint
//! - **Embedding** → the model producing query vectors for retrieval
//!
//! The embedding model identifier must match the dimensionality of the
//! vector index it is paired with; both are configured, never hard-coded.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_PROVIDER`          = `openai` (default) | `ollama`
//! - `LLM_MAX_TOKENS`        = optional generation cap (u32)
//! - `LLM_TEMPERATURE`       = optional sampling temperature (default 0.1)
//! - `LLM_PRESENCE_PENALTY`  = optional, `-2.0..=2.0`
//! - `LLM_FREQUENCY_PENALTY` = optional, `-2.0..=2.0`
//! - `CHAT_MODEL`            = generation model id
//! - `EMBEDDING_MODEL`       = embedding model id
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` = API key (mandatory)
//! - `OPENAI_URL`     = base endpoint (default `https://api.openai.com`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        ConfigError, LlmError, env_opt_f32, env_opt_u32, must_env, validate_range_f32,
    },
};

/// Resolves the provider kind from `LLM_PROVIDER` (case-insensitive).
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for anything other than
/// `openai`/`ollama`.
pub fn provider_from_env() -> Result<LlmProvider, LlmError> {
    let raw = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".into());
    match raw.trim().to_lowercase().as_str() {
        "openai" => Ok(LlmProvider::OpenAI),
        "ollama" => Ok(LlmProvider::Ollama),
        other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
    }
}

/// Resolves the Ollama endpoint from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
fn ollama_endpoint() -> Result<String, LlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Ok("http://localhost:11434".into())
}

/// Resolves the OpenAI base endpoint (`OPENAI_URL`, default api.openai.com).
fn openai_endpoint() -> String {
    std::env::var("OPENAI_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "https://api.openai.com".into())
}

/// Sampling knobs shared by both providers, validated.
fn sampling() -> Result<(Option<f32>, Option<f32>, Option<f32>), LlmError> {
    let temperature = env_opt_f32("LLM_TEMPERATURE")?.or(Some(0.1));
    if let Some(t) = temperature {
        validate_range_f32("temperature", t, 0.0, 2.0)?;
    }
    let presence = env_opt_f32("LLM_PRESENCE_PENALTY")?;
    if let Some(p) = presence {
        validate_range_f32("presence_penalty", p, -2.0, 2.0)?;
    }
    let frequency = env_opt_f32("LLM_FREQUENCY_PENALTY")?;
    if let Some(p) = frequency {
        validate_range_f32("frequency_penalty", p, -2.0, 2.0)?;
    }
    Ok((temperature, presence, frequency))
}

/// Constructs the **chat** (generation) config for the configured provider.
///
/// # Defaults
/// - OpenAI model: `gpt-4o-mini`; Ollama model: `qwen3:14b`
/// - `temperature = 0.1` (grounded answers favor determinism)
/// - `timeout_secs = 300` (connect deadline for streaming)
pub fn config_chat() -> Result<LlmModelConfig, LlmError> {
    let provider = provider_from_env()?;
    let (temperature, presence_penalty, frequency_penalty) = sampling()?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;

    let (endpoint, api_key, default_model) = match provider {
        LlmProvider::OpenAI => (openai_endpoint(), Some(must_env("OPENAI_API_KEY")?), "gpt-4o-mini"),
        LlmProvider::Ollama => (ollama_endpoint()?, None, "qwen3:14b"),
    };

    let model = std::env::var("CHAT_MODEL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_model.into());

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature,
        presence_penalty,
        frequency_penalty,
        timeout_secs: Some(300),
    })
}

/// Constructs the **embedding** config for the configured provider.
///
/// # Defaults
/// - OpenAI model: `text-embedding-3-small`; Ollama model: `bge-m3`
/// - `timeout_secs = 30`
pub fn config_embedding() -> Result<LlmModelConfig, LlmError> {
    let provider = provider_from_env()?;

    let (endpoint, api_key, default_model) = match provider {
        LlmProvider::OpenAI => (
            openai_endpoint(),
            Some(must_env("OPENAI_API_KEY")?),
            "text-embedding-3-small",
        ),
        LlmProvider::Ollama => (ollama_endpoint()?, None, "bge-m3"),
    };

    let model = std::env::var("EMBEDDING_MODEL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_model.into());

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: None,
        presence_penalty: None,
        frequency_penalty: None,
        timeout_secs: Some(30),
    })
}
