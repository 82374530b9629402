//! Shared LLM service with two active profiles: `chat` and `embedding`.
//!
//! Providers:
//! - OpenAI — `POST /v1/chat/completions` (streaming) and `POST /v1/embeddings`
//! - Ollama — `POST /api/chat` (streaming NDJSON) and `POST /api/embeddings`
//!
//! The crate exposes:
//! - [`config`] — provider enum, model config, env-driven defaults
//! - [`services`] — thin per-provider HTTP clients
//! - [`service_profiles::LlmServiceProfiles`] — the facade dependents hold
//! - [`health_service`] — provider health probes for a `/health` endpoint
//! - [`telemetry`] — a crate-scoped `tracing` fmt layer

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod message;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::LlmError;
pub use health_service::HealthStatus;
pub use message::{ChatMessage, ChatRole};
pub use service_profiles::LlmServiceProfiles;
