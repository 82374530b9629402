use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// One instance describes one role (chat generation or embedding) against
/// one backend. Sampling knobs that a given provider does not support are
/// simply omitted from the outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend (Ollama, OpenAI).
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gpt-4o-mini"`, `"bge-m3"`).
    pub model: String,

    /// Inference endpoint base URL (local server or remote API).
    pub endpoint: String,

    /// Optional API key for authentication (required for OpenAI).
    pub api_key: Option<String>,

    /// Upper bound on generated length, in tokens.
    pub max_tokens: Option<u32>,

    /// Sampling temperature; lower = more deterministic.
    pub temperature: Option<f32>,

    /// Penalizes tokens already present in the output (topic reuse).
    pub presence_penalty: Option<f32>,

    /// Penalizes tokens proportionally to their frequency so far.
    pub frequency_penalty: Option<f32>,

    /// Optional request timeout (in seconds). Streaming calls use it as a
    /// connect deadline only; the body may outlive it.
    pub timeout_secs: Option<u64>,
}
