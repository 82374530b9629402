/// Represents the provider (backend) used for model inference.
///
/// Adding more providers in the future (e.g., Anthropic, Mistral API)
/// can be done by extending this enum; each variant has a thin client
/// under `services/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI REST API.
    OpenAI,
}
