//! Errors raised while orchestrating a chat turn.

use llm_service::LlmError;
use thiserror::Error;
use vector_retrieval::RetrievalError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request carried no messages at all.
    #[error("[chat-pipeline] conversation is empty")]
    EmptyConversation,

    /// The last message is not a user turn with non-empty content.
    #[error("[chat-pipeline] last message must be a non-empty user turn")]
    NoUserQuery,

    #[error("[chat-pipeline] env `{key}` has unparsable value `{value}`")]
    EnvParse { key: &'static str, value: String },

    #[error("[chat-pipeline] invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl PipelineError {
    /// True for errors caused by a malformed request rather than a
    /// downstream failure.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::EmptyConversation | Self::NoUserQuery)
    }
}
