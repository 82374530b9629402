//! Retrieval-augmented chat pipeline.
//!
//! One [`ChatPipeline::respond`] call runs the full turn: embed the
//! user's question, query the vector store, gate matches by relevance,
//! format the survivors into reference blocks, assemble the prompt and
//! open a token stream from the chat model.

pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod prompt;

use std::sync::Arc;

use llm_service::{LlmError, LlmServiceProfiles};
use tokio::sync::mpsc;
use tracing::{debug, info};
use vector_retrieval::Retriever;

pub use config::PipelineConfig;
pub use context::{FilteredContext, MAX_REFERENCE_URLS};
pub use error::PipelineError;
pub use llm_service::{ChatMessage, ChatRole};
pub use prompt::PromptBundle;

pub struct ChatPipeline {
    svc: Arc<LlmServiceProfiles>,
    retriever: Arc<Retriever>,
    cfg: PipelineConfig,
}

impl ChatPipeline {
    pub fn new(svc: Arc<LlmServiceProfiles>, retriever: Arc<Retriever>, cfg: PipelineConfig) -> Self {
        Self { svc, retriever, cfg }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Runs one chat turn and returns the model's token stream.
    ///
    /// The receiver yields answer fragments as the model produces
    /// them; dropping it cancels the upstream request. Errors before
    /// the stream opens surface here, errors mid-stream arrive as an
    /// `Err` item on the channel.
    pub async fn respond(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<mpsc::Receiver<Result<String, LlmError>>, PipelineError> {
        if conversation.is_empty() {
            return Err(PipelineError::EmptyConversation);
        }
        let query =
            prompt::last_user_query(conversation).ok_or(PipelineError::NoUserQuery)?;

        debug!(target: "chat_pipeline", query_chars = query.len(), "embedding user query");
        let vector = self.svc.embed(query).await?;

        let matches = self.retriever.nearest(vector, self.cfg.top_k).await?;
        let retrieved = matches.len();

        let kept = filter::relevant(matches, self.cfg.score_threshold, self.cfg.context_limit);
        let context = context::format_context(&kept);
        info!(
            target: "chat_pipeline",
            retrieved,
            kept = kept.len(),
            has_context = context.is_some(),
            "retrieval stage finished"
        );

        let bundle = prompt::assemble(
            conversation,
            query,
            context.as_ref(),
            &self.cfg.system_template,
            self.cfg.history_window,
        );
        debug!(
            target: "chat_pipeline",
            prompt_messages = bundle.messages().len(),
            "opening chat stream"
        );

        let rx = self.svc.chat_stream(bundle.messages()).await?;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_retrieval::{MatchMetadata, RetrievedMatch};

    #[test]
    fn empty_conversation_is_client_fault() {
        assert!(PipelineError::EmptyConversation.is_client_fault());
        assert!(PipelineError::NoUserQuery.is_client_fault());
        assert!(!PipelineError::InvalidConfig("x".into()).is_client_fault());
    }

    #[test]
    fn filter_and_format_stages_compose() {
        let matches = vec![
            RetrievedMatch::Scored {
                id: "a".into(),
                score: 0.9,
                metadata: MatchMetadata {
                    title: Some("A".into()),
                    excerpt: Some("e1".into()),
                    link: Some("u1".into()),
                },
            },
            RetrievedMatch::Scored {
                id: "b".into(),
                score: 0.5,
                metadata: MatchMetadata {
                    title: Some("B".into()),
                    excerpt: None,
                    link: Some("u2".into()),
                },
            },
        ];

        let kept = filter::relevant(matches, 0.7, 5);
        let ctx = context::format_context(&kept).unwrap();

        assert_eq!(ctx.reference_urls, vec!["u1"]);
        assert!(ctx.formatted_text.contains("Title: A"));
        assert!(!ctx.formatted_text.contains("Title: B"));
    }
}
