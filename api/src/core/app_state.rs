use std::sync::Arc;

use chat_pipeline::{ChatPipeline, PipelineConfig};
use llm_service::LlmServiceProfiles;
use vector_retrieval::{RetrievalConfig, Retriever};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The full retrieval-augmented chat pipeline.
    pub pipeline: Arc<ChatPipeline>,
    /// LLM profiles, held separately for the health endpoint.
    pub llm_profiles: Arc<LlmServiceProfiles>,
}

impl AppState {
    /// Load shared state from environment variables. Provider and
    /// vector-store clients are built once here and reused by every
    /// request.
    pub fn from_env() -> Result<Self, AppError> {
        let llm_profiles = Arc::new(
            LlmServiceProfiles::from_env().map_err(|e| AppError::Config(e.to_string()))?,
        );

        let retrieval_cfg =
            RetrievalConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;
        let retriever =
            Arc::new(Retriever::new(retrieval_cfg).map_err(|e| AppError::Config(e.to_string()))?);

        let pipeline_cfg =
            PipelineConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;

        let pipeline = Arc::new(ChatPipeline::new(
            llm_profiles.clone(),
            retriever,
            pipeline_cfg,
        ));

        Ok(Self {
            pipeline,
            llm_profiles,
        })
    }
}
