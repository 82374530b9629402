//! Env-driven tuning knobs for the retrieval and prompt stages.

use std::env;

use crate::error::PipelineError;
use crate::prompt;

const DEFAULT_SCORE_THRESHOLD: f32 = 0.7;
const DEFAULT_TOP_K: usize = 5;
const DEFAULT_CONTEXT_LIMIT: usize = 5;

/// Runtime configuration for a [`crate::ChatPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Matches must score strictly above this to enter the context.
    pub score_threshold: f32,
    /// How many nearest neighbours to request from the vector store.
    pub top_k: usize,
    /// Cap on the number of matches formatted into the prompt.
    pub context_limit: usize,
    /// How many trailing conversation turns to forward to the model.
    /// `None` forwards the full history.
    pub history_window: Option<usize>,
    /// System prompt template. Supports `{referenceUrls}` and
    /// `{formattedContent}` placeholders.
    pub system_template: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            context_limit: DEFAULT_CONTEXT_LIMIT,
            history_window: None,
            system_template: prompt::DEFAULT_SYSTEM_TEMPLATE.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Reads `SCORE_THRESHOLD`, `RAG_TOP_K`, `CONTEXT_LIMIT`,
    /// `HISTORY_WINDOW` and `SYSTEM_PROMPT`, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self, PipelineError> {
        let cfg = Self {
            score_threshold: read_f32("SCORE_THRESHOLD")?.unwrap_or(DEFAULT_SCORE_THRESHOLD),
            top_k: read_usize("RAG_TOP_K")?.unwrap_or(DEFAULT_TOP_K),
            context_limit: read_usize("CONTEXT_LIMIT")?.unwrap_or(DEFAULT_CONTEXT_LIMIT),
            history_window: read_usize("HISTORY_WINDOW")?,
            system_template: env::var("SYSTEM_PROMPT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| prompt::DEFAULT_SYSTEM_TEMPLATE.to_string()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "SCORE_THRESHOLD must be within [0.0, 1.0], got {}",
                self.score_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(PipelineError::InvalidConfig(
                "RAG_TOP_K must be greater than zero".into(),
            ));
        }
        if self.context_limit == 0 {
            return Err(PipelineError::InvalidConfig(
                "CONTEXT_LIMIT must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn read_f32(key: &'static str) -> Result<Option<f32>, PipelineError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|_| PipelineError::EnvParse { key, value: raw }),
        Err(_) => Ok(None),
    }
}

fn read_usize(key: &'static str) -> Result<Option<usize>, PipelineError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| PipelineError::EnvParse { key, value: raw }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.score_threshold, 0.7);
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.context_limit, 5);
        assert!(cfg.history_window.is_none());
        assert!(cfg.system_template.contains("{referenceUrls}"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg = PipelineConfig {
            score_threshold: 1.5,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_top_k() {
        let cfg = PipelineConfig {
            top_k: 0,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
