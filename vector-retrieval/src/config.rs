//! Configuration layer: reads runtime settings from environment variables
//! and exposes strongly typed configs for the vector index connection.

use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Qdrant connectivity and collection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// gRPC URL for Qdrant (e.g., "http://localhost:6334").
    pub url: String,
    /// Optional API key for managed deployments.
    pub api_key: Option<String>,
    /// Collection holding the indexed blog excerpts.
    pub collection: String,
    /// Per-call deadline in seconds.
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "blog_posts".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Top-level runtime configuration for the retrieval module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Qdrant connectivity & collection settings.
    pub qdrant: QdrantConfig,
    /// Expected query-vector dimensionality. Must match the embedding
    /// model paired with the index, or every search is garbage.
    pub embedding_dim: usize,
}

impl RetrievalConfig {
    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `QDRANT_URL` (default: "http://localhost:6334")
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default: "blog_posts")
    /// - `QDRANT_TIMEOUT_SECS` (default: 15)
    /// - `EMBEDDING_DIM` (default: 1536, text-embedding-3-small)
    pub fn from_env() -> Result<Self, RetrievalError> {
        let qdrant = QdrantConfig {
            url: std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".into()),
            api_key: std::env::var("QDRANT_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            collection: std::env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "blog_posts".into()),
            timeout_secs: read_u64_env("QDRANT_TIMEOUT_SECS")?.unwrap_or(15),
        };

        let embedding_dim = read_u64_env("EMBEDDING_DIM")?.unwrap_or(1536) as usize;

        if embedding_dim == 0 {
            return Err(RetrievalError::InvalidConfig(
                "EMBEDDING_DIM must be > 0".into(),
            ));
        }
        if qdrant.collection.trim().is_empty() {
            return Err(RetrievalError::InvalidConfig(
                "QDRANT_COLLECTION must not be empty".into(),
            ));
        }

        Ok(Self {
            qdrant,
            embedding_dim,
        })
    }
}

/// Read an optional `u64` from env, with error mapped to `RetrievalError`.
fn read_u64_env(key: &str) -> Result<Option<u64>, RetrievalError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<u64>()
                .map(Some)
                .map_err(|_| RetrievalError::EnvParse {
                    key: key.into(),
                    value: v,
                })
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // Serial-safe: only reads variables that tests never set.
        let cfg = RetrievalConfig::from_env().unwrap();
        assert_eq!(cfg.qdrant.collection, "blog_posts");
        assert_eq!(cfg.embedding_dim, 1536);
        assert_eq!(cfg.qdrant.timeout_secs, 15);
    }
}
