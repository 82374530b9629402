//! Public API:
//! - [`Retriever::new`]: build the Qdrant client once from config.
//! - [`Retriever::nearest`]: k-NN search for a query embedding, with
//!   candidate over-fetch for the downstream relevance filter.

pub mod config;
pub mod error;
pub mod matches;
mod vector_db;

pub use config::{QdrantConfig, RetrievalConfig};
pub use error::RetrievalError;
pub use matches::{MatchMetadata, RetrievedMatch};

use qdrant_client::Qdrant;
use tracing::{debug, info};

/// Over-fetch factor: the relevance filter drops sub-threshold candidates,
/// so ask the index for more than the caller ultimately wants.
const OVERFETCH_FACTOR: usize = 2;

/// Long-lived handle over the vector index. Construct once at startup and
/// share by reference; the inner gRPC client is reusable across requests.
pub struct Retriever {
    client: Qdrant,
    cfg: RetrievalConfig,
}

impl Retriever {
    /// Connect to Qdrant using the given config.
    ///
    /// # Errors
    /// Returns [`RetrievalError::Qdrant`] if the client cannot be built.
    pub fn new(cfg: RetrievalConfig) -> Result<Self, RetrievalError> {
        let client = vector_db::connect(&cfg)?;
        info!(
            target: "vector_retrieval",
            url = %cfg.qdrant.url,
            collection = %cfg.qdrant.collection,
            "retriever connected"
        );
        Ok(Self { client, cfg })
    }

    /// Return the nearest neighbors of `query_vec`, ordered by descending
    /// score, with `title`/`excerpt`/`link` payload attached.
    ///
    /// Requests `2 × top_k` candidates; the caller's filter thins the pool
    /// and truncates. An empty result is a valid, non-error outcome.
    ///
    /// # Errors
    /// - [`RetrievalError::InvalidConfig`] on a dimension mismatch.
    /// - [`RetrievalError::Qdrant`] on transport/server errors.
    pub async fn nearest(
        &self,
        query_vec: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<RetrievedMatch>, RetrievalError> {
        if top_k == 0 {
            return Err(RetrievalError::InvalidConfig("top_k must be > 0".into()));
        }

        let want = top_k.saturating_mul(OVERFETCH_FACTOR);
        let hits = vector_db::search_top_k(&self.client, &self.cfg, query_vec, want).await?;

        debug!(
            target: "vector_retrieval::search",
            requested = want,
            hits = hits.len(),
            "nearest: search completed"
        );

        Ok(hits)
    }

    /// The config this retriever was built with.
    pub fn config(&self) -> &RetrievalConfig {
        &self.cfg
    }
}
