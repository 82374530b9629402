//! Qdrant vector DB helpers: connection lifecycle and top-K search using
//! the modern `qdrant_client` API.
//!
//! Query-side only: this service never creates, resets, or writes to the
//! collection — the index is built and maintained elsewhere. The module
//! keeps the vector-store concerns isolated and easy to replace:
//! - Connect to Qdrant over gRPC (`qdrant_client::Qdrant`).
//! - Perform k-NN search with payload included.
//! - Map `ScoredPoint` payloads to [`RetrievedMatch`] best-effort.

use std::time::Duration;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::SearchPointsBuilder;

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::matches::{MatchMetadata, RetrievedMatch};

/// Establish a gRPC connection to Qdrant using `cfg.qdrant.url`.
///
/// This call **does not** touch any collections.
///
/// # Errors
/// Returns `RetrievalError::Qdrant` if the client cannot be constructed.
pub fn connect(cfg: &RetrievalConfig) -> Result<Qdrant, RetrievalError> {
    let mut builder = Qdrant::from_url(&cfg.qdrant.url)
        .timeout(Duration::from_secs(cfg.qdrant.timeout_secs));
    if let Some(key) = &cfg.qdrant.api_key {
        builder = builder.api_key(key.clone());
    }
    builder
        .build()
        .map_err(|e| RetrievalError::Qdrant(format!("client build: {e}")))
}

/// Run k-NN search for a **query vector** and return metadata-bearing hits.
///
/// Requests payload back and fills [`MatchMetadata`] from it; missing or
/// mistyped fields degrade to `None` rather than failing the search.
/// No score threshold is applied here — relevance filtering is a
/// downstream concern.
///
/// # Errors
/// - `InvalidConfig` if the query vector length mismatches `EMBEDDING_DIM`.
/// - `Qdrant` on transport/server errors.
pub async fn search_top_k(
    client: &Qdrant,
    cfg: &RetrievalConfig,
    query_vec: Vec<f32>,
    k: usize,
) -> Result<Vec<RetrievedMatch>, RetrievalError> {
    if query_vec.len() != cfg.embedding_dim {
        return Err(RetrievalError::InvalidConfig(format!(
            "query vector length {} != EMBEDDING_DIM {}",
            query_vec.len(),
            cfg.embedding_dim
        )));
    }

    let builder = SearchPointsBuilder::new(&cfg.qdrant.collection, query_vec, k as u64)
        .with_payload(true);

    let resp = client
        .search_points(builder)
        .await
        .map_err(|e| RetrievalError::Qdrant(format!("search_points: {e}")))?;

    let hits = resp
        .result
        .into_iter()
        .map(map_scored_point)
        .collect::<Vec<_>>();

    Ok(hits)
}

/// Helper: map a `ScoredPoint` into our [`RetrievedMatch`], extracting
/// payload best-effort.
fn map_scored_point(sp: qdrant_client::qdrant::ScoredPoint) -> RetrievedMatch {
    // Extract ID in a stable string form.
    let id = if let Some(pid) = sp.id {
        match pid.point_id_options {
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(s)) => s,
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
            None => String::new(),
        }
    } else {
        String::new()
    };

    let mut metadata = MatchMetadata::default();

    if !sp.payload.is_empty() {
        // Values are `qdrant_client::qdrant::Value`; use `into_json()` to read.
        if let Some(v) = sp.payload.get("title") {
            if let Some(s) = v.clone().into_json().as_str() {
                metadata.title = Some(s.to_owned());
            }
        }
        if let Some(v) = sp.payload.get("excerpt") {
            if let Some(s) = v.clone().into_json().as_str() {
                metadata.excerpt = Some(s.to_owned());
            }
        }
        if let Some(v) = sp.payload.get("link") {
            if let Some(s) = v.clone().into_json().as_str() {
                metadata.link = Some(s.to_owned());
            }
        }
    }

    RetrievedMatch::Scored {
        id,
        score: sp.score,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{ScoredPoint, Value, value::Kind};

    fn string_value(s: &str) -> Value {
        Value {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    #[test]
    fn payload_fields_are_mapped() {
        let mut sp = ScoredPoint::default();
        sp.score = 0.83;
        sp.payload.insert("title".into(), string_value("A post"));
        sp.payload
            .insert("link".into(), string_value("https://example.com/a"));

        let hit = map_scored_point(sp);
        assert_eq!(hit.score(), Some(0.83));
        assert_eq!(hit.metadata().title.as_deref(), Some("A post"));
        assert_eq!(hit.metadata().link.as_deref(), Some("https://example.com/a"));
        assert_eq!(hit.metadata().excerpt, None);
    }

    #[test]
    fn missing_payload_degrades_to_defaults() {
        let sp = ScoredPoint::default();
        let hit = map_scored_point(sp);
        assert_eq!(hit.metadata(), &MatchMetadata::default());
        assert_eq!(hit.id(), "");
    }
}
