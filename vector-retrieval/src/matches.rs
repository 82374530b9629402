//! Match types returned by the vector index.
//!
//! A match either carries a similarity score or it does not; the two cases
//! are separate variants so downstream filtering is a pattern match rather
//! than a null check. Matches are immutable once returned.

use serde::{Deserialize, Serialize};

/// Metadata stored alongside each indexed blog excerpt.
///
/// All fields are optional: the index does not enforce their presence,
/// and the formatter supplies defaults where they matter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Post title.
    pub title: Option<String>,
    /// Short excerpt of the post body.
    pub excerpt: Option<String>,
    /// Canonical URL of the post.
    pub link: Option<String>,
}

/// A single nearest-neighbor match, ranked by similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetrievedMatch {
    /// The index attached a similarity score in `[0, 1]`.
    Scored {
        id: String,
        score: f32,
        metadata: MatchMetadata,
    },
    /// No score was attached; treated as irrelevant by the filter.
    Unscored { id: String, metadata: MatchMetadata },
}

impl RetrievedMatch {
    pub fn id(&self) -> &str {
        match self {
            RetrievedMatch::Scored { id, .. } | RetrievedMatch::Unscored { id, .. } => id,
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            RetrievedMatch::Scored { score, .. } => Some(*score),
            RetrievedMatch::Unscored { .. } => None,
        }
    }

    pub fn metadata(&self) -> &MatchMetadata {
        match self {
            RetrievedMatch::Scored { metadata, .. }
            | RetrievedMatch::Unscored { metadata, .. } => metadata,
        }
    }
}
