//! Relevance gate applied to raw vector-store matches.

use vector_retrieval::RetrievedMatch;

/// Keeps matches scoring strictly above `threshold`, preserving the
/// store's ranking order, and truncates the survivors to `limit`.
///
/// Matches without a score never pass: a missing score is treated as
/// irrelevant, not as relevant-by-default.
pub fn relevant(matches: Vec<RetrievedMatch>, threshold: f32, limit: usize) -> Vec<RetrievedMatch> {
    let mut kept: Vec<RetrievedMatch> = matches
        .into_iter()
        .filter(|m| match m {
            RetrievedMatch::Scored { score, .. } => *score > threshold,
            RetrievedMatch::Unscored { .. } => false,
        })
        .collect();
    kept.truncate(limit);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_retrieval::MatchMetadata;

    fn scored(id: &str, score: f32, title: &str, link: Option<&str>) -> RetrievedMatch {
        RetrievedMatch::Scored {
            id: id.to_string(),
            score,
            metadata: MatchMetadata {
                title: Some(title.to_string()),
                excerpt: Some(format!("excerpt for {title}")),
                link: link.map(str::to_string),
            },
        }
    }

    #[test]
    fn keeps_only_matches_above_threshold() {
        let input = vec![
            scored("1", 0.9, "A", Some("u1")),
            scored("2", 0.5, "B", Some("u2")),
        ];
        let kept = relevant(input, 0.7, 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].metadata().title.as_deref(), Some("A"));
    }

    #[test]
    fn threshold_is_strict() {
        let input = vec![scored("1", 0.7, "Edge", None)];
        assert!(relevant(input, 0.7, 5).is_empty());
    }

    #[test]
    fn drops_unscored_matches() {
        let input = vec![
            RetrievedMatch::Unscored {
                id: "1".into(),
                metadata: MatchMetadata::default(),
            },
            scored("2", 0.8, "Kept", None),
        ];
        let kept = relevant(input, 0.7, 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), "2");
    }

    #[test]
    fn preserves_order_and_respects_limit() {
        let input = vec![
            scored("1", 0.95, "First", None),
            scored("2", 0.90, "Second", None),
            scored("3", 0.85, "Third", None),
        ];
        let kept = relevant(input, 0.7, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id(), "1");
        assert_eq!(kept[1].id(), "2");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(relevant(Vec::new(), 0.7, 5).is_empty());
    }
}
