//! Turns filtered matches into the reference block injected into the
//! prompt.

use std::collections::HashSet;

use vector_retrieval::RetrievedMatch;

/// Upper bound on URLs surfaced to the model in the system prompt.
pub const MAX_REFERENCE_URLS: usize = 5;

const UNKNOWN_TITLE: &str = "Unknown";
const NO_EXCERPT: &str = "No excerpt available";

/// Prompt-ready context assembled from the retrieved posts.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredContext {
    /// Human-readable blocks, one per post, separated by blank lines.
    pub formatted_text: String,
    /// Deduplicated post URLs, capped at [`MAX_REFERENCE_URLS`].
    pub reference_urls: Vec<String>,
}

/// Formats matches into [`FilteredContext`].
///
/// A match without a link cannot be cited, so it contributes nothing.
/// Duplicate links collapse into a single block. Returns `None` when
/// no citable match remains, which routes the request down the
/// no-context fallback path.
pub fn format_context(matches: &[RetrievedMatch]) -> Option<FilteredContext> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut blocks: Vec<String> = Vec::new();
    let mut reference_urls: Vec<String> = Vec::new();

    for m in matches {
        let meta = m.metadata();
        let Some(link) = meta.link.as_deref() else {
            continue;
        };
        if !seen.insert(link) {
            continue;
        }

        let title = meta.title.as_deref().unwrap_or(UNKNOWN_TITLE);
        let excerpt = meta.excerpt.as_deref().unwrap_or(NO_EXCERPT);
        let score = match m.score() {
            Some(s) => format!("{s:.2}"),
            None => "N/A".to_string(),
        };
        blocks.push(format!(
            "Title: {title}\nExcerpt: {excerpt}\nRelevance Score: {score}\nURL: {link}"
        ));
        if reference_urls.len() < MAX_REFERENCE_URLS {
            reference_urls.push(link.to_string());
        }
    }

    if blocks.is_empty() {
        return None;
    }
    Some(FilteredContext {
        formatted_text: blocks.join("\n\n"),
        reference_urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_retrieval::MatchMetadata;

    fn post(score: f32, title: &str, excerpt: &str, link: Option<&str>) -> RetrievedMatch {
        RetrievedMatch::Scored {
            id: title.to_string(),
            score,
            metadata: MatchMetadata {
                title: Some(title.to_string()),
                excerpt: Some(excerpt.to_string()),
                link: link.map(str::to_string),
            },
        }
    }

    #[test]
    fn formats_a_block_per_post() {
        let ctx = format_context(&[
            post(0.91, "Async Rust", "About executors", Some("https://b.io/async")),
            post(0.83, "Borrowck", "About lifetimes", Some("https://b.io/borrow")),
        ])
        .unwrap();

        let expected = "Title: Async Rust\nExcerpt: About executors\nRelevance Score: 0.91\nURL: https://b.io/async\n\nTitle: Borrowck\nExcerpt: About lifetimes\nRelevance Score: 0.83\nURL: https://b.io/borrow";
        assert_eq!(ctx.formatted_text, expected);
        assert_eq!(
            ctx.reference_urls,
            vec!["https://b.io/async", "https://b.io/borrow"]
        );
    }

    #[test]
    fn missing_fields_get_placeholders() {
        let m = RetrievedMatch::Scored {
            id: "1".into(),
            score: 0.8,
            metadata: MatchMetadata {
                title: None,
                excerpt: None,
                link: Some("https://b.io/p".into()),
            },
        };
        let ctx = format_context(&[m]).unwrap();
        assert!(ctx.formatted_text.starts_with("Title: Unknown\n"));
        assert!(ctx.formatted_text.contains("Excerpt: No excerpt available\n"));
    }

    #[test]
    fn unscored_match_renders_na() {
        let m = RetrievedMatch::Unscored {
            id: "1".into(),
            metadata: MatchMetadata {
                title: Some("T".into()),
                excerpt: Some("E".into()),
                link: Some("https://b.io/p".into()),
            },
        };
        let ctx = format_context(&[m]).unwrap();
        assert!(ctx.formatted_text.contains("Relevance Score: N/A\n"));
    }

    #[test]
    fn linkless_matches_are_skipped() {
        assert!(format_context(&[post(0.9, "No link", "…", None)]).is_none());
    }

    #[test]
    fn duplicate_links_collapse() {
        let ctx = format_context(&[
            post(0.9, "A", "a", Some("https://b.io/same")),
            post(0.8, "B", "b", Some("https://b.io/same")),
        ])
        .unwrap();
        assert_eq!(ctx.reference_urls.len(), 1);
        assert_eq!(ctx.formatted_text.matches("Title: ").count(), 1);
    }

    #[test]
    fn reference_urls_capped_at_five() {
        let matches: Vec<RetrievedMatch> = (0..7)
            .map(|i| {
                post(
                    0.9,
                    &format!("T{i}"),
                    "e",
                    Some(&format!("https://b.io/{i}")),
                )
            })
            .collect();
        let ctx = format_context(&matches).unwrap();
        assert_eq!(ctx.reference_urls.len(), MAX_REFERENCE_URLS);
        // All seven posts still appear as blocks.
        assert_eq!(ctx.formatted_text.matches("URL: ").count(), 7);
    }

    #[test]
    fn empty_input_is_none() {
        assert!(format_context(&[]).is_none());
    }

    #[test]
    fn titles_and_urls_reparse_from_formatted_blocks() {
        let ctx = format_context(&[
            post(0.91, "Async Rust", "About executors", Some("https://b.io/async")),
            post(0.83, "Borrowck", "About lifetimes", Some("https://b.io/borrow")),
        ])
        .unwrap();

        let titles: Vec<&str> = ctx
            .formatted_text
            .lines()
            .filter_map(|l| l.strip_prefix("Title: "))
            .collect();
        let urls: Vec<&str> = ctx
            .formatted_text
            .lines()
            .filter_map(|l| l.strip_prefix("URL: "))
            .collect();

        assert_eq!(titles, vec!["Async Rust", "Borrowck"]);
        assert_eq!(urls, vec!["https://b.io/async", "https://b.io/borrow"]);
    }
}
