//! Assembles the message bundle handed to the chat model.

use llm_service::{ChatMessage, ChatRole};

use crate::context::FilteredContext;

/// Default persona. `{referenceUrls}` expands to the comma-separated
/// reference list; `{formattedContent}` to the formatted blocks, for
/// operators who prefer a single-message prompt.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are a helpful assistant answering questions about the posts on this blog. \
Ground every answer in the reference content provided and prefer what the posts \
actually say over general knowledge. Always give complete answers without \
truncation. When a post is relevant, cite its URL; suggest up to 5 links, chosen \
only from: {referenceUrls}. If the reference content does not cover the \
question, say so plainly instead of guessing.";

/// Persona used when retrieval produced nothing usable.
const FALLBACK_SYSTEM: &str =
    "You are a helpful assistant answering questions about the posts on this blog.";

/// Canned assistant turn steering the model toward an honest
/// no-context reply.
const FALLBACK_ASSISTANT: &str = "I couldn't find anything in the blog that covers this. \
Could you rephrase the question, or ask about a topic the blog has written about?";

const REFERENCE_HEADER: &str = "Reference Content:\n";

/// Ordered messages ready for the chat model. The system turns always
/// precede the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBundle {
    messages: Vec<ChatMessage>,
}

impl PromptBundle {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

/// Builds the prompt for one chat turn.
///
/// With context, the bundle is the substituted persona, a second
/// system message carrying the reference blocks, then the trailing
/// `history_window` turns of the conversation (all of it when `None`).
/// Without context, the bundle is a bare persona, the user query and a
/// canned assistant turn, so generation still runs and the model
/// answers in its own voice.
pub fn assemble(
    history: &[ChatMessage],
    query: &str,
    context: Option<&FilteredContext>,
    template: &str,
    history_window: Option<usize>,
) -> PromptBundle {
    let messages = match context {
        Some(ctx) => {
            let persona = substitute(template, ctx);
            let mut msgs = Vec::with_capacity(2 + history.len());
            msgs.push(ChatMessage::system(persona));
            msgs.push(ChatMessage::system(format!(
                "{REFERENCE_HEADER}{}",
                ctx.formatted_text
            )));
            msgs.extend(windowed(history, history_window).iter().cloned());
            msgs
        }
        None => vec![
            ChatMessage::system(FALLBACK_SYSTEM),
            ChatMessage::user(query),
            ChatMessage::assistant(FALLBACK_ASSISTANT),
        ],
    };
    PromptBundle { messages }
}

fn substitute(template: &str, ctx: &FilteredContext) -> String {
    template
        .replace("{referenceUrls}", &ctx.reference_urls.join(", "))
        .replace("{formattedContent}", &ctx.formatted_text)
}

fn windowed(history: &[ChatMessage], window: Option<usize>) -> &[ChatMessage] {
    match window {
        Some(n) if n < history.len() => &history[history.len() - n..],
        _ => history,
    }
}

/// Last user message in the conversation, if the conversation ends
/// with one.
pub fn last_user_query(history: &[ChatMessage]) -> Option<&str> {
    history.last().and_then(|m| {
        (m.role == ChatRole::User && !m.content.trim().is_empty()).then_some(m.content.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(urls: &[&str], text: &str) -> FilteredContext {
        FilteredContext {
            formatted_text: text.to_string(),
            reference_urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn context_bundle_layout() {
        let history = vec![
            ChatMessage::user("What is ownership?"),
            ChatMessage::assistant("It is..."),
            ChatMessage::user("And borrowing?"),
        ];
        let c = ctx(&["https://b.io/own"], "Title: Ownership\nURL: https://b.io/own");
        let bundle = assemble(&history, "And borrowing?", Some(&c), DEFAULT_SYSTEM_TEMPLATE, None);

        let msgs = bundle.messages();
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[0].role, ChatRole::System);
        assert!(msgs[0].content.contains("https://b.io/own"));
        assert!(!msgs[0].content.contains("{referenceUrls}"));
        assert_eq!(msgs[1].role, ChatRole::System);
        assert_eq!(
            msgs[1].content,
            "Reference Content:\nTitle: Ownership\nURL: https://b.io/own"
        );
        assert_eq!(msgs[2..], history[..]);
    }

    #[test]
    fn formatted_content_placeholder_is_substituted() {
        let c = ctx(&["u"], "BLOCKS");
        let bundle = assemble(
            &[ChatMessage::user("q")],
            "q",
            Some(&c),
            "Posts:\n{formattedContent}",
            None,
        );
        assert_eq!(bundle.messages()[0].content, "Posts:\nBLOCKS");
    }

    #[test]
    fn history_window_keeps_trailing_turns() {
        let history = vec![
            ChatMessage::user("one"),
            ChatMessage::assistant("two"),
            ChatMessage::user("three"),
        ];
        let c = ctx(&["u"], "t");
        let bundle = assemble(&history, "three", Some(&c), DEFAULT_SYSTEM_TEMPLATE, Some(2));
        let msgs = bundle.messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[2].content, "two");
        assert_eq!(msgs[3].content, "three");
    }

    #[test]
    fn oversized_window_forwards_everything() {
        let history = vec![ChatMessage::user("only")];
        let c = ctx(&["u"], "t");
        let bundle = assemble(&history, "only", Some(&c), DEFAULT_SYSTEM_TEMPLATE, Some(10));
        assert_eq!(bundle.messages().len(), 3);
    }

    #[test]
    fn fallback_bundle_without_context() {
        let history = vec![ChatMessage::user("anything about cooking?")];
        let bundle = assemble(
            &history,
            "anything about cooking?",
            None,
            DEFAULT_SYSTEM_TEMPLATE,
            None,
        );
        let msgs = bundle.messages();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].role, ChatRole::System);
        assert!(!msgs[0].content.contains('{'));
        assert_eq!(msgs[1].role, ChatRole::User);
        assert_eq!(msgs[1].content, "anything about cooking?");
        assert_eq!(msgs[2].role, ChatRole::Assistant);
    }

    #[test]
    fn last_user_query_finds_trailing_user_turn() {
        let history = vec![
            ChatMessage::assistant("hi"),
            ChatMessage::user("  question  "),
        ];
        assert_eq!(last_user_query(&history), Some("  question  "));
    }

    #[test]
    fn last_user_query_rejects_blank_or_non_user() {
        assert_eq!(last_user_query(&[]), None);
        assert_eq!(last_user_query(&[ChatMessage::assistant("a")]), None);
        assert_eq!(last_user_query(&[ChatMessage::user("   ")]), None);
    }
}
