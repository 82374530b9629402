use chat_pipeline::{ChatMessage, ChatRole};
use serde::Deserialize;

use crate::error_handler::AppError;

/// Request payload for /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Full conversation so far, oldest first. The last entry must be
    /// the user's current question.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Rejects conversations the pipeline cannot answer before any
    /// provider call is made.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.messages.is_empty() {
            return Err(AppError::BadRequest(
                "`messages` must contain at least one message".into(),
            ));
        }
        let last = &self.messages[self.messages.len() - 1];
        if last.role != ChatRole::User {
            return Err(AppError::BadRequest(
                "the last message must have role \"user\"".into(),
            ));
        }
        if last.content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "the last user message must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(json: &str) -> ChatRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_well_formed_conversation() {
        let r = req(r#"{"messages":[{"role":"user","content":"hi"}]}"#);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn rejects_empty_messages() {
        let r = req(r#"{"messages":[]}"#);
        assert!(matches!(r.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn rejects_trailing_assistant_turn() {
        let r = req(
            r#"{"messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]}"#,
        );
        assert!(r.validate().is_err());
    }

    #[test]
    fn rejects_blank_user_content() {
        let r = req(r#"{"messages":[{"role":"user","content":"   "}]}"#);
        assert!(r.validate().is_err());
    }

    #[test]
    fn unknown_role_fails_deserialization() {
        let parsed: Result<ChatRequest, _> =
            serde_json::from_str(r#"{"messages":[{"role":"robot","content":"hi"}]}"#);
        assert!(parsed.is_err());
    }
}
