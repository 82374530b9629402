//! Lightweight Ollama service for streamed chat and embeddings.
//!
//! Thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat`       — chat generation (`stream: true`, NDJSON)
//! - `POST {endpoint}/api/embeddings` — embeddings retrieval
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].
//!
//! The streamed body is newline-delimited JSON: one object per line with
//! `message.content` carrying the delta and `done: true` closing the
//! stream. Lines are reassembled across network chunks before parsing.

use std::time::{Duration, Instant};

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{HttpError, LlmError, ProviderError, ProviderErrorKind, make_snippet},
    message::ChatMessage,
    services::{LineBuffer, STREAM_CHANNEL_CAP},
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a connect deadline. Provides:
/// - [`OllamaService::chat_stream`] — streamed chat generation
/// - [`OllamaService::embeddings`]  — embeddings retrieval
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::InvalidProvider`] if `cfg.provider` is not `Ollama`
    /// - [`ProviderErrorKind::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`LlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(LlmProvider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/api/chat", base);
        let url_embeddings = format!("{}/api/embeddings", base);

        info!(
            target: "llm_service::ollama",
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "OllamaService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embeddings,
        })
    }

    /// Starts a **streaming** chat request via `/api/chat`.
    ///
    /// Mapped options:
    /// - `model`             ← `self.cfg.model`
    /// - `num_predict`       ← `self.cfg.max_tokens`
    /// - `temperature`       ← `self.cfg.temperature`
    /// - `presence_penalty`  ← `self.cfg.presence_penalty`
    /// - `frequency_penalty` ← `self.cfg.frequency_penalty`
    ///
    /// # Errors
    /// - [`ProviderErrorKind::HttpStatus`] for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client errors
    ///
    /// Mid-stream failures are delivered as `Err` items on the channel.
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
    ) -> Result<mpsc::Receiver<Result<String, LlmError>>, LlmError> {
        let started = Instant::now();
        let body = ChatRequest::from_cfg(&self.cfg, messages);

        debug!(
            target: "llm_service::ollama",
            model = %self.cfg.model,
            messages = messages.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                target: "llm_service::ollama",
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "ollama /api/chat returned non-success status"
            );

            return Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAP);
        let mut stream = resp.bytes_stream();

        tokio::spawn(async move {
            let mut lines = LineBuffer::new();

            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        lines.push(&bytes);
                        while let Some(line) = lines.next_line() {
                            match parse_chat_line(&line) {
                                ChatLine::Delta(text) => {
                                    if tx.send(Ok(text)).await.is_err() {
                                        return;
                                    }
                                }
                                ChatLine::Done => return,
                                ChatLine::Skip => {}
                            }
                        }
                    }
                    Err(e) => {
                        let err = ProviderError::new(
                            LlmProvider::Ollama,
                            ProviderErrorKind::Stream(e.to_string()),
                        );
                        let _ = tx.send(Err(err.into())).await;
                        return;
                    }
                }
            }
        });

        info!(
            target: "llm_service::ollama",
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "chat stream opened"
        );

        Ok(rx)
    }

    /// Retrieves embeddings via `/api/embeddings`.
    ///
    /// **Note:** usually a dedicated embedding model is used; configure a
    /// separate [`OllamaService`] with the desired model for that.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::HttpStatus`] for non-2xx responses
    /// - [`LlmError::HttpTransport`] for client errors
    /// - [`ProviderErrorKind::Decode`] if the response cannot be parsed
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        let timeout = self
            .cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!(
            target: "llm_service::ollama",
            model = %self.cfg.model,
            "POST {}", self.url_embeddings
        );

        let resp = self
            .client
            .post(&self.url_embeddings)
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            return Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `embedding: number[]`")),
            )
        })?;

        Ok(out.embedding)
    }
}

/// One parsed line of the NDJSON chat body.
#[derive(Debug, PartialEq)]
enum ChatLine {
    Delta(String),
    Done,
    Skip,
}

/// Parses a single NDJSON line of an Ollama chat stream.
fn parse_chat_line(line: &str) -> ChatLine {
    if line.is_empty() {
        return ChatLine::Skip;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
        return ChatLine::Skip;
    };
    if value["done"].as_bool() == Some(true) {
        return ChatLine::Done;
    }
    match value["message"]["content"].as_str() {
        Some(text) if !text.is_empty() => ChatLine::Delta(text.to_string()),
        _ => ChatLine::Skip,
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

impl<'a> ChatRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, messages: &'a [ChatMessage]) -> Self {
        let options = ChatOptions {
            temperature: cfg.temperature,
            num_predict: cfg.max_tokens,
            presence_penalty: cfg.presence_penalty,
            frequency_penalty: cfg.frequency_penalty,
        };

        Self {
            model: &cfg.model,
            messages,
            stream: true,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options` this service maps from config.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_line_is_extracted() {
        let line = r#"{"message":{"role":"assistant","content":"Hi"},"done":false}"#;
        assert_eq!(parse_chat_line(line), ChatLine::Delta("Hi".into()));
    }

    #[test]
    fn done_flag_terminates() {
        let line = r#"{"message":{"role":"assistant","content":""},"done":true}"#;
        assert_eq!(parse_chat_line(line), ChatLine::Done);
    }

    #[test]
    fn blank_and_malformed_lines_skip() {
        assert_eq!(parse_chat_line(""), ChatLine::Skip);
        assert_eq!(parse_chat_line("{broken"), ChatLine::Skip);
    }
}
