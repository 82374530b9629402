//! Health probes for the configured LLM backends.
//!
//! - Ollama: `GET {endpoint}/api/tags`, then checks the model is pulled
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth
//!
//! [`HealthService::check`] never fails: probe errors become
//! `ok = false` snapshots, so a `/health` endpoint can always answer.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{HttpError, LlmError, ProviderError, ProviderErrorKind, make_snippet};

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Ollama", "OpenAI").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn snapshot(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker reusing a single HTTP client across probes.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`LlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Probes one config, routing by provider. Resilient: any failure is
    /// folded into the returned snapshot instead of an `Err`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return HealthStatus::snapshot(cfg, false, 0, "endpoint is empty or missing http/https");
        }

        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
            LlmProvider::OpenAI => self.try_probe_openai(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    target: "llm_service::health",
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status =
                    HealthStatus::snapshot(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    target: "llm_service::health",
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Probes multiple configs in order.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(target: "llm_service::health", count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn probe_get(
        &self,
        cfg: &LlmModelConfig,
        url: &str,
        bearer: Option<&str>,
    ) -> Result<(reqwest::Response, u128), LlmError> {
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let mut req = self.client.get(url).timeout(timeout);
        if let Some(key) = bearer {
            req = req.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let start = Instant::now();
        let resp = req.send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                cfg.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: url.to_string(),
                    snippet: make_snippet(&text),
                }),
            )
            .into());
        }
        Ok((resp, latency))
    }

    /// Strict Ollama probe. A reachable daemon without the configured
    /// model counts as unhealthy: the first chat request would fail.
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, LlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));
        let (resp, latency) = self.probe_get(cfg, &url, None).await?;

        // Expected minimal JSON: { "models": [ { "name": "<model>" }, ... ] }
        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        let tags: Tags = resp.json().await.map_err(|e| {
            ProviderError::new(cfg.provider, ProviderErrorKind::Decode(format!("tags decode: {e}")))
        })?;

        let pulled = tags
            .models
            .map(|models| models.iter().any(|m| m.name == cfg.model))
            .unwrap_or(false);

        Ok(if pulled {
            HealthStatus::snapshot(cfg, true, latency, "Ollama is healthy; model is available")
        } else {
            HealthStatus::snapshot(cfg, false, latency, "Ollama is reachable but the model is not pulled")
        })
    }

    /// Strict OpenAI probe. Absence from the model listing is not fatal:
    /// aliased model ids are routinely missing from `/v1/models`.
    async fn try_probe_openai(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, LlmError> {
        let api_key = cfg.api_key.as_deref().ok_or_else(|| {
            ProviderError::new(LlmProvider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;
        let url = format!("{}/v1/models", cfg.endpoint.trim_end_matches('/'));
        let (resp, latency) = self.probe_get(cfg, &url, Some(api_key)).await?;

        // Expected minimal JSON: { "data": [ { "id": "<model>" }, ... ] }
        #[derive(serde::Deserialize)]
        struct Model {
            id: String,
        }
        #[derive(serde::Deserialize)]
        struct Models {
            data: Option<Vec<Model>>,
        }

        let models: Models = resp.json().await.map_err(|e| {
            ProviderError::new(
                cfg.provider,
                ProviderErrorKind::Decode(format!("models decode: {e}")),
            )
        })?;

        let listed = models
            .data
            .map(|data| data.iter().any(|m| m.id == cfg.model))
            .unwrap_or(false);
        let message = if listed {
            "OpenAI is healthy; model is listed"
        } else {
            "OpenAI is reachable; model not present in listing"
        };
        Ok(HealthStatus::snapshot(cfg, true, latency, message))
    }
}
