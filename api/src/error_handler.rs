use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chat_pipeline::PipelineError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only
            AppError::MissingEnv(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,

            // custom mapped
            AppError::Http { status, .. } => *status,

            // 5xx
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

/// Every error leaves the API in the same envelope shape, streaming
/// endpoint included (its pre-stream failures land here).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::<()>::error(self.error_code(), self.to_string())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Map pipeline failures onto HTTP statuses. Malformed conversations
/// are the caller's fault; everything else is a downstream failure and
/// stays opaque to the client.
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        if err.is_client_fault() {
            return AppError::BadRequest(err.to_string());
        }
        tracing::error!(target: "api", error = %err, "chat pipeline failed");
        AppError::Http {
            status: StatusCode::BAD_GATEWAY,
            code: "CHAT_FAILED",
            message: "Failed to produce a chat response.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upstream_failures_render_the_envelope() {
        let res = AppError::Http {
            status: StatusCode::BAD_GATEWAY,
            code: "CHAT_FAILED",
            message: "Failed to produce a chat response.".into(),
        }
        .into_response();

        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let v = body_json(res).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "CHAT_FAILED");
        assert_eq!(v["error"]["message"], "Failed to produce a chat response.");
    }

    #[tokio::test]
    async fn bad_request_renders_the_envelope() {
        let res = AppError::BadRequest("`messages` must contain at least one message".into())
            .into_response();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let v = body_json(res).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "BAD_REQUEST");
    }
}
