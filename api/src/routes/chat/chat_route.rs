//! POST /api/chat — answers a question with blog context, streaming.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::Response,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::chat::chat_request::ChatRequest,
};

/// Handler: POST /api/chat
///
/// Streams the model's answer as `text/plain` chunks. If the client
/// disconnects mid-answer the upstream request is cancelled with it.
///
/// # Example
/// ```bash
/// curl -N -X POST http://127.0.0.1:3000/api/chat \
///   -H 'content-type: application/json' \
///   -d '{"messages":[{"role":"user","content":"What does the blog say about async Rust?"}]}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Response> {
    body.validate()?;
    info!(target: "api", turns = body.messages.len(), "chat request accepted");

    let rx = state.pipeline.respond(&body.messages).await?;

    // Bounded channel end to end: the HTTP body pulls from the
    // receiver, the receiver pulls from the provider stream.
    let stream = ReceiverStream::new(rx);
    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Http {
            status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            code: "RESPONSE_BUILD",
            message: e.to_string(),
        })
}
